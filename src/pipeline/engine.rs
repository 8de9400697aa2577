// src/pipeline/engine.rs

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use futures::FutureExt;
use tracing::{debug, error, info, warn};

use crate::types::human_readable;

use super::context::{GradingConfiguration, GradingContext};
use super::listener::ErrorListener;
use super::step::{FnStep, GradingStep, NamedStep, StepError};

/// An immutable, ordered list of named steps plus error listeners.
///
/// Every `add_*`/`insert_*` method returns a new pipeline and leaves `self`
/// untouched, so one base pipeline can be specialised per subject. Steps
/// are shared between the copies, not duplicated.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<NamedStep>>,
    listeners: Vec<Arc<dyn ErrorListener>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("steps", &self.step_names())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_step(&self, name: impl Into<String>, step: impl GradingStep + 'static) -> Self {
        let mut next = self.clone();
        next.steps.push(Arc::new(NamedStep::new(name, step)));
        next
    }

    pub fn add_fn_step<F>(&self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut GradingContext) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.add_step(name, FnStep::new(action))
    }

    /// Prepend a step.
    pub fn insert_pre_step(&self, name: impl Into<String>, step: impl GradingStep + 'static) -> Self {
        let mut next = self.clone();
        next.steps.insert(0, Arc::new(NamedStep::new(name, step)));
        next
    }

    pub fn insert_pre_fn_step<F>(&self, name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&mut GradingContext) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.insert_pre_step(name, FnStep::new(action))
    }

    pub fn add_error_listener(&self, listener: impl ErrorListener + 'static) -> Self {
        let mut next = self.clone();
        next.listeners.push(Arc::new(listener));
        next
    }

    /// Closure form of [`add_error_listener`](Self::add_error_listener).
    pub fn add_error_fn_listener<F>(&self, listener: F) -> Self
    where
        F: Fn(&StepError, &GradingConfiguration, &GradingContext) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        self.add_error_listener(listener)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Run every step against a context built by `factory`.
    ///
    /// Returns `0` when every step succeeded, `1` otherwise.
    pub async fn run<F>(&self, configuration: &GradingConfiguration, factory: F) -> i32
    where
        F: FnOnce(&GradingConfiguration) -> GradingContext,
    {
        let started = Instant::now();
        let (exit_code, _ctx) = self.execute(configuration, factory).await;
        info!(
            exit_code,
            duration = %human_readable(started.elapsed()),
            "grading finished"
        );
        exit_code
    }

    /// Like [`run`](Self::run) but hands back the context once cleanups
    /// have run.
    pub async fn execute<F>(
        &self,
        configuration: &GradingConfiguration,
        factory: F,
    ) -> (i32, GradingContext)
    where
        F: FnOnce(&GradingConfiguration) -> GradingContext,
    {
        let mut ctx = factory(configuration);
        let mut started_steps: Vec<&NamedStep> = Vec::with_capacity(self.steps.len());
        let mut exit_code = 0;

        for named in &self.steps {
            let step_started = Instant::now();
            debug!(step = %named.name(), "step started");

            let outcome = AssertUnwindSafe(async { named.step().run(&mut ctx).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| {
                    Err(StepError::Unexpected(anyhow!(
                        "step panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });

            match outcome {
                Ok(()) => {
                    debug!(
                        step = %named.name(),
                        elapsed = %human_readable(step_started.elapsed()),
                        "step finished"
                    );
                    started_steps.push(named);
                }
                Err(err) => {
                    self.notify_listeners(&err, configuration, &ctx);
                    log_step_error(named.name(), &err);
                    exit_code = 1;
                    break;
                }
            }
        }

        while let Some(named) = started_steps.pop() {
            debug!(step = %named.name(), "cleaning up");
            if let Err(e) = named.step().close(&mut ctx) {
                warn!(step = %named.name(), error = ?e, "cleanup failed");
            }
        }

        (exit_code, ctx)
    }

    fn notify_listeners(
        &self,
        err: &StepError,
        configuration: &GradingConfiguration,
        ctx: &GradingContext,
    ) {
        for (index, listener) in self.listeners.iter().enumerate() {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_error(err, configuration, ctx)));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(listener = index, error = ?e, "error listener failed"),
                Err(_) => warn!(listener = index, "error listener panicked"),
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn log_step_error(step: &str, err: &StepError) {
    match err {
        StepError::Warning {
            message,
            cause: None,
        } => warn!(step = %step, "{}", message),
        StepError::Warning {
            message,
            cause: Some(cause),
        } => warn!(step = %step, cause = ?cause, "{}", message),
        StepError::Unexpected(cause) => error!(step = %step, error = ?cause, "step failed"),
    }
}
