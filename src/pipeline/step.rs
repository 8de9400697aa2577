// src/pipeline/step.rs

use std::fmt;
use std::future::{self, Future};
use std::pin::Pin;
use std::sync::Arc;

use thiserror::Error;

use super::context::GradingContext;

/// Failure of a step, as classified at the pipeline boundary.
#[derive(Debug, Error)]
pub enum StepError {
    /// Expected, recoverable condition (inaccessible repository, missing
    /// manifest, ...). Logged at WARN; the cause chain only when there is one.
    #[error("{message}")]
    Warning {
        message: String,
        cause: Option<anyhow::Error>,
    },

    /// Anything else. Logged at ERROR with its full cause chain.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl StepError {
    pub fn warning(message: impl Into<String>) -> Self {
        StepError::Warning {
            message: message.into(),
            cause: None,
        }
    }

    pub fn warning_with_cause(message: impl Into<String>, cause: impl Into<anyhow::Error>) -> Self {
        StepError::Warning {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, StepError::Warning { .. })
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            StepError::Warning { cause, .. } => cause.as_ref(),
            StepError::Unexpected(err) => Some(err),
        }
    }
}

pub type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<(), StepError>> + Send + 'a>>;

/// One unit of work in a pipeline.
///
/// `run` gets exclusive access to the context for its whole duration.
/// `close` is the matching cleanup, called during unwind only if `run`
/// succeeded; it must cope with a context that later steps left half-filled.
pub trait GradingStep: Send + Sync {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a>;

    fn close(&self, _ctx: &mut GradingContext) -> anyhow::Result<()> {
        Ok(())
    }
}

type Action = Box<dyn Fn(&mut GradingContext) -> Result<(), StepError> + Send + Sync>;
type Cleanup = Box<dyn Fn(&mut GradingContext) -> anyhow::Result<()> + Send + Sync>;

/// A step built from plain closures.
pub struct FnStep {
    action: Action,
    cleanup: Option<Cleanup>,
}

impl FnStep {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut GradingContext) -> Result<(), StepError> + Send + Sync + 'static,
    {
        Self {
            action: Box::new(action),
            cleanup: None,
        }
    }

    pub fn with_cleanup<F>(mut self, cleanup: F) -> Self
    where
        F: Fn(&mut GradingContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.cleanup = Some(Box::new(cleanup));
        self
    }
}

impl GradingStep for FnStep {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a> {
        Box::pin(future::ready((self.action)(ctx)))
    }

    fn close(&self, ctx: &mut GradingContext) -> anyhow::Result<()> {
        match &self.cleanup {
            Some(cleanup) => cleanup(ctx),
            None => Ok(()),
        }
    }
}

/// An immutable (name, step) pair.
#[derive(Clone)]
pub struct NamedStep {
    name: String,
    step: Arc<dyn GradingStep>,
}

impl NamedStep {
    pub fn new(name: impl Into<String>, step: impl GradingStep + 'static) -> Self {
        Self {
            name: name.into(),
            step: Arc::new(step),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn step(&self) -> &dyn GradingStep {
        self.step.as_ref()
    }
}

impl fmt::Debug for NamedStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedStep")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
