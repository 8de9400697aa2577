//! Steps and listeners that record what happened to them.

use std::sync::{Arc, Mutex};

use gradeflow::grade::GradePart;
use gradeflow::pipeline::{
    ErrorListener, FnStep, GradingConfiguration, GradingContext, GradingStep, StepError,
    StepFuture,
};

/// Shared, ordered log of events such as `run:clone` or `close:clone`.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, prefix stripped.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    Warn,
    Fail,
    Panic,
}

/// Step writing `run:<name>` and `close:<name>` to a journal.
#[derive(Debug, Clone)]
pub struct RecordingStep {
    name: String,
    journal: Journal,
    behaviour: Behaviour,
}

impl RecordingStep {
    pub fn new(name: &str, journal: &Journal, behaviour: Behaviour) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            behaviour,
        }
    }

    pub fn ok(name: &str, journal: &Journal) -> Self {
        Self::new(name, journal, Behaviour::Succeed)
    }

    pub fn warning(name: &str, journal: &Journal) -> Self {
        Self::new(name, journal, Behaviour::Warn)
    }

    pub fn failing(name: &str, journal: &Journal) -> Self {
        Self::new(name, journal, Behaviour::Fail)
    }

    pub fn panicking(name: &str, journal: &Journal) -> Self {
        Self::new(name, journal, Behaviour::Panic)
    }
}

impl GradingStep for RecordingStep {
    fn run<'a>(&'a self, _ctx: &'a mut GradingContext) -> StepFuture<'a> {
        self.journal.push(format!("run:{}", self.name));
        let result = match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Warn => Err(StepError::warning(format!("{} warned", self.name))),
            Behaviour::Fail => Err(StepError::Unexpected(anyhow::anyhow!(
                "{} failed",
                self.name
            ))),
            Behaviour::Panic => {
                let name = self.name.clone();
                return Box::pin(async move {
                    blow_up(&name);
                    Ok(())
                });
            }
        };
        Box::pin(std::future::ready(result))
    }

    fn close(&self, _ctx: &mut GradingContext) -> anyhow::Result<()> {
        self.journal.push(format!("close:{}", self.name));
        Ok(())
    }
}

fn blow_up(name: &str) {
    panic!("{name} blew up");
}

/// Step appending a fixed grade part.
pub fn grade_step(id: &str, grade: f64, max_grade: Option<f64>) -> FnStep {
    let id = id.to_string();
    FnStep::new(move |ctx| {
        ctx.add_part(GradePart::new(id.clone(), grade, max_grade, Vec::new()));
        Ok(())
    })
}

/// Listener writing `listener:<label>:<error>` to a journal.
#[derive(Debug, Clone)]
pub struct RecordingListener {
    label: String,
    journal: Journal,
}

impl RecordingListener {
    pub fn new(label: &str, journal: &Journal) -> Self {
        Self {
            label: label.to_string(),
            journal: journal.clone(),
        }
    }
}

impl ErrorListener for RecordingListener {
    fn on_error(
        &self,
        error: &StepError,
        _configuration: &GradingConfiguration,
        _ctx: &GradingContext,
    ) -> anyhow::Result<()> {
        self.journal
            .push(format!("listener:{}:{}", self.label, error));
        Ok(())
    }
}

/// Listener that always fails.
#[derive(Debug, Clone, Default)]
pub struct FailingListener;

impl ErrorListener for FailingListener {
    fn on_error(
        &self,
        _error: &StepError,
        _configuration: &GradingConfiguration,
        _ctx: &GradingContext,
    ) -> anyhow::Result<()> {
        anyhow::bail!("listener broke")
    }
}

/// Listener that panics.
#[derive(Debug, Clone, Default)]
pub struct PanickingListener;

impl ErrorListener for PanickingListener {
    fn on_error(
        &self,
        _error: &StepError,
        _configuration: &GradingConfiguration,
        _ctx: &GradingContext,
    ) -> anyhow::Result<()> {
        panic!("listener panicked")
    }
}
