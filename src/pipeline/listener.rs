// src/pipeline/listener.rs

use super::context::{GradingConfiguration, GradingContext};
use super::step::StepError;

/// Observer notified of a step failure before the pipeline unwinds.
///
/// Listeners are best-effort: an `Err` (or a panic) is logged and the
/// remaining listeners still run.
pub trait ErrorListener: Send + Sync {
    fn on_error(
        &self,
        error: &StepError,
        configuration: &GradingConfiguration,
        ctx: &GradingContext,
    ) -> anyhow::Result<()>;
}

impl<F> ErrorListener for F
where
    F: Fn(&StepError, &GradingConfiguration, &GradingContext) -> anyhow::Result<()> + Send + Sync,
{
    fn on_error(
        &self,
        error: &StepError,
        configuration: &GradingConfiguration,
        ctx: &GradingContext,
    ) -> anyhow::Result<()> {
        self(error, configuration, ctx)
    }
}
