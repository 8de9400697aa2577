// src/capability/handle.rs

use std::fmt;
use std::future::Future;

use super::{CapabilityError, CapabilityKind};

/// Implemented by the context object behind each capability kind.
pub trait CapabilityContext: fmt::Debug + Send + Sync {
    const KIND: CapabilityKind;
}

type CloseHook = Box<dyn FnOnce() -> anyhow::Result<()> + Send + Sync>;

/// Owning, closeable handle around a capability context.
///
/// The context is only reachable through the `with_context*` accessors, which
/// refuse access once the handle has been closed.
pub struct CapabilityHandle<C: CapabilityContext> {
    context: Option<C>,
    on_close: Option<CloseHook>,
}

impl<C: CapabilityContext> CapabilityHandle<C> {
    pub fn new(context: C) -> Self {
        Self {
            context: Some(context),
            on_close: None,
        }
    }

    /// Attach a release action run exactly once when the handle closes.
    pub fn with_close_hook<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_close = Some(Box::new(hook));
        self
    }

    pub fn kind(&self) -> CapabilityKind {
        C::KIND
    }

    pub fn is_closed(&self) -> bool {
        self.context.is_none()
    }

    pub fn with_context<R>(&self, f: impl FnOnce(&C) -> R) -> Result<R, CapabilityError> {
        self.context
            .as_ref()
            .map(f)
            .ok_or(CapabilityError::Closed(C::KIND))
    }

    pub async fn with_context_async<'a, F, Fut, R>(&'a self, f: F) -> Result<R, CapabilityError>
    where
        F: FnOnce(&'a C) -> Fut,
        Fut: Future<Output = R> + 'a,
    {
        match self.context.as_ref() {
            Some(context) => Ok(f(context).await),
            None => Err(CapabilityError::Closed(C::KIND)),
        }
    }

    /// Close the handle. Later calls are no-ops.
    pub fn close(&mut self) -> Result<(), CapabilityError> {
        if self.context.take().is_none() {
            return Ok(());
        }
        match self.on_close.take() {
            Some(hook) => hook().map_err(|source| CapabilityError::CloseFailed {
                kind: C::KIND,
                source,
            }),
            None => Ok(()),
        }
    }
}

impl<C: CapabilityContext> fmt::Debug for CapabilityHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityHandle")
            .field("kind", &C::KIND)
            .field("context", &self.context)
            .finish()
    }
}
