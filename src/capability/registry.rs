// src/capability/registry.rs

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::fs::{FileSystem, RealFileSystem};
use crate::process::ProcessSupervisor;
use crate::subject::Subject;

use super::{BuildToolProvider, CapabilityProvider, GitProvider, HostedRepoProvider};

/// An explicit, ordered list of capability providers.
///
/// Built once by the hosting application; there is no global provider
/// registry.
#[derive(Clone)]
pub struct CapabilityRegistry {
    providers: Vec<Arc<dyn CapabilityProvider>>,
    fs: Arc<dyn FileSystem>,
}

impl CapabilityRegistry {
    pub fn new(providers: Vec<Arc<dyn CapabilityProvider>>, fs: Arc<dyn FileSystem>) -> Self {
        Self { providers, fs }
    }

    /// git, hosted-repo and build-tool providers on the real filesystem.
    pub fn with_default_providers(supervisor: ProcessSupervisor) -> Self {
        Self::new(
            vec![
                Arc::new(GitProvider::new(supervisor)),
                Arc::new(HostedRepoProvider),
                Arc::new(BuildToolProvider::new(supervisor)),
            ],
            Arc::new(RealFileSystem),
        )
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Run every provider against `root` and attach what applies.
    ///
    /// Never fails: a provider error counts as absence. When two providers
    /// resolve the same kind, the first one registered wins.
    pub fn discover(&self, name: &str, root: &Path) -> Subject {
        let mut subject = Subject::new(name, root);

        for provider in &self.providers {
            match provider.detect(root, self.fs.as_ref()) {
                Ok(Some(mut capability)) => {
                    let kind = capability.kind();
                    if subject.has(kind) {
                        debug!(provider = provider.name(), %kind, "capability already resolved; ignoring");
                        if let Err(e) = capability.close() {
                            warn!(provider = provider.name(), error = %e, "closing duplicate capability failed");
                        }
                        continue;
                    }
                    debug!(provider = provider.name(), %kind, subject = name, "capability detected");
                    subject.attach(capability);
                }
                Ok(None) => {
                    debug!(provider = provider.name(), subject = name, "capability not applicable");
                }
                Err(e) => {
                    debug!(
                        provider = provider.name(),
                        subject = name,
                        error = %e,
                        "capability detection failed; treating as absent"
                    );
                }
            }
        }

        info!(
            subject = name,
            capabilities = ?subject.kinds(),
            "subject ready"
        );
        subject
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("providers", &self.provider_names())
            .field("fs", &self.fs)
            .finish()
    }
}
