// src/capability/mod.rs

//! Optional per-subject facilities and their discovery.
//!
//! A [`CapabilityProvider`] looks at a subject root and either produces a
//! [`Capability`] or reports absence. The [`CapabilityRegistry`] runs every
//! provider it was built with and attaches the results to a
//! [`Subject`](crate::subject::Subject).

use std::fmt;
use std::path::Path;

use thiserror::Error;

use crate::fs::FileSystem;

pub mod build_tool;
pub mod git;
pub mod handle;
pub mod hosted;
pub mod registry;

pub use build_tool::{BuildProject, BuildTool, BuildToolProvider};
pub use git::{Commit, GitProvider, GitRepo, MeaninglessCommit};
pub use handle::{CapabilityContext, CapabilityHandle};
pub use hosted::{Forge, HostedRepo, HostedRepoProvider};
pub use registry::CapabilityRegistry;

/// The fixed set of capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CapabilityKind {
    VersionControl,
    HostedRepo,
    BuildTool,
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapabilityKind::VersionControl => "version-control",
            CapabilityKind::HostedRepo => "hosted-repo",
            CapabilityKind::BuildTool => "build-tool",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("{0} capability is closed")]
    Closed(CapabilityKind),

    #[error("failed to close {kind} capability: {source}")]
    CloseFailed {
        kind: CapabilityKind,
        #[source]
        source: anyhow::Error,
    },
}

/// A resolved capability, one variant per kind.
#[derive(Debug)]
pub enum Capability {
    VersionControl(CapabilityHandle<GitRepo>),
    HostedRepo(CapabilityHandle<HostedRepo>),
    BuildTool(CapabilityHandle<BuildProject>),
}

impl Capability {
    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::VersionControl(_) => CapabilityKind::VersionControl,
            Capability::HostedRepo(_) => CapabilityKind::HostedRepo,
            Capability::BuildTool(_) => CapabilityKind::BuildTool,
        }
    }

    pub fn is_closed(&self) -> bool {
        match self {
            Capability::VersionControl(h) => h.is_closed(),
            Capability::HostedRepo(h) => h.is_closed(),
            Capability::BuildTool(h) => h.is_closed(),
        }
    }

    pub fn close(&mut self) -> Result<(), CapabilityError> {
        match self {
            Capability::VersionControl(h) => h.close(),
            Capability::HostedRepo(h) => h.close(),
            Capability::BuildTool(h) => h.close(),
        }
    }
}

impl From<CapabilityHandle<GitRepo>> for Capability {
    fn from(handle: CapabilityHandle<GitRepo>) -> Self {
        Capability::VersionControl(handle)
    }
}

impl From<CapabilityHandle<HostedRepo>> for Capability {
    fn from(handle: CapabilityHandle<HostedRepo>) -> Self {
        Capability::HostedRepo(handle)
    }
}

impl From<CapabilityHandle<BuildProject>> for Capability {
    fn from(handle: CapabilityHandle<BuildProject>) -> Self {
        Capability::BuildTool(handle)
    }
}

/// Decides whether a capability applies to a subject root.
///
/// `Ok(None)` is the normal "not applicable" answer. Errors are treated as
/// absence by the registry and never reach the pipeline.
pub trait CapabilityProvider: Send + Sync {
    fn kind(&self) -> CapabilityKind;

    fn name(&self) -> &str;

    fn detect(&self, root: &Path, fs: &dyn FileSystem) -> anyhow::Result<Option<Capability>>;
}
