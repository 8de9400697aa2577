// src/subject.rs

//! The unit being graded and the capabilities it owns.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::capability::{
    BuildProject, Capability, CapabilityError, CapabilityHandle, CapabilityKind, GitRepo,
    HostedRepo,
};

/// One submission under grading: a name, a root directory and at most one
/// capability per kind.
#[derive(Debug)]
pub struct Subject {
    name: String,
    root: PathBuf,
    capabilities: BTreeMap<CapabilityKind, Capability>,
}

impl Subject {
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            root: root.as_ref().to_path_buf(),
            capabilities: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Attach a capability. Returns `false`, leaving the existing one in
    /// place, if the kind is already present.
    pub fn attach(&mut self, capability: Capability) -> bool {
        let kind = capability.kind();
        if self.capabilities.contains_key(&kind) {
            return false;
        }
        self.capabilities.insert(kind, capability);
        true
    }

    pub fn lookup(&self, kind: CapabilityKind) -> Option<&Capability> {
        self.capabilities.get(&kind)
    }

    pub fn has(&self, kind: CapabilityKind) -> bool {
        self.capabilities.contains_key(&kind)
    }

    pub fn kinds(&self) -> Vec<CapabilityKind> {
        self.capabilities.keys().copied().collect()
    }

    pub fn git(&self) -> Option<&CapabilityHandle<GitRepo>> {
        match self.lookup(CapabilityKind::VersionControl) {
            Some(Capability::VersionControl(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn hosted_repo(&self) -> Option<&CapabilityHandle<HostedRepo>> {
        match self.lookup(CapabilityKind::HostedRepo) {
            Some(Capability::HostedRepo(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn build_tool(&self) -> Option<&CapabilityHandle<BuildProject>> {
        match self.lookup(CapabilityKind::BuildTool) {
            Some(Capability::BuildTool(handle)) => Some(handle),
            _ => None,
        }
    }

    /// Close every capability. A failing close does not stop the others;
    /// failures are logged and returned.
    pub fn close(&mut self) -> Vec<CapabilityError> {
        let mut failures = Vec::new();
        for (kind, capability) in self.capabilities.iter_mut() {
            if capability.is_closed() {
                continue;
            }
            match capability.close() {
                Ok(()) => debug!(subject = %self.name, %kind, "capability closed"),
                Err(e) => {
                    warn!(subject = %self.name, %kind, error = %e, "capability close failed");
                    failures.push(e);
                }
            }
        }
        failures
    }
}
