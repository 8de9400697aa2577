// src/capability/hosted.rs

//! Hosted-repository capability: recognises repositories whose remote lives
//! on a known forge.

use std::fmt;
use std::path::Path;

use anyhow::Result;
use tracing::trace;

use crate::fs::FileSystem;

use super::{Capability, CapabilityContext, CapabilityHandle, CapabilityKind, CapabilityProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forge {
    GitHub,
    GitLab,
    Bitbucket,
}

impl Forge {
    pub const ALL: [Forge; 3] = [Forge::GitHub, Forge::GitLab, Forge::Bitbucket];

    pub fn host(self) -> &'static str {
        match self {
            Forge::GitHub => "github.com",
            Forge::GitLab => "gitlab.com",
            Forge::Bitbucket => "bitbucket.org",
        }
    }

    pub fn api_base(self) -> &'static str {
        match self {
            Forge::GitHub => "https://api.github.com",
            Forge::GitLab => "https://gitlab.com/api/v4",
            Forge::Bitbucket => "https://api.bitbucket.org/2.0",
        }
    }

    fn from_host(host: &str) -> Option<Self> {
        let host = host.strip_prefix("www.").unwrap_or(host);
        Self::ALL.into_iter().find(|f| f.host().eq_ignore_ascii_case(host))
    }
}

impl fmt::Display for Forge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}

/// A repository on a known forge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepo {
    pub forge: Forge,
    pub owner: String,
    pub name: String,
}

impl CapabilityContext for HostedRepo {
    const KIND: CapabilityKind = CapabilityKind::HostedRepo;
}

impl HostedRepo {
    /// Parse a remote URL (`https://`, `ssh://` or scp-like `git@host:path`).
    /// Returns `None` for hosts that are not known forges.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let url = url.trim();
        let (host, path) = if let Some((_, rest)) = url.split_once("://") {
            let (authority, path) = rest.split_once('/')?;
            let host = authority.rsplit('@').next()?;
            let host = host.split(':').next()?;
            (host, path)
        } else {
            // scp-like syntax: [user@]host:owner/repo
            let (authority, path) = url.split_once(':')?;
            (authority.rsplit('@').next()?, path)
        };

        let forge = Forge::from_host(host)?;
        let mut segments = path.trim_matches('/').split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let name = segments.next()?;
        let name = name.strip_suffix(".git").unwrap_or(name).to_string();
        if name.is_empty() {
            return None;
        }

        Some(Self { forge, owner, name })
    }

    /// `owner/name`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn api_url(&self) -> String {
        match self.forge {
            Forge::GitHub => format!("{}/repos/{}/{}", self.forge.api_base(), self.owner, self.name),
            Forge::GitLab => format!(
                "{}/projects/{}%2F{}",
                self.forge.api_base(),
                self.owner,
                self.name
            ),
            Forge::Bitbucket => format!(
                "{}/repositories/{}/{}",
                self.forge.api_base(),
                self.owner,
                self.name
            ),
        }
    }
}

/// Present when a remote in `.git/config` points at a known forge.
#[derive(Debug, Clone, Default)]
pub struct HostedRepoProvider;

impl CapabilityProvider for HostedRepoProvider {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::HostedRepo
    }

    fn name(&self) -> &str {
        "hosted-repo"
    }

    fn detect(&self, root: &Path, fs: &dyn FileSystem) -> Result<Option<Capability>> {
        let config_path = root.join(".git").join("config");
        if !fs.is_file(&config_path) {
            return Ok(None);
        }
        let config = fs.read_to_string(&config_path)?;

        let hosted = remote_urls(&config).find_map(|url| {
            trace!(url, "checking remote");
            HostedRepo::from_remote_url(url)
        });
        Ok(hosted.map(|repo| CapabilityHandle::new(repo).into()))
    }
}

/// `url = ...` entries of `[remote "..."]` sections, in file order.
fn remote_urls(config: &str) -> impl Iterator<Item = &str> {
    let mut in_remote = false;
    config.lines().filter_map(move |line| {
        let line = line.trim();
        if line.starts_with('[') {
            in_remote = line.starts_with("[remote ");
            return None;
        }
        if !in_remote {
            return None;
        }
        let (key, value) = line.split_once('=')?;
        (key.trim() == "url").then(|| value.trim())
    })
}
