//! Upstream package metadata providers.
//!
//! Each provider implements [`Provider`] and describes what it can do through
//! [`Capabilities`]. The fallback engine only talks to providers through this
//! trait, so tests can substitute stubs for the network-backed
//! implementations.
//!
//! ## Providers
//!
//! - [`ArchProvider`] - official repositories (package search + GitLab)
//! - [`AurProvider`] - Arch User Repository (RPC + cgit)
//! - [`ArmProvider`] - Arch Linux ARM (package list + GitHub); PKGBUILDs only

mod arch;
mod arm;
mod aur;

pub use arch::{ArchProvider, RepoInfo};
pub use arm::ArmProvider;
pub use aur::AurProvider;

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tracing::info;

use crate::change::Change;
use crate::error::{FetchError, Lookup};
use crate::selection::Operation;

/// Boxed future returned by [`Provider`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identifies one of the known providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Official Arch Linux repositories
    Arch,
    /// Arch User Repository
    Aur,
    /// Arch Linux ARM
    Arm,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProviderKind::Arch => "Arch",
            ProviderKind::Aur => "AUR",
            ProviderKind::Arm => "Arch ARM",
        };
        f.write_str(name)
    }
}

/// What a provider is able to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Serves a change history.
    pub history: bool,
    /// Serves the raw PKGBUILD.
    pub raw_file: bool,
    /// Accepts a repository qualifier.
    pub repo_filter: bool,
}

impl Capabilities {
    /// Returns whether the provider can serve the given operation.
    pub fn supports(&self, operation: Operation) -> bool {
        match operation {
            Operation::History => self.history,
            Operation::RawFile => self.raw_file,
        }
    }
}

/// Interface shared by all providers.
///
/// Every operation reports absence as [`LookupError::NotFound`]
/// (see [`crate::error::LookupError`]); anything else is fatal.
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn capabilities(&self) -> Capabilities;

    /// Resolves a package name to the base package this provider tracks.
    fn resolve_base<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Lookup<String>>;

    /// Fetches the change history of a package.
    fn history<'a>(
        &'a self,
        package: &'a str,
        repo: Option<&'a str>,
    ) -> BoxFuture<'a, Lookup<Vec<Change>>>;

    /// Fetches the raw PKGBUILD of a package.
    fn raw_file<'a>(&'a self, package: &'a str, repo: Option<&'a str>)
    -> BoxFuture<'a, Lookup<Bytes>>;
}

/// Rejects a repository qualifier for providers without repositories.
///
/// Runs before any network access.
pub(crate) fn ensure_repo_supported(
    kind: ProviderKind,
    capabilities: Capabilities,
    repo: Option<&str>,
) -> Result<(), FetchError> {
    match repo {
        Some(repo) if !repo.is_empty() && !capabilities.repo_filter => {
            Err(FetchError::RepoUnsupported { provider: kind })
        }
        _ => Ok(()),
    }
}

/// Logs a remapping from package to base package.
pub(crate) fn report_remap(package: &str, base: &str) {
    if package != base {
        info!("Mapped pkg '{}' to pkgbase '{}'", package, base);
    }
}
