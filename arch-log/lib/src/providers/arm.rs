//! Arch Linux ARM.
//!
//! Availability is checked against the package list of archlinuxarm.org.
//! PKGBUILDs come from the `archlinuxarm/PKGBUILDs` repository on GitHub.
//! There is no change history.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{ACCEPT, REFERER};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{BoxFuture, Capabilities, Provider, ProviderKind, ensure_repo_supported, report_remap};
use crate::change::Change;
use crate::config::Endpoints;
use crate::error::{FetchError, Lookup, LookupError};
use crate::selection::Operation;
use crate::transport::Transport;

const CAPABILITIES: Capabilities = Capabilities {
    history: false,
    raw_file: true,
    repo_filter: false,
};

/// Rows requested from the package list.
const PAGE_LENGTH: &str = "10";

const REPO_COLUMN: usize = 1;
const EXACT_MATCH_COLUMN: usize = 5;

#[derive(Debug, Deserialize)]
struct PackageList {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

impl PackageList {
    /// Returns the repository of the first exact match.
    fn exact_match_repo(&self) -> Option<String> {
        self.data
            .iter()
            .find(|row| row.get(EXACT_MATCH_COLUMN).is_some_and(is_exact_flag))
            .and_then(|row| row.get(REPO_COLUMN))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn is_exact_flag(value: &Value) -> bool {
    match value {
        Value::String(s) => s == "1",
        Value::Number(n) => n.as_u64() == Some(1),
        _ => false,
    }
}

/// Provider for Arch Linux ARM.
///
/// Base package resolution is delegated: the delegates are asked in order and
/// the first one that knows the package wins.
pub struct ArmProvider {
    transport: Transport,
    base_url: String,
    github_url: String,
    delegates: Vec<Arc<dyn Provider>>,
}

impl std::fmt::Debug for ArmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArmProvider")
            .field("base_url", &self.base_url)
            .field("github_url", &self.github_url)
            .field(
                "delegates",
                &self.delegates.iter().map(|d| d.kind()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl ArmProvider {
    pub fn new(
        transport: Transport,
        endpoints: &Endpoints,
        delegates: Vec<Arc<dyn Provider>>,
    ) -> Self {
        Self {
            transport,
            base_url: endpoints.arm.clone(),
            github_url: endpoints.github.clone(),
            delegates,
        }
    }

    /// Checks that the package is built for ARM and returns its repository.
    pub async fn check_availability(&self, package: &str) -> Lookup<String> {
        let url = format!("{}/data/packages/list", self.base_url);
        let request = self
            .transport
            .post(&url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(REFERER, format!("{}/packages", self.base_url))
            .form(&[
                ("search[value]", package),
                ("start", "0"),
                ("length", PAGE_LENGTH),
            ]);

        let list: PackageList = self.transport.get_json(request).await?;
        debug!("Received ARM data: {:?}", list);

        list.exact_match_repo().ok_or(LookupError::NotFound)
    }

    /// Asks the delegates for the base package, falling back to the name itself.
    pub async fn determine_base(&self, package: &str) -> Lookup<String> {
        for delegate in &self.delegates {
            match delegate.resolve_base(package).await {
                Ok(base) => return Ok(base),
                Err(LookupError::NotFound) => {
                    debug!("Package '{}' not found on {}", package, delegate.kind());
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "Package '{}' not known to any delegate, assuming base = pkg",
            package
        );
        Ok(package.to_string())
    }

    async fn fetch_raw_file(&self, package: &str, repo: Option<&str>) -> Lookup<Bytes> {
        ensure_repo_supported(ProviderKind::Arm, CAPABILITIES, repo)?;

        let arm_repo = self.check_availability(package).await?;
        let base = self.determine_base(package).await?;
        report_remap(package, &base);

        let url = format!(
            "{}/repos/archlinuxarm/PKGBUILDs/contents/{}/{}/PKGBUILD",
            self.github_url, arm_repo, base
        );
        let request = self
            .transport
            .get(&url)
            .header(ACCEPT, "application/vnd.github.raw");
        self.transport.get_bytes(request).await
    }
}

impl Provider for ArmProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Arm
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn resolve_base<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Lookup<String>> {
        Box::pin(self.determine_base(package))
    }

    fn history<'a>(
        &'a self,
        _package: &'a str,
        repo: Option<&'a str>,
    ) -> BoxFuture<'a, Lookup<Vec<Change>>> {
        Box::pin(async move {
            ensure_repo_supported(ProviderKind::Arm, CAPABILITIES, repo)?;
            Err(FetchError::Unsupported {
                provider: ProviderKind::Arm,
                operation: Operation::History,
            }
            .into())
        })
    }

    fn raw_file<'a>(
        &'a self,
        package: &'a str,
        repo: Option<&'a str>,
    ) -> BoxFuture<'a, Lookup<Bytes>> {
        Box::pin(self.fetch_raw_file(package, repo))
    }
}
