//! Arch User Repository.
//!
//! The AUR has no notion of repositories: any repository qualifier is
//! rejected before a request is made.
//!
//! ## Endpoints
//!
//! - `{aur}/rpc/?v=5&type=info&arg[]={pkg}`
//! - `{aur}/cgit/aur.git/atom/?h={base}`
//! - `{aur}/cgit/aur.git/plain/PKGBUILD/?h={base}`

use bytes::Bytes;
use serde::Deserialize;
use tracing::debug;

use super::{BoxFuture, Capabilities, Provider, ProviderKind, ensure_repo_supported, report_remap};
use crate::change::{Change, parse_timestamp};
use crate::config::Endpoints;
use crate::error::{FetchError, Lookup, LookupError};
use crate::transport::Transport;

const CAPABILITIES: Capabilities = Capabilities {
    history: true,
    raw_file: true,
    repo_filter: false,
};

/// Response of the RPC `info` call.
#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    results: Vec<InfoRecord>,
}

#[derive(Debug, Deserialize)]
struct InfoRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "PackageBase")]
    package_base: String,
}

/// Atom feed served by cgit.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
struct FeedEntry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    updated: String,
    #[serde(default)]
    author: Option<FeedAuthor>,
    #[serde(rename = "content", default)]
    contents: Vec<FeedContent>,
}

#[derive(Debug, Deserialize)]
struct FeedAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct FeedContent {
    #[serde(rename = "@type", default)]
    kind: String,
    #[serde(rename = "$text", default)]
    text: String,
}

impl FeedEntry {
    /// The plain-text content block, trimmed.
    fn text_content(&self) -> String {
        self.contents
            .iter()
            .find(|c| c.kind == "text")
            .map(|c| c.text.trim().to_string())
            .unwrap_or_default()
    }
}

impl From<FeedEntry> for Change {
    fn from(entry: FeedEntry) -> Self {
        Change {
            timestamp: parse_timestamp(&entry.updated),
            message: entry.text_content(),
            author: entry.author.map(|a| a.name).unwrap_or_default(),
            summary: entry.title,
            ..Default::default()
        }
    }
}

/// Provider for the Arch User Repository.
#[derive(Debug, Clone)]
pub struct AurProvider {
    transport: Transport,
    base_url: String,
}

impl AurProvider {
    pub fn new(transport: Transport, endpoints: &Endpoints) -> Self {
        Self {
            transport,
            base_url: endpoints.aur.clone(),
        }
    }

    /// Looks up the base package through the RPC interface.
    ///
    /// ## Errors
    ///
    /// - [`LookupError::NotFound`] if the RPC knows no such package
    /// - [`FetchError::Ambiguous`] if it returns more than one record
    pub async fn determine_base(&self, package: &str) -> Lookup<String> {
        let url = format!("{}/rpc/", self.base_url);
        let request = self
            .transport
            .get(&url)
            .query(&[("v", "5"), ("type", "info"), ("arg[]", package)]);
        let response: InfoResponse = self.transport.get_json(request).await?;

        match response.results.as_slice() {
            [] => Err(LookupError::NotFound),
            [record] => {
                debug!("Pkg Info from AUR RPC: {:?}", record);
                Ok(record.package_base.clone())
            }
            records => Err(FetchError::Ambiguous {
                package: package.to_string(),
                names: records.iter().map(|r| r.name.clone()).collect(),
            }
            .into()),
        }
    }

    async fn setup(&self, package: &str, repo: Option<&str>) -> Lookup<String> {
        ensure_repo_supported(ProviderKind::Aur, CAPABILITIES, repo)?;

        let base = self.determine_base(package).await?;
        report_remap(package, &base);
        Ok(base)
    }

    fn cgit_url(&self, verb: &str) -> String {
        format!("{}/cgit/aur.git/{}/", self.base_url, verb)
    }

    async fn fetch_history(&self, package: &str, repo: Option<&str>) -> Lookup<Vec<Change>> {
        let base = self.setup(package, repo).await?;

        let request = self
            .transport
            .get(&self.cgit_url("atom"))
            .query(&[("h", base.as_str())]);
        let feed: Feed = self.transport.get_xml(request).await?;

        Ok(feed
            .entries
            .into_iter()
            .inspect(|entry| debug!("Fetched entry {:?}", entry))
            .map(Change::from)
            .collect())
    }

    async fn fetch_raw_file(&self, package: &str, repo: Option<&str>) -> Lookup<Bytes> {
        let base = self.setup(package, repo).await?;

        let request = self
            .transport
            .get(&self.cgit_url("plain/PKGBUILD"))
            .query(&[("h", base.as_str())]);
        self.transport.get_bytes(request).await
    }
}

impl Provider for AurProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Aur
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }

    fn resolve_base<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Lookup<String>> {
        Box::pin(self.determine_base(package))
    }

    fn history<'a>(
        &'a self,
        package: &'a str,
        repo: Option<&'a str>,
    ) -> BoxFuture<'a, Lookup<Vec<Change>>> {
        Box::pin(self.fetch_history(package, repo))
    }

    fn raw_file<'a>(
        &'a self,
        package: &'a str,
        repo: Option<&'a str>,
    ) -> BoxFuture<'a, Lookup<Bytes>> {
        Box::pin(self.fetch_raw_file(package, repo))
    }
}
