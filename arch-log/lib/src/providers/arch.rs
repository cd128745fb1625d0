//! Official Arch Linux repositories.
//!
//! Package identity and repository membership come from the archweb package
//! search; history and PKGBUILDs come from the packaging repositories on the
//! Arch GitLab instance.
//!
//! ## Endpoints
//!
//! - `{archweb}/packages/search/json/?name={pkg}`
//! - `{gitlab}/api/v4/projects/archlinux%2Fpackaging%2Fpackages%2F{base}/repository/commits`
//! - `{gitlab}/api/v4/projects/archlinux%2Fpackaging%2Fpackages%2F{base}/repository/tags`
//! - `{gitlab}/api/v4/projects/archlinux%2Fpackaging%2Fpackages%2F{base}/repository/files/PKGBUILD/raw?ref={ref}`

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use reqwest::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::{BoxFuture, Capabilities, Provider, ProviderKind, report_remap};
use crate::change::{Change, parse_timestamp};
use crate::config::Endpoints;
use crate::error::{FetchError, Lookup, LookupError};
use crate::transport::{Transport, decode_json};

/// GitLab namespace holding one project per base package.
const PACKAGING_NAMESPACE: &str = "archlinux/packaging/packages/";

/// Items requested per GitLab page.
const PAGE_SIZE: u32 = 100;

/// Ref used for the PKGBUILD when no release is pinned.
const DEFAULT_REF: &str = "HEAD";

// ============================================================================
// Package search
// ============================================================================

/// Response of the archweb package search.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<PackageRecord>,
}

/// One package in one repository, as reported by the package search.
#[derive(Debug, Clone, Deserialize)]
struct PackageRecord {
    #[serde(rename = "pkgname")]
    name: String,
    #[serde(rename = "pkgbase")]
    base: String,
    repo: String,
    #[serde(rename = "pkgver")]
    version: String,
    #[serde(rename = "pkgrel")]
    release: String,
    #[serde(default)]
    epoch: u32,
}

impl PackageRecord {
    /// Git tag of the release this record describes.
    ///
    /// The packaging repos tag `epoch:pkgver-pkgrel` as `epoch-pkgver-pkgrel`,
    /// with `~` (not allowed in git refs) replaced by `.`.
    fn tag_name(&self) -> String {
        let full = if self.epoch > 0 {
            format!("{}:{}-{}", self.epoch, self.version, self.release)
        } else {
            format!("{}-{}", self.version, self.release)
        };
        git_ref_name(&full)
    }
}

/// Rewrites a full package version into a valid git ref name.
fn git_ref_name(version: &str) -> String {
    version.replace(':', "-").replace('~', ".")
}

/// Repository constraint derived from the package search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoInfo {
    /// Exactly one repository (and release) is in play.
    ConstrainedTo { repo: String, tag: String },
    /// Several repositories are possible; maps release tag to repository.
    Unconstrained { tags: BTreeMap<String, String> },
}

impl RepoInfo {
    fn from_records<'a>(records: impl IntoIterator<Item = &'a PackageRecord>) -> Self {
        let mut tags = BTreeMap::new();
        for record in records {
            tags.entry(record.tag_name())
                .or_insert_with(|| record.repo.clone());
        }

        if tags.len() == 1
            && let Some((tag, repo)) = tags.pop_first()
        {
            return RepoInfo::ConstrainedTo { repo, tag };
        }

        RepoInfo::Unconstrained { tags }
    }

    /// The repository history is restricted to, if any.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            RepoInfo::ConstrainedTo { repo, .. } => Some(repo),
            RepoInfo::Unconstrained { .. } => None,
        }
    }

    /// Repository a release tag belongs to.
    pub fn repo_for_tag(&self, tag: &str) -> Option<&str> {
        match self {
            RepoInfo::ConstrainedTo { repo, tag: pinned } => {
                (pinned == tag).then_some(repo.as_str())
            }
            RepoInfo::Unconstrained { tags } => tags.get(tag).map(String::as_str),
        }
    }

    /// Git ref to read files at: the pinned release, or the branch head.
    pub fn git_ref(&self) -> &str {
        match self {
            RepoInfo::ConstrainedTo { tag, .. } => tag,
            RepoInfo::Unconstrained { .. } => DEFAULT_REF,
        }
    }
}

/// Picks the base package and repository constraint out of the search results.
fn select_candidates(
    results: Vec<PackageRecord>,
    repo: Option<&str>,
) -> Lookup<(PackageRecord, RepoInfo)> {
    let requested = repo.filter(|r| !r.is_empty());

    match (results.as_slice(), requested) {
        ([], _) => Err(LookupError::NotFound),
        ([only], Some(requested)) if only.repo != requested => Err(FetchError::RepoMismatch {
            package: only.name.clone(),
            found: only.repo.clone(),
            requested: requested.to_string(),
        }
        .into()),
        ([only], _) => Ok((only.clone(), RepoInfo::from_records([only]))),
        ([first, ..], None) => Ok((first.clone(), RepoInfo::from_records(&results))),
        ([first, ..], Some(requested)) => {
            let matching: Vec<&PackageRecord> =
                results.iter().filter(|r| r.repo == requested).collect();

            let Some(chosen) = matching.first() else {
                let mut available: Vec<String> = Vec::new();
                for record in &results {
                    if !available.contains(&record.repo) {
                        available.push(record.repo.clone());
                    }
                }
                return Err(FetchError::RepoUnavailable {
                    package: first.name.clone(),
                    available,
                    requested: requested.to_string(),
                }
                .into());
            };

            Ok(((*chosen).clone(), RepoInfo::from_records(matching.iter().copied())))
        }
    }
}

// ============================================================================
// GitLab history
// ============================================================================

/// Commit as returned by the GitLab commits API.
#[derive(Debug, Deserialize)]
struct Commit {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    message: String,
}

impl Commit {
    /// Message body without the header block.
    ///
    /// A message that only repeats the title is empty. Otherwise everything up
    /// to the first blank line is dropped.
    fn cleaned_message(&self) -> String {
        if self.message.trim_end() == self.title {
            return String::new();
        }

        match self.message.find("\n\n") {
            Some(header_end) => self.message[header_end + 2..].to_string(),
            None => self.message.clone(),
        }
    }
}

/// Tag as returned by the GitLab tags API.
#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    commit: TagCommit,
}

#[derive(Debug, Deserialize)]
struct TagCommit {
    id: String,
}

/// Joins tags onto commits and applies the repository constraint.
///
/// Commits arrive newest first. When constrained, commits newer than the
/// constrained release are skipped; the release commit and everything older
/// is kept. If no commit carries the release tag, the whole history is kept.
/// Provenance is only attached when unconstrained.
fn join_history(commits: Vec<Commit>, tags: &[Tag], repo_info: &RepoInfo) -> Vec<Change> {
    let tag_by_commit: HashMap<&str, &str> = tags
        .iter()
        .map(|t| (t.commit.id.as_str(), t.name.as_str()))
        .collect();
    let tag_of = |commit: &Commit| {
        tag_by_commit
            .get(commit.id.as_str())
            .copied()
            .unwrap_or_default()
    };

    let constraint = repo_info.constraint();
    let start = match constraint {
        Some(repo) => {
            info!("Restricting commits to repo '{}'", repo);
            let release = commits
                .iter()
                .position(|c| repo_info.repo_for_tag(tag_of(c)).is_some());
            release.unwrap_or_else(|| {
                warn!(
                    "Release tag '{}' not found in history, showing all commits",
                    repo_info.git_ref()
                );
                0
            })
        }
        None => 0,
    };

    let mut changes = Vec::with_capacity(commits.len() - start);

    for commit in commits.into_iter().skip(start) {
        debug!("Fetched commit {:?}", commit);

        let tag = tag_of(&commit);
        let repo = repo_info.repo_for_tag(tag);

        let provenance = match constraint {
            Some(_) => String::new(),
            None => repo.unwrap_or_default().to_string(),
        };

        changes.push(Change {
            timestamp: parse_timestamp(&commit.created_at),
            message: commit.cleaned_message(),
            summary: commit.title,
            author: commit.author_name,
            tag: tag.to_string(),
            repo: provenance,
        });
    }

    changes
}

fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get("x-next-page")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

// ============================================================================
// Provider
// ============================================================================

/// Provider for the official repositories.
#[derive(Debug, Clone)]
pub struct ArchProvider {
    transport: Transport,
    archweb: String,
    gitlab: String,
}

impl ArchProvider {
    pub fn new(transport: Transport, endpoints: &Endpoints) -> Self {
        Self {
            transport,
            archweb: endpoints.archweb.clone(),
            gitlab: endpoints.gitlab.clone(),
        }
    }

    /// Resolves a package to its base package and repository constraint.
    ///
    /// ## Errors
    ///
    /// - [`LookupError::NotFound`] if the search returns nothing
    /// - [`FetchError::RepoMismatch`] / [`FetchError::RepoUnavailable`] if the
    ///   requested repository holds no candidate
    pub async fn resolve(&self, package: &str, repo: Option<&str>) -> Lookup<(String, RepoInfo)> {
        let url = format!("{}/packages/search/json/", self.archweb);
        let request = self.transport.get(&url).query(&[("name", package)]);
        let response: SearchResponse = self.transport.get_json(request).await?;

        let (record, repo_info) = select_candidates(response.results, repo)?;
        debug!("Pkg Info from Arch: {:?}, {:?}", record, repo_info);

        Ok((record.base, repo_info))
    }

    fn project_url(&self, base: &str, action: &str) -> String {
        let project: String =
            url::form_urlencoded::byte_serialize(format!("{PACKAGING_NAMESPACE}{base}").as_bytes())
                .collect();
        format!("{}/api/v4/projects/{}/repository/{}", self.gitlab, project, action)
    }

    /// Fetches every page of a GitLab list endpoint.
    async fn fetch_all<T: DeserializeOwned>(&self, url: &str) -> Lookup<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let request = self
                .transport
                .get(url)
                .query(&[("per_page", PAGE_SIZE), ("page", page)]);
            let response = self.transport.execute(request).await?;
            let next = next_page(&response);

            let batch: Vec<T> = decode_json(response).await?;
            items.extend(batch);

            match next {
                Some(next) if next > page => page = next,
                _ => break,
            }
        }

        Ok(items)
    }

    async fn fetch_history(&self, package: &str, repo: Option<&str>) -> Lookup<Vec<Change>> {
        let (base, repo_info) = self.resolve(package, repo).await?;
        report_remap(package, &base);

        let commits: Vec<Commit> = self.fetch_all(&self.project_url(&base, "commits")).await?;
        let tags: Vec<Tag> = self.fetch_all(&self.project_url(&base, "tags")).await?;

        Ok(join_history(commits, &tags, &repo_info))
    }

    async fn fetch_raw_file(&self, package: &str, repo: Option<&str>) -> Lookup<Bytes> {
        let (base, repo_info) = self.resolve(package, repo).await?;
        report_remap(package, &base);

        let url = self.project_url(&base, "files/PKGBUILD/raw");
        let git_ref = repo_info.git_ref();
        let request = self.transport.get(&url).query(&[("ref", git_ref)]);

        match self.transport.get_bytes(request).await {
            Err(LookupError::NotFound) if git_ref != DEFAULT_REF => {
                warn!(
                    "Release tag '{}' not found for '{}', reading PKGBUILD at {}",
                    git_ref, base, DEFAULT_REF
                );
                let request = self.transport.get(&url).query(&[("ref", DEFAULT_REF)]);
                self.transport.get_bytes(request).await
            }
            result => result,
        }
    }
}

impl Provider for ArchProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Arch
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            history: true,
            raw_file: true,
            repo_filter: true,
        }
    }

    fn resolve_base<'a>(&'a self, package: &'a str) -> BoxFuture<'a, Lookup<String>> {
        Box::pin(async move { self.resolve(package, None).await.map(|(base, _)| base) })
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
