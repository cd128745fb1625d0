//! Error types for package resolution.
//!
//! The hierarchy keeps "absent here" apart from every other failure:
//! - [`LookupError`] - Outcome of a single provider operation (`NotFound` or `Failed`)
//! - [`FetchError`] - Anything that is not a plain absence; always fatal
//! - [`ConfigError`] - Invalid option combinations, detected before any request
//! - [`ResolveError`] - Final outcome of the fallback engine

use reqwest::StatusCode;
use thiserror::Error;

use crate::providers::ProviderKind;
use crate::selection::Operation;

/// Result of a provider operation.
pub type Lookup<T> = std::result::Result<T, LookupError>;

/// Outcome of a provider operation that did not succeed.
///
/// `NotFound` is the only variant that lets the engine move on to the next
/// provider.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The package is not known to this provider.
    #[error("package could not be found remotely")]
    NotFound,

    /// The provider failed for any other reason.
    #[error(transparent)]
    Failed(#[from] FetchError),
}

impl LookupError {
    /// Returns `true` for the distinguished absence signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound)
    }
}

/// Fatal provider failures.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be built.
    #[error("building request: {0}")]
    Request(#[source] reqwest::Error),

    /// Connecting or reading the body failed.
    #[error("fetching {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status other than 404.
    #[error("fetching {url}: server returned status {status}")]
    Status { url: String, status: StatusCode },

    /// The body could not be decoded.
    #[error("decoding response of {url}: {message}")]
    Decode { url: String, message: String },

    /// The only candidate lives in a different repository than requested.
    #[error("package '{package}' only found in repo '{found}', but '{requested}' has been requested")]
    RepoMismatch {
        package: String,
        found: String,
        requested: String,
    },

    /// None of the candidates lives in the requested repository.
    #[error(
        "package '{package}' only found in repos {}, but '{requested}' has been requested",
        quote_list(.available)
    )]
    RepoUnavailable {
        package: String,
        available: Vec<String>,
        requested: String,
    },

    /// More than one info record was returned where exactly one was expected.
    #[error("more than one package info found for '{package}': {}", quote_list(.names))]
    Ambiguous { package: String, names: Vec<String> },

    /// A repository qualifier was given to a provider without repositories.
    #[error("repo is not supported by {provider}")]
    RepoUnsupported { provider: ProviderKind },

    /// The provider has no endpoint for the requested operation.
    #[error("{provider} does not provide {operation}")]
    Unsupported {
        provider: ProviderKind,
        operation: Operation,
    },
}

/// Invalid option combinations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no package specified")]
    NoPackage,

    /// `repo/pkg` prefix and `--repo` disagree.
    #[error("conflicting repositories: '{prefix}' given as prefix, but '{flag}' requested")]
    ConflictingRepo { prefix: String, flag: String },

    /// The selected providers cannot serve the requested operation.
    #[error("none of the selected providers can provide {operation}")]
    NoEligibleProvider { operation: Operation },

    /// The HTTP client could not be constructed.
    #[error("setting up HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Final outcome of a resolution that did not succeed.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every consulted provider reported the package as absent.
    #[error("package '{package}' {}", not_found_phrase(.consulted))]
    NotFound {
        package: String,
        consulted: Vec<ProviderKind>,
    },

    /// A provider failed; no further providers were consulted.
    #[error("error fetching from {provider}: {source}")]
    Provider {
        provider: ProviderKind,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ResolveError {
    /// Returns `true` if no consulted provider knew the package.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

fn quote_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("'{item}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn not_found_phrase(consulted: &[ProviderKind]) -> String {
    match consulted {
        [] => "could not be found".to_string(),
        [only] => format!("could not be found on {only}"),
        [first, second] => format!("could neither be found on {first} nor {second}"),
        [init @ .., last] => {
            let init = init
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("could not be found on {init} or {last}")
        }
    }
}
