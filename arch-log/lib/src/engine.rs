//! The fallback engine.
//!
//! [`Resolver`] walks the provider plan of a [`Selection`] in order. A provider
//! that does not know the package hands over to the next one; the first
//! success ends the walk and any other failure aborts it.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::change::Change;
use crate::config::Endpoints;
use crate::error::{ConfigError, Lookup, LookupError, ResolveError};
use crate::providers::{ArchProvider, ArmProvider, AurProvider, BoxFuture, Provider, ProviderKind};
use crate::request::PackageRequest;
use crate::selection::{Operation, Selection};
use crate::transport::Transport;

/// A successful lookup together with the provider that served it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub provider: ProviderKind,
    pub value: T,
}

/// Owns the providers and runs the fallback loop over them.
pub struct Resolver {
    providers: Vec<Arc<dyn Provider>>,
}

impl Resolver {
    /// Builds the network-backed providers for the given endpoints.
    ///
    /// Arch ARM resolves base packages through Arch and the AUR, so both are
    /// shared with it as delegates.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Client`] if the HTTP client cannot be set up.
    pub fn new(endpoints: &Endpoints) -> Result<Self, ConfigError> {
        let transport = Transport::new()?;

        let arch: Arc<dyn Provider> = Arc::new(ArchProvider::new(transport.clone(), endpoints));
        let aur: Arc<dyn Provider> = Arc::new(AurProvider::new(transport.clone(), endpoints));
        let arm: Arc<dyn Provider> = Arc::new(ArmProvider::new(
            transport,
            endpoints,
            vec![Arc::clone(&arch), Arc::clone(&aur)],
        ));

        Ok(Self::with_providers(vec![arch, aur, arm]))
    }

    /// Uses the given providers. Later entries of the same kind are ignored.
    pub fn with_providers(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self { providers }
    }

    fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Fetches the change history of the requested package.
    pub async fn history(
        &self,
        request: &PackageRequest,
        selection: &Selection,
    ) -> Result<Resolved<Vec<Change>>, ResolveError> {
        self.run(request, selection, Operation::History, |provider, package, repo| {
            provider.history(package, repo)
        })
        .await
    }

    /// Fetches the raw PKGBUILD of the requested package.
    pub async fn raw_file(
        &self,
        request: &PackageRequest,
        selection: &Selection,
    ) -> Result<Resolved<Bytes>, ResolveError> {
        self.run(request, selection, Operation::RawFile, |provider, package, repo| {
            provider.raw_file(package, repo)
        })
        .await
    }

    async fn run<T, F>(
        &self,
        request: &PackageRequest,
        selection: &Selection,
        operation: Operation,
        call: F,
    ) -> Result<Resolved<T>, ResolveError>
    where
        F: for<'a> Fn(&'a dyn Provider, &'a str, Option<&'a str>) -> BoxFuture<'a, Lookup<T>>,
    {
        let plan = selection.plan(operation, |kind| {
            self.provider(kind).map(|p| p.capabilities())
        })?;

        for &kind in &plan {
            let Some(provider) = self.provider(kind) else {
                continue;
            };

            debug!("Checking {}", kind);
            match call(provider.as_ref(), &request.package, request.repo()).await {
                Ok(value) => {
                    return Ok(Resolved {
                        provider: kind,
                        value,
                    });
                }
                Err(LookupError::NotFound) => debug!("Not found on {}", kind),
                Err(LookupError::Failed(source)) => {
                    return Err(ResolveError::Provider {
                        provider: kind,
                        source,
                    });
                }
            }
        }

        Err(ResolveError::NotFound {
            package: request.package.clone(),
            consulted: plan,
        })
    }
}
