//! arch-log library - change history and PKGBUILDs of Arch Linux packages
//!
//! Resolves a package name (optionally qualified as `repo/pkgname`) against
//! several upstream providers and returns either its change history or its
//! raw PKGBUILD:
//!
//! - **Arch** - official repositories, history from the packaging repos on
//!   gitlab.archlinux.org
//! - **AUR** - Arch User Repository, history from the cgit Atom feed
//! - **Arch ARM** - archlinuxarm.org, PKGBUILDs only
//!
//! Providers are consulted one after the other. A provider that does not know
//! the package hands over to the next one; any other failure stops the
//! lookup.
//!
//! ## Example
//!
//! ```no_run
//! use arch_log_lib::{
//!     Endpoints, FormatOptions, PackageRequest, ProviderFlags, Resolver, Selection, render,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let resolver = Resolver::new(&Endpoints::from_env())?;
//! let request = PackageRequest::parse("extra/vim", None)?;
//! let selection = Selection::new(ProviderFlags::default());
//!
//! let history = resolver.history(&request, &selection).await?;
//! print!("{}", render(history.value, &FormatOptions::default()));
//! # Ok(())
//! # }
//! ```

pub mod change;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod providers;
pub mod request;
pub mod selection;
pub mod transport;

pub use change::Change;
pub use config::Endpoints;
pub use engine::{Resolved, Resolver};
pub use error::{ConfigError, FetchError, Lookup, LookupError, ResolveError};
pub use format::{FormatOptions, prepare, render};
pub use providers::{Capabilities, Provider, ProviderKind};
pub use request::PackageRequest;
pub use selection::{Operation, ProviderFlags, Selection};
