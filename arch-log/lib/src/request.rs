//! Parsing of the user-supplied package argument.

use crate::error::ConfigError;

/// A package name together with an optional repository qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageRequest {
    pub package: String,
    pub repo: Option<String>,
}

impl PackageRequest {
    /// Builds a request from the package argument and the `--repo` flag.
    ///
    /// The argument may carry its repository as a `repo/pkgname` prefix. If
    /// both a prefix and a flag are present they must agree.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::NoPackage`] if the package name is empty
    /// - [`ConfigError::ConflictingRepo`] if prefix and flag disagree
    ///
    /// ## Examples
    ///
    /// ```
    /// use arch_log_lib::request::PackageRequest;
    ///
    /// let request = PackageRequest::parse("extra/vim", None).unwrap();
    /// assert_eq!(request.package, "vim");
    /// assert_eq!(request.repo.as_deref(), Some("extra"));
    ///
    /// assert!(PackageRequest::parse("extra/vim", Some("core")).is_err());
    /// ```
    pub fn parse(argument: &str, repo_flag: Option<&str>) -> Result<Self, ConfigError> {
        let argument = argument.trim();
        let flag = repo_flag.map(str::trim).filter(|r| !r.is_empty());

        let (prefix, package) = match argument.split_once('/') {
            Some((prefix, package)) => (Some(prefix.trim()).filter(|p| !p.is_empty()), package),
            None => (None, argument),
        };

        let package = package.trim();
        if package.is_empty() {
            return Err(ConfigError::NoPackage);
        }

        let repo = match (prefix, flag) {
            (Some(prefix), Some(flag)) if prefix != flag => {
                return Err(ConfigError::ConflictingRepo {
                    prefix: prefix.to_string(),
                    flag: flag.to_string(),
                });
            }
            (Some(repo), _) | (None, Some(repo)) => Some(repo.to_string()),
            (None, None) => None,
        };

        Ok(Self {
            package: package.to_string(),
            repo,
        })
    }

    /// Returns the qualifier as a plain string slice, if any.
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref()
    }
}
