//! Upstream endpoint configuration.
//!
//! Every provider addresses its upstream through a base URL taken from
//! [`Endpoints`]. The defaults point at the public services; each one can be
//! overridden through an `ARCH_LOG_*_URL` environment variable, which is also
//! how the test suites point providers at a mock server.

use std::env;

/// Default base URL of the Arch Linux website (package search).
pub const ARCHWEB_BASE_URL: &str = "https://archlinux.org";
/// Default base URL of the Arch Linux GitLab instance (packaging repos).
pub const GITLAB_BASE_URL: &str = "https://gitlab.archlinux.org";
/// Default base URL of the AUR.
pub const AUR_BASE_URL: &str = "https://aur.archlinux.org";
/// Default base URL of the Arch Linux ARM website.
pub const ARM_BASE_URL: &str = "https://archlinuxarm.org";
/// Default base URL of the GitHub REST API.
pub const GITHUB_BASE_URL: &str = "https://api.github.com";

/// Base URLs for all upstream services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub archweb: String,
    pub gitlab: String,
    pub aur: String,
    pub arm: String,
    pub github: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            archweb: ARCHWEB_BASE_URL.to_string(),
            gitlab: GITLAB_BASE_URL.to_string(),
            aur: AUR_BASE_URL.to_string(),
            arm: ARM_BASE_URL.to_string(),
            github: GITHUB_BASE_URL.to_string(),
        }
    }
}

impl Endpoints {
    /// Builds the endpoints from the defaults, overridden by the environment.
    ///
    /// Recognised variables: `ARCH_LOG_ARCHWEB_URL`, `ARCH_LOG_GITLAB_URL`,
    /// `ARCH_LOG_AUR_URL`, `ARCH_LOG_ARM_URL` and `ARCH_LOG_GITHUB_URL`.
    /// Empty values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the endpoints from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, default: String| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or(default)
        };

        let defaults = Self::default();
        Self {
            archweb: pick("ARCH_LOG_ARCHWEB_URL", defaults.archweb),
            gitlab: pick("ARCH_LOG_GITLAB_URL", defaults.gitlab),
            aur: pick("ARCH_LOG_AUR_URL", defaults.aur),
            arm: pick("ARCH_LOG_ARM_URL", defaults.arm),
            github: pick("ARCH_LOG_GITHUB_URL", defaults.github),
        }
        .normalized()
    }

    /// Points every service at the same base URL.
    ///
    /// Handy for tests, where a single mock server stands in for all upstreams.
    #[must_use]
    pub fn all(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            archweb: base_url.clone(),
            gitlab: base_url.clone(),
            aur: base_url.clone(),
            arm: base_url.clone(),
            github: base_url,
        }
        .normalized()
    }

    fn normalized(mut self) -> Self {
        for url in [
            &mut self.archweb,
            &mut self.gitlab,
            &mut self.aur,
            &mut self.arm,
            &mut self.github,
        ] {
            while url.ends_with('/') {
                url.pop();
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_public_services() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.archweb, "https://archlinux.org");
        assert_eq!(endpoints.github, "https://api.github.com");
    }

    #[test]
    fn lookup_overrides_and_trims() {
        let endpoints = Endpoints::from_lookup(|key| match key {
            "ARCH_LOG_AUR_URL" => Some("http://127.0.0.1:8080/".to_string()),
            "ARCH_LOG_ARM_URL" => Some("   ".to_string()),
            _ => None,
        });

        assert_eq!(endpoints.aur, "http://127.0.0.1:8080");
        assert_eq!(endpoints.arm, ARM_BASE_URL);
        assert_eq!(endpoints.gitlab, GITLAB_BASE_URL);
    }

    #[test]
    fn all_shares_one_base() {
        let endpoints = Endpoints::all("http://localhost:1234/");
        assert_eq!(endpoints.archweb, "http://localhost:1234");
        assert_eq!(endpoints.aur, endpoints.github);
    }
}
