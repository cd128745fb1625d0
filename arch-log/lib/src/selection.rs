//! Provider selection.
//!
//! The user's force flags are normalised once into a [`Selection`], which then
//! produces the ordered provider plan for an operation.

use std::fmt;

use tracing::info;

use crate::error::ConfigError;
use crate::providers::{Capabilities, ProviderKind};

/// What the caller wants to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// The change history of a package.
    History,
    /// The raw PKGBUILD of a package.
    RawFile,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::History => f.write_str("a change history"),
            Operation::RawFile => f.write_str("a PKGBUILD"),
        }
    }
}

/// Provider flags as given on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProviderFlags {
    /// Only consult Arch.
    pub arch: bool,
    /// Only consult the AUR.
    pub aur: bool,
    /// Consult Arch ARM first.
    pub arm: bool,
    /// Only consult Arch ARM.
    pub arm_only: bool,
}

/// Normalised provider selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    arch_only: bool,
    aur_only: bool,
    arm: bool,
    arm_only: bool,
}

impl Selection {
    /// Normalises the flags.
    ///
    /// Forcing both Arch and the AUR cancels out and both are consulted in
    /// the usual order. `arm_only` implies `arm`.
    pub fn new(flags: ProviderFlags) -> Self {
        let (arch_only, aur_only) = if flags.arch && flags.aur {
            info!("Forced both Arch and AUR, checking both.");
            (false, false)
        } else {
            (flags.arch, flags.aur)
        };

        Self {
            arch_only,
            aur_only,
            arm: flags.arm || flags.arm_only,
            arm_only: flags.arm_only,
        }
    }

    /// Every provider this selection consults, in order, regardless of
    /// operation.
    pub fn order(&self) -> Vec<ProviderKind> {
        if self.arm_only {
            return vec![ProviderKind::Arm];
        }

        let mut order = Vec::with_capacity(3);
        if self.arm {
            order.push(ProviderKind::Arm);
        }
        if !self.aur_only {
            order.push(ProviderKind::Arch);
        }
        if !self.arch_only {
            order.push(ProviderKind::Aur);
        }
        order
    }

    /// The ordered providers that can serve `operation`.
    ///
    /// `capabilities` reports what a provider can do; providers it does not
    /// know are skipped.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::NoEligibleProvider`] if the plan would be empty.
    pub fn plan(
        &self,
        operation: Operation,
        capabilities: impl Fn(ProviderKind) -> Option<Capabilities>,
    ) -> Result<Vec<ProviderKind>, ConfigError> {
        let plan: Vec<ProviderKind> = self
            .order()
            .into_iter()
            .filter(|kind| capabilities(*kind).is_some_and(|c| c.supports(operation)))
            .collect();

        if plan.is_empty() {
            return Err(ConfigError::NoEligibleProvider { operation });
        }
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    use ProviderKind::{Arch, Arm, Aur};

    fn builtin(kind: ProviderKind) -> Option<Capabilities> {
        Some(match kind {
            Arch => Capabilities {
                history: true,
                raw_file: true,
                repo_filter: true,
            },
            Aur => Capabilities {
                history: true,
                raw_file: true,
                repo_filter: false,
            },
            Arm => Capabilities {
                history: false,
                raw_file: true,
                repo_filter: false,
            },
        })
    }

    fn plan(flags: ProviderFlags, operation: Operation) -> Vec<ProviderKind> {
        Selection::new(flags).plan(operation, builtin).unwrap()
    }

    #[test]
    fn default_order_is_arch_then_aur() {
        assert_eq!(plan(ProviderFlags::default(), Operation::History), [Arch, Aur]);
        assert_eq!(plan(ProviderFlags::default(), Operation::RawFile), [Arch, Aur]);
    }

    #[test]
    fn forcing_one_provider_drops_the_other() {
        let arch = ProviderFlags {
            arch: true,
            ..Default::default()
        };
        let aur = ProviderFlags {
            aur: true,
            ..Default::default()
        };
        assert_eq!(plan(arch, Operation::History), [Arch]);
        assert_eq!(plan(aur, Operation::History), [Aur]);
    }

    #[traced_test]
    #[test]
    fn forcing_both_restores_default_order() {
        let flags = ProviderFlags {
            arch: true,
            aur: true,
            ..Default::default()
        };
        assert_eq!(plan(flags, Operation::History), [Arch, Aur]);
        assert!(logs_contain("Forced both Arch and AUR, checking both."));
    }

    #[test]
    fn arm_goes_first_for_pkgbuilds() {
        let flags = ProviderFlags {
            arm: true,
            ..Default::default()
        };
        assert_eq!(plan(flags, Operation::RawFile), [Arm, Arch, Aur]);
    }

    #[test]
    fn arm_is_skipped_for_history() {
        let flags = ProviderFlags {
            arm: true,
            ..Default::default()
        };
        assert_eq!(plan(flags, Operation::History), [Arch, Aur]);
    }

    #[test]
    fn arm_only_implies_arm() {
        let flags = ProviderFlags {
            arm_only: true,
            ..Default::default()
        };
        assert_eq!(plan(flags, Operation::RawFile), [Arm]);
    }

    #[test]
    fn arm_only_history_has_no_provider() {
        let flags = ProviderFlags {
            arm_only: true,
            ..Default::default()
        };
        let err = Selection::new(flags)
            .plan(Operation::History, builtin)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "none of the selected providers can provide a change history"
        );
    }

    #[test]
    fn unknown_providers_are_skipped() {
        let only_aur = |kind: ProviderKind| if kind == Aur { builtin(kind) } else { None };
        let plan = Selection::new(ProviderFlags::default())
            .plan(Operation::History, only_aur)
            .unwrap();
        assert_eq!(plan, [Aur]);
    }
}
