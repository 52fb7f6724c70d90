//! Per-crate debug flags
//!
//! Supports names like `lossprev-pipeline` (or `all`) given on the command line
//! or in the `LOSSPREV_DEBUG` environment variable to enable debug logging per crate.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates with debug logging enabled
///
/// # Example
/// ```rust
/// use lossprev_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_names(["lossprev-pipeline"]);
/// assert!(flags.is_enabled("lossprev-pipeline"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Build flags from crate names. `all` enables every known crate.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = CrateDebugFlags::default();
        for name in names {
            flags.enable(name.as_ref());
        }
        flags
    }

    fn enable(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        if name == "all" {
            for crate_name in KNOWN_CRATES {
                self.enabled_crates.insert(crate_name.to_string());
            }
        } else {
            self.enabled_crates.insert(name.to_string());
        }
    }

    /// Check if debug is enabled for a specific crate
    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    /// Check if debug is enabled for any crate
    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// Create a tracing filter from debug flags
    ///
    /// Returns a filter string that can be used with `EnvFilter`.
    /// Crate names are mapped to their target form (`lossprev-pipeline` -> `lossprev_pipeline`).
    /// Format: "lossprev_pipeline=debug,info", or just the default level if none enabled.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(default_level.to_string());
        filters.join(",")
    }
}

/// Merge command-line debug names with the `LOSSPREV_DEBUG` environment variable
///
/// Environment variable format: comma-separated crate names, e.g., "lossprev-pipeline,lossprev-config",
/// or `all`.
pub fn parse_debug_flags<I, S>(cli_names: I) -> CrateDebugFlags
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut flags = CrateDebugFlags::from_names(cli_names);

    if let Ok(env_var) = env::var("LOSSPREV_DEBUG") {
        for crate_name in env_var.split(',') {
            flags.enable(crate_name);
        }
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_crate_flag() {
        let flags = CrateDebugFlags::from_names(["lossprev-pipeline"]);
        assert!(flags.is_enabled("lossprev-pipeline"));
        assert!(!flags.is_enabled("lossprev-config"));
    }

    #[test]
    fn test_debug_all() {
        let flags = CrateDebugFlags::from_names(["all"]);
        for crate_name in KNOWN_CRATES {
            assert!(flags.is_enabled(crate_name), "{} should be enabled", crate_name);
        }
    }

    #[test]
    fn test_blank_names_ignored() {
        let flags = CrateDebugFlags::from_names(["", "  "]);
        assert!(!flags.any_enabled());
    }

    #[test]
    fn test_filter_string() {
        let flags = CrateDebugFlags::from_names(["lossprev-pipeline"]);
        assert_eq!(flags.to_filter_string("warn"), "lossprev_pipeline=debug,warn");

        let none = CrateDebugFlags::default();
        assert_eq!(none.to_filter_string("info"), "info");
    }
}
