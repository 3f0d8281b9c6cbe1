//! Worker include/exclude selection.
//!
//! Two comma-separated name lists, typically set by a dev-time wrapper, tell
//! worker registration which workers to keep. The raw strings are preserved
//! unmodified for anything downstream that wants to re-export them.

use super::env::{EnvSource, vars};

/// Include/exclude filter applied at worker registration.
///
/// ## Rules
/// - A name in `exclude` is always skipped.
/// - When `include` is present, only names in it are kept.
/// - Without either list, every worker is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerSelection {
    include: Option<Vec<String>>,
    exclude: Vec<String>,
    raw_include: Option<String>,
    raw_exclude: Option<String>,
}

impl WorkerSelection {
    /// Selection that keeps every worker.
    pub fn all() -> Self {
        Self::default()
    }

    /// Reads `JOBVISOR_WORKERS_INCLUDE` / `JOBVISOR_WORKERS_EXCLUDE`.
    pub fn from_env(env: &(impl EnvSource + ?Sized)) -> Self {
        Self::from_raw(env.present(vars::WORKERS_INCLUDE), env.present(vars::WORKERS_EXCLUDE))
    }

    /// Builds a selection from raw comma-separated lists.
    pub fn from_raw(include: Option<String>, exclude: Option<String>) -> Self {
        Self {
            include: include.as_deref().map(split_names),
            exclude: exclude.as_deref().map(split_names).unwrap_or_default(),
            raw_include: include,
            raw_exclude: exclude,
        }
    }

    /// Returns `true` if a worker named `name` should be registered.
    pub fn allows(&self, name: &str) -> bool {
        if self.exclude.iter().any(|n| n == name) {
            return false;
        }
        match &self.include {
            Some(include) => include.iter().any(|n| n == name),
            None => true,
        }
    }

    /// The raw include/exclude values as read, unmodified.
    pub fn raw(&self) -> (Option<&str>, Option<&str>) {
        (self.raw_include.as_deref(), self.raw_exclude.as_deref())
    }
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
