//! Runtime environment sources.
//!
//! An [`EnvSource`] answers "what is the value of this variable?". Empty
//! values count as absent, so `QUEUE_PORT=` leaves the default port untouched.

use std::collections::HashMap;

/// Names of the environment variables read by jobvisor.
pub mod vars {
    /// Full connection URL; when present the individual values below are ignored.
    pub const URL: &str = "QUEUE_URL";
    pub const HOST: &str = "QUEUE_HOST";
    pub const PORT: &str = "QUEUE_PORT";
    pub const PASSWORD: &str = "QUEUE_PASSWORD";
    pub const USERNAME: &str = "QUEUE_USERNAME";
    /// Database index.
    pub const DB: &str = "QUEUE_DB";
    /// `"true"` enables lazy connect; any other value disables it.
    pub const LAZY_CONNECT: &str = "QUEUE_LAZY_CONNECT";
    /// Connect timeout in milliseconds.
    pub const CONNECT_TIMEOUT: &str = "QUEUE_CONNECT_TIMEOUT";

    /// Comma-separated worker names to include (pass-through to registration).
    pub const WORKERS_INCLUDE: &str = "JOBVISOR_WORKERS_INCLUDE";
    /// Comma-separated worker names to exclude (pass-through to registration).
    pub const WORKERS_EXCLUDE: &str = "JOBVISOR_WORKERS_EXCLUDE";

    /// Log filter directive for [`crate::logging::init`].
    pub const LOG: &str = "JOBVISOR_LOG";
}

/// Source of runtime environment values.
pub trait EnvSource {
    /// Returns the raw value of `key`, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Returns the value of `key` if it is set and non-empty.
    fn present(&self, key: &str) -> Option<String> {
        self.var(key).filter(|v| !v.is_empty())
    }
}

/// Reads from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// In-memory environment, for hosts that assemble values themselves and for tests.
///
/// ```
/// use jobvisor::config::{EnvSource, MapEnv};
///
/// let env = MapEnv::new().with("QUEUE_HOST", "cache").with("QUEUE_PORT", "");
/// assert_eq!(env.present("QUEUE_HOST").as_deref(), Some("cache"));
/// assert_eq!(env.present("QUEUE_PORT"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the environment with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

impl<E: EnvSource + ?Sized> EnvSource for &E {
    fn var(&self, key: &str) -> Option<String> {
        (**self).var(key)
    }
}
