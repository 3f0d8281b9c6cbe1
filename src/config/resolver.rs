//! Merges build-time connection defaults with runtime overrides.
//!
//! ## Rules
//! - A present URL wins: the result is the defaults plus `url`, with
//!   `lazy_connect` kept from the defaults or forced to `true` when unset.
//!   Individual host/port/... overrides are ignored entirely.
//! - Without a URL, each present value overrides only its own field.
//! - `port`, `db`, `connect_timeout` parse as integers; malformed input is
//!   kept as [`Numeric::Raw`].
//! - The lazy-connect flag is `true` only for the exact string `"true"`.
//! - Never fails.

use super::connection::{ConnectionConfig, Numeric};
use super::env::{EnvSource, vars};

/// Raw override values read from the environment (non-empty only).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<String>,
    pub password: Option<String>,
    pub username: Option<String>,
    pub db: Option<String>,
    pub lazy_connect: Option<String>,
    pub connect_timeout: Option<String>,
}

impl ConnectionOverrides {
    /// Reads every connection override from `env`.
    pub fn from_env(env: &(impl EnvSource + ?Sized)) -> Self {
        Self {
            url: env.present(vars::URL),
            host: env.present(vars::HOST),
            port: env.present(vars::PORT),
            password: env.present(vars::PASSWORD),
            username: env.present(vars::USERNAME),
            db: env.present(vars::DB),
            lazy_connect: env.present(vars::LAZY_CONNECT),
            connect_timeout: env.present(vars::CONNECT_TIMEOUT),
        }
    }

    /// Applies the overrides on top of `defaults`.
    pub fn apply(&self, defaults: &ConnectionConfig) -> ConnectionConfig {
        if let Some(url) = &self.url {
            return ConnectionConfig {
                url: Some(url.clone()),
                lazy_connect: Some(defaults.lazy_connect.unwrap_or(true)),
                ..defaults.clone()
            };
        }

        let mut cfg = defaults.clone();
        if let Some(host) = &self.host {
            cfg.host = Some(host.clone());
        }
        if let Some(port) = &self.port {
            cfg.port = Some(Numeric::parse(port));
        }
        if let Some(password) = &self.password {
            cfg.password = Some(password.clone());
        }
        if let Some(username) = &self.username {
            cfg.username = Some(username.clone());
        }
        if let Some(db) = &self.db {
            cfg.db = Some(Numeric::parse(db));
        }
        if let Some(flag) = &self.lazy_connect {
            cfg.lazy_connect = Some(flag == "true");
        }
        if let Some(timeout) = &self.connect_timeout {
            cfg.connect_timeout = Some(Numeric::parse(timeout));
        }
        cfg
    }
}

/// Resolves the connection configuration from `defaults` and `env`.
///
/// ```
/// use jobvisor::config::{MapEnv, resolve_connection};
/// use jobvisor::ConnectionConfig;
///
/// let defaults = ConnectionConfig { host: Some("localhost".into()), lazy_connect: Some(false), ..Default::default() };
/// let env = MapEnv::new().with("QUEUE_URL", "queue://alt:6379").with("QUEUE_HOST", "ignored");
///
/// let cfg = resolve_connection(&defaults, &env);
/// assert_eq!(cfg.url.as_deref(), Some("queue://alt:6379"));
/// assert_eq!(cfg.host.as_deref(), Some("localhost"));
/// assert_eq!(cfg.lazy_connect, Some(false));
/// ```
pub fn resolve_connection(
    defaults: &ConnectionConfig,
    env: &(impl EnvSource + ?Sized),
) -> ConnectionConfig {
    ConnectionOverrides::from_env(env).apply(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapEnv;

    fn defaults() -> ConnectionConfig {
        ConnectionConfig {
            host: Some("localhost".into()),
            port: Some(Numeric::Int(6379)),
            lazy_connect: Some(false),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_wins_and_keeps_unrelated_defaults() {
        let env = MapEnv::new().with(vars::URL, "queue://alt:6379");
        let cfg = resolve_connection(
            &ConnectionConfig {
                host: Some("localhost".into()),
                lazy_connect: Some(false),
                ..Default::default()
            },
            &env,
        );
        assert_eq!(
            cfg,
            ConnectionConfig {
                host: Some("localhost".into()),
                lazy_connect: Some(false),
                url: Some("queue://alt:6379".into()),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_url_ignores_individual_overrides() {
        let env = MapEnv::new()
            .with(vars::URL, "queue://alt:6379")
            .with(vars::HOST, "other")
            .with(vars::PORT, "1")
            .with(vars::PASSWORD, "pw")
            .with(vars::USERNAME, "u")
            .with(vars::DB, "3")
            .with(vars::LAZY_CONNECT, "true")
            .with(vars::CONNECT_TIMEOUT, "10");
        let cfg = resolve_connection(&defaults(), &env);
        assert_eq!(
            cfg,
            ConnectionConfig {
                url: Some("queue://alt:6379".into()),
                ..defaults()
            }
        );
    }

    #[test]
    fn test_url_defaults_lazy_connect_to_true_when_unset() {
        let env = MapEnv::new().with(vars::URL, "queue://alt:6379");
        let cfg = resolve_connection(&ConnectionConfig::default(), &env);
        assert_eq!(cfg.lazy_connect, Some(true));
    }

    #[test]
    fn test_individual_overrides_touch_only_their_field() {
        let env = MapEnv::new().with(vars::PORT, "6380");
        let cfg = resolve_connection(&defaults(), &env);
        assert_eq!(
            cfg,
            ConnectionConfig {
                port: Some(Numeric::Int(6380)),
                ..defaults()
            }
        );

        let env = MapEnv::new()
            .with(vars::HOST, "cache")
            .with(vars::USERNAME, "svc")
            .with(vars::PASSWORD, "pw")
            .with(vars::DB, "2")
            .with(vars::CONNECT_TIMEOUT, "5000");
        let cfg = resolve_connection(&defaults(), &env);
        assert_eq!(cfg.host.as_deref(), Some("cache"));
        assert_eq!(cfg.port, Some(Numeric::Int(6379)));
        assert_eq!(cfg.username.as_deref(), Some("svc"));
        assert_eq!(cfg.password.as_deref(), Some("pw"));
        assert_eq!(cfg.db, Some(Numeric::Int(2)));
        assert_eq!(cfg.connect_timeout, Some(Numeric::Int(5000)));
        assert_eq!(cfg.lazy_connect, Some(false));
        assert_eq!(cfg.url, None);
    }

    #[test]
    fn test_absent_overrides_keep_defaults_exactly() {
        assert_eq!(resolve_connection(&defaults(), &MapEnv::new()), defaults());
        let env = MapEnv::new().with(vars::HOST, "").with(vars::URL, "");
        assert_eq!(resolve_connection(&defaults(), &env), defaults());
    }

    #[test]
    fn test_lazy_connect_requires_exact_true() {
        for (raw, expected) in [
            ("true", true),
            ("TRUE", false),
            ("True", false),
            ("1", false),
            ("yes", false),
            ("false", false),
        ] {
            let env = MapEnv::new().with(vars::LAZY_CONNECT, raw);
            let cfg = resolve_connection(&defaults(), &env);
            assert_eq!(cfg.lazy_connect, Some(expected), "input {raw:?}");
        }
    }

    #[test]
    fn test_malformed_numbers_propagate() {
        let env = MapEnv::new()
            .with(vars::PORT, "sixty")
            .with(vars::CONNECT_TIMEOUT, "1.5");
        let cfg = resolve_connection(&defaults(), &env);
        assert_eq!(cfg.port, Some(Numeric::Raw("sixty".into())));
        assert_eq!(cfg.connect_timeout, Some(Numeric::Raw("1.5".into())));
    }
}
