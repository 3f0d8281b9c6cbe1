//! Resolved queue connection parameters.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer-valued setting that keeps malformed input as-is.
///
/// Values coming from the environment are parsed as integers; anything that
/// does not parse is carried downstream unchanged as [`Numeric::Raw`] so the
/// connection layer can report it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// Well-formed integer.
    Int(i64),
    /// Input that is not an integer.
    Raw(String),
}

impl Numeric {
    /// Parses `s` as a base-10 integer, falling back to [`Numeric::Raw`].
    ///
    /// ```
    /// use jobvisor::config::Numeric;
    ///
    /// assert_eq!(Numeric::parse("6380"), Numeric::Int(6380));
    /// assert_eq!(Numeric::parse("63x"), Numeric::Raw("63x".into()));
    /// ```
    pub fn parse(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(n) => Numeric::Int(n),
            Err(_) => Numeric::Raw(s.to_string()),
        }
    }

    /// Returns the integer value, if well-formed.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Numeric::Int(n) => Some(*n),
            Numeric::Raw(_) => None,
        }
    }
}

impl From<i64> for Numeric {
    fn from(n: i64) -> Self {
        Numeric::Int(n)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Int(n) => write!(f, "{n}"),
            Numeric::Raw(s) => f.write_str(s),
        }
    }
}

/// Parameters needed to reach the shared queue backend.
///
/// Either a target `url` or the individual host/port/credentials fields.
/// Immutable once resolved; workers share it read-only through an `Arc`.
///
/// Serialized in camelCase so build-time defaults can be embedded as JSON:
/// ```
/// use jobvisor::ConnectionConfig;
///
/// let cfg = ConnectionConfig::from_json(r#"{"host":"localhost","lazyConnect":false}"#).unwrap();
/// assert_eq!(cfg.host.as_deref(), Some("localhost"));
/// assert_eq!(cfg.lazy_connect, Some(false));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Full connection URL; when set it wins over the individual fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Numeric>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Database index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<Numeric>,
    /// Defer connecting until first use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lazy_connect: Option<bool>,
    /// Connect timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<Numeric>,
}

impl ConnectionConfig {
    /// Parses build-time defaults from a JSON object.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// Human-readable connection target without credentials (for logs).
    pub fn target(&self) -> String {
        match (&self.url, &self.host) {
            (Some(url), _) => redact_url(url),
            (None, Some(host)) => match &self.port {
                Some(port) => format!("{host}:{port}"),
                None => host.clone(),
            },
            (None, None) => "<default>".to_string(),
        }
    }
}

/// Drops the userinfo part (`user:pass@`) of a URL.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
