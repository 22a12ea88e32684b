// ── Resolved connection settings ──
//
// What the resolver produces from a draft, and the SSH settings the
// metrics poller uses to reach a device.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Port the backend assumes when none is given.
pub const BACKEND_DEFAULT_PORT: u16 = 22;
/// Connect timeout (seconds) the backend assumes when none is given.
pub const BACKEND_DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
/// Login the backend uses when no username is given.
pub const BACKEND_DEFAULT_USERNAME: &str = "user";

/// Validated SSH connection settings for one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub hostname: String,
    pub ip: String,
    pub username: Option<String>,
    pub port: Option<u16>,
    pub strict_host_key_checking: bool,
    pub connect_timeout: Option<u64>,
}

/// Payload of the simple add command: the backend picks every SSH option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleAdd {
    pub hostname: String,
    pub ip: String,
}

/// Which backend add command a draft resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AddVariant {
    Simple,
    Advanced,
}

/// Resolver output: one of two payload shapes keyed by `variant`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", content = "payload", rename_all = "lowercase")]
pub enum ResolvedAdd {
    Simple(SimpleAdd),
    Advanced(ConnectionConfig),
}

impl ResolvedAdd {
    pub fn variant(&self) -> AddVariant {
        match self {
            Self::Simple(_) => AddVariant::Simple,
            Self::Advanced(_) => AddVariant::Advanced,
        }
    }

    pub fn hostname(&self) -> &str {
        match self {
            Self::Simple(s) => &s.hostname,
            Self::Advanced(c) => &c.hostname,
        }
    }

    pub fn ip(&self) -> &str {
        match self {
            Self::Simple(s) => &s.ip,
            Self::Advanced(c) => &c.ip,
        }
    }

    /// The settings the backend will actually connect with.
    pub fn effective_connection(&self) -> ConnectionConfig {
        match self {
            Self::Simple(s) => ConnectionConfig {
                hostname: s.hostname.clone(),
                ip: s.ip.clone(),
                username: None,
                port: Some(BACKEND_DEFAULT_PORT),
                strict_host_key_checking: true,
                connect_timeout: Some(BACKEND_DEFAULT_CONNECT_TIMEOUT_SECS),
            },
            Self::Advanced(c) => c.clone(),
        }
    }
}

/// SSH settings used to sample a device's metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsAccess {
    pub username: String,
    pub port: Option<u16>,
    pub strict_host_key_checking: bool,
    pub connect_timeout_secs: Option<u64>,
}

impl Default for MetricsAccess {
    fn default() -> Self {
        Self {
            username: BACKEND_DEFAULT_USERNAME.to_owned(),
            port: None,
            strict_host_key_checking: false,
            connect_timeout_secs: None,
        }
    }
}

impl MetricsAccess {
    /// Reuse the settings a device was added with. A missing username
    /// falls back to `fallback`'s.
    pub fn from_connection(config: &ConnectionConfig, fallback: &Self) -> Self {
        Self {
            username: config
                .username
                .clone()
                .unwrap_or_else(|| fallback.username.clone()),
            port: config.port,
            strict_host_key_checking: config.strict_host_key_checking,
            connect_timeout_secs: config.connect_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn resolved_add_is_tagged_by_variant() {
        let simple = ResolvedAdd::Simple(SimpleAdd {
            hostname: "srv1".into(),
            ip: "10.0.0.5".into(),
        });
        assert_eq!(
            serde_json::to_value(&simple).ok(),
            Some(json!({
                "variant": "simple",
                "payload": { "hostname": "srv1", "ip": "10.0.0.5" }
            }))
        );
        assert_eq!(simple.variant().to_string(), "simple");
    }

    #[test]
    fn simple_add_connects_with_backend_defaults() {
        let simple = ResolvedAdd::Simple(SimpleAdd {
            hostname: "srv1".into(),
            ip: "10.0.0.5".into(),
        });
        let effective = simple.effective_connection();
        assert_eq!(effective.port, Some(22));
        assert_eq!(effective.connect_timeout, Some(30));
        assert!(effective.strict_host_key_checking);
        assert_eq!(effective.username, None);
    }

    #[test]
    fn metrics_access_reuses_device_settings() {
        let config = ConnectionConfig {
            hostname: "srv2".into(),
            ip: "10.0.0.6".into(),
            username: Some("ops".into()),
            port: Some(2222),
            strict_host_key_checking: true,
            connect_timeout: Some(10),
        };
        let access = MetricsAccess::from_connection(&config, &MetricsAccess::default());
        assert_eq!(
            access,
            MetricsAccess {
                username: "ops".into(),
                port: Some(2222),
                strict_host_key_checking: true,
                connect_timeout_secs: Some(10),
            }
        );
    }

    #[test]
    fn metrics_access_falls_back_to_default_username() {
        let config = ConnectionConfig {
            hostname: "srv3".into(),
            ip: "10.0.0.7".into(),
            username: None,
            port: None,
            strict_host_key_checking: false,
            connect_timeout: None,
        };
        let fallback = MetricsAccess {
            username: "monitor".into(),
            ..MetricsAccess::default()
        };
        assert_eq!(
            MetricsAccess::from_connection(&config, &fallback).username,
            "monitor"
        );
    }
}
