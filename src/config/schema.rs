//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the edge
//! interceptor. All types derive Serde traits for deserialization from
//! config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Origin server that pass-through requests are forwarded to.
    pub upstream: UpstreamConfig,

    /// IP allowlist and Basic Authentication.
    pub access: AccessConfig,

    /// Redirect engine settings.
    pub redirect: RedirectConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Origin server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin address as `host:port` (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Access control applied before the redirect engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AccessConfig {
    /// Client IPs allowed through. Empty allows everyone.
    pub allowed_ips: Vec<String>,

    /// Basic Authentication for selected path prefixes.
    pub basic_auth: Option<BasicAuthConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicAuthConfig {
    /// Request path prefixes that require credentials.
    #[serde(default)]
    pub required_paths: Vec<String>,

    /// The single accepted account.
    pub account: AccountConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
    pub id: String,
    pub password: String,
}

/// Redirect engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Apply redirect rules. When false only the trailing-slash and
    /// index-document fallbacks run.
    pub enabled: bool,

    /// Remote rule document URL. Bundled defaults are used when unset.
    pub rules_url: Option<String>,

    /// Key holding the rule array inside the remote document.
    pub json_key: Option<String>,

    /// How long a fetched rule set is reused, in milliseconds.
    /// Unset or zero fetches on every request.
    pub cache_ttl_ms: Option<u64>,

    /// Upper bound on a remote fetch, in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Largest remote rule document accepted, in bytes.
    pub max_rules_bytes: usize,

    /// Replaces the bundled default rules with a local JSON document.
    pub rules_file: Option<PathBuf>,

    /// Scheme used when building the request origin (`https` or `http`).
    pub origin_scheme: String,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rules_url: None,
            json_key: None,
            cache_ttl_ms: None,
            fetch_timeout_ms: 5_000,
            max_rules_bytes: 1024 * 1024,
            rules_file: None,
            origin_scheme: "https".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for handling one request, in seconds.
    pub request_secs: u64,

    /// Time allowed for the origin to respond, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
