//! Access control ahead of the redirect engine.
//!
//! # Responsibilities
//! - IP allowlist (empty list allows everyone)
//! - HTTP Basic Authentication for configured path prefixes
//!
//! # Design Decisions
//! - Denied IPs get 418 rather than 403; 403 is reserved for the static
//!   site's own error-page handling at the origin
//! - Credentials are pre-encoded once; requests compare header strings

use std::net::IpAddr;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::AccessConfig;
use crate::edge::EdgeRequest;

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    IpNotAllowed,
    Unauthorized,
}

impl AccessDenial {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessDenial::IpNotAllowed => "ip_not_allowed",
            AccessDenial::Unauthorized => "unauthorized",
        }
    }
}

#[derive(Debug, Clone)]
struct BasicAuthGuard {
    required_paths: Vec<String>,
    expected_header: String,
}

#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    allowed_ips: Vec<IpAddr>,
    basic_auth: Option<BasicAuthGuard>,
}

impl AccessControl {
    /// Entries that fail to parse are skipped; validation rejects them
    /// before a config is accepted.
    pub fn from_config(config: &AccessConfig) -> Self {
        let allowed_ips = config
            .allowed_ips
            .iter()
            .filter_map(|ip| IpAddr::from_str(ip).ok())
            .collect();

        let basic_auth = config.basic_auth.as_ref().map(|auth| {
            let credentials = format!("{}:{}", auth.account.id, auth.account.password);
            BasicAuthGuard {
                required_paths: auth.required_paths.clone(),
                expected_header: format!("Basic {}", STANDARD.encode(credentials)),
            }
        });

        Self {
            allowed_ips,
            basic_auth,
        }
    }

    pub fn check(&self, request: &EdgeRequest) -> Result<(), AccessDenial> {
        if !self.allowed_ips.is_empty() && !self.ip_allowed(&request.client_ip) {
            return Err(AccessDenial::IpNotAllowed);
        }

        if let Some(guard) = &self.basic_auth {
            let protected = guard
                .required_paths
                .iter()
                .any(|prefix| request.uri.starts_with(prefix.as_str()));
            if protected && request.authorization.as_deref() != Some(guard.expected_header.as_str()) {
                return Err(AccessDenial::Unauthorized);
            }
        }

        Ok(())
    }

    fn ip_allowed(&self, client_ip: &str) -> bool {
        IpAddr::from_str(client_ip)
            .map(|ip| ip.to_canonical())
            .map(|ip| self.allowed_ips.contains(&ip))
            .unwrap_or(false)
    }
}
