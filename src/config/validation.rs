//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, IPs and URLs
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EdgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::EdgeConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("upstream.address `{0}` is not a valid host:port")]
    UpstreamAddress(String),

    #[error("access.allowed_ips entry `{0}` is not an IP address")]
    AllowedIp(String),

    #[error("access.basic_auth.account.id must be non-empty and contain no ':'")]
    AccountId,

    #[error("redirect.rules_url `{0}` must be an http(s) URL")]
    RulesUrl(String),

    #[error("redirect.origin_scheme `{0}` must be `http` or `https`")]
    OriginScheme(String),

    #[error("{0} must be greater than zero")]
    NotPositive(&'static str),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

pub fn validate_config(config: &EdgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SocketAddr::from_str(&config.listener.bind_address).is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let upstream_ok = Authority::from_str(&config.upstream.address)
        .map(|a| a.port_u16().is_some() && !a.host().is_empty())
        .unwrap_or(false);
    if !upstream_ok {
        errors.push(ValidationError::UpstreamAddress(config.upstream.address.clone()));
    }

    for ip in &config.access.allowed_ips {
        if IpAddr::from_str(ip).is_err() {
            errors.push(ValidationError::AllowedIp(ip.clone()));
        }
    }

    if let Some(auth) = &config.access.basic_auth {
        if auth.account.id.is_empty() || auth.account.id.contains(':') {
            errors.push(ValidationError::AccountId);
        }
    }

    if let Some(rules_url) = config.redirect.rules_url.as_deref().filter(|u| !u.is_empty()) {
        let valid = url::Url::parse(rules_url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::RulesUrl(rules_url.to_string()));
        }
    }

    if !matches!(config.redirect.origin_scheme.as_str(), "http" | "https") {
        errors.push(ValidationError::OriginScheme(config.redirect.origin_scheme.clone()));
    }

    if config.redirect.fetch_timeout_ms == 0 {
        errors.push(ValidationError::NotPositive("redirect.fetch_timeout_ms"));
    }
    if config.redirect.max_rules_bytes == 0 {
        errors.push(ValidationError::NotPositive("redirect.max_rules_bytes"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive("timeouts.request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::NotPositive("timeouts.upstream_secs"));
    }

    if config.observability.metrics_enabled
        && SocketAddr::from_str(&config.observability.metrics_address).is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
