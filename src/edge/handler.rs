//! Per-request orchestration: access control, rule resolution, decision.

use crate::config::{ConfigError, EdgeConfig};
use crate::edge::access::{AccessControl, AccessDenial};
use crate::edge::processor::{Decision, RequestProcessor};
use crate::edge::{EdgeError, EdgeRequest};
use crate::http::response::EdgeResponse;
use crate::observability::metrics;
use crate::rules::{defaults, RuleSet};
use crate::source::RuleSource;

/// What the transport layer should do with a request.
#[derive(Debug)]
pub enum EdgeOutcome {
    /// Answer directly.
    Respond(EdgeResponse),
    /// Forward to the origin with the given path.
    Forward { uri: String },
}

pub struct EdgeHandler {
    access: AccessControl,
    source: RuleSource,
    processor: RequestProcessor,
}

impl EdgeHandler {
    pub fn new(access: AccessControl, source: RuleSource, processor: RequestProcessor) -> Self {
        Self {
            access,
            source,
            processor,
        }
    }

    /// Build a handler from configuration, loading the default rules once.
    pub fn from_config(config: &EdgeConfig) -> Result<Self, ConfigError> {
        let default_rules = defaults::load(config.redirect.rules_file.as_deref())?;

        Ok(Self::new(
            AccessControl::from_config(&config.access),
            RuleSource::from_config(&config.redirect, default_rules),
            RequestProcessor::new(config.redirect.origin_scheme.clone()),
        ))
    }

    pub fn source(&self) -> &RuleSource {
        &self.source
    }

    pub async fn handle(&self, request: &EdgeRequest) -> EdgeOutcome {
        if let Err(denial) = self.access.check(request) {
            tracing::info!(
                client_ip = %request.client_ip,
                uri = %request.uri,
                reason = denial.as_str(),
                "Access denied"
            );
            metrics::record_access_denied(denial.as_str());
            return EdgeOutcome::Respond(match denial {
                AccessDenial::IpNotAllowed => EdgeResponse::forbidden(),
                AccessDenial::Unauthorized => EdgeResponse::unauthorized(),
            });
        }

        let resolved = self.source.resolve().await;
        tracing::debug!(
            origin = resolved.origin.as_str(),
            rules = resolved.rules.len(),
            "Rule set resolved"
        );

        match self.decide(request, &resolved.rules) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(uri = %request.uri, error = %e, "Request processing failed");
                EdgeOutcome::Respond(EdgeResponse::internal_error())
            }
        }
    }

    fn decide(&self, request: &EdgeRequest, rules: &RuleSet) -> Result<EdgeOutcome, EdgeError> {
        match self.processor.process(request, rules)? {
            Decision::Redirect { status, location, stage } => {
                tracing::info!(
                    uri = %request.uri,
                    status = status.as_u16(),
                    location = %location,
                    stage = stage.as_str(),
                    "Redirecting"
                );
                metrics::record_redirect(stage.as_str(), status.as_u16());
                Ok(EdgeOutcome::Respond(EdgeResponse::redirect(status, &location)?))
            }
            Decision::Forward { uri } => {
                tracing::debug!(original = %request.uri, forwarded = %uri, "Forwarding to origin");
                Ok(EdgeOutcome::Forward { uri })
            }
        }
    }
}
