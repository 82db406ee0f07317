//! Metrics collection and exposition.
//!
//! # Metrics
//! - `edge_requests_total` (counter): requests by outcome and status
//! - `edge_request_duration_seconds` (histogram): handling latency
//! - `edge_redirects_total` (counter): redirects by deciding stage
//! - `edge_rule_resolutions_total` (counter): rule set source per request
//! - `edge_access_denied_total` (counter): denials by reason
//! - `edge_upstream_errors_total` (counter): origin failures by kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(outcome: &'static str, status: u16, start: Instant) {
    counter!("edge_requests_total", "outcome" => outcome, "status" => status.to_string()).increment(1);
    histogram!("edge_request_duration_seconds", "outcome" => outcome).record(start.elapsed().as_secs_f64());
}

pub fn record_redirect(stage: &'static str, status: u16) {
    counter!("edge_redirects_total", "stage" => stage, "status" => status.to_string()).increment(1);
}

pub fn record_rule_resolution(origin: &'static str) {
    counter!("edge_rule_resolutions_total", "origin" => origin).increment(1);
}

pub fn record_access_denied(reason: &'static str) {
    counter!("edge_access_denied_total", "reason" => reason).increment(1);
}

pub fn record_upstream_error(kind: &'static str) {
    counter!("edge_upstream_errors_total", "kind" => kind).increment(1);
}
