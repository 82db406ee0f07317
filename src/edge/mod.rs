//! Edge request handling.
//!
//! # Data Flow
//! ```text
//! EdgeRequest (uri, query, host, authorization, client IP)
//!     → access.rs (IP allowlist, Basic Auth)
//!     → source (active RuleSet)
//!     → processor.rs (rule → trailing slash → index document)
//!     → handler.rs maps Decision to EdgeOutcome
//! ```

pub mod access;
pub mod handler;
pub mod processor;

use thiserror::Error;

pub use access::{AccessControl, AccessDenial};
pub use handler::{EdgeHandler, EdgeOutcome};
pub use processor::{normalize_path, Decision, RequestProcessor, Stage};

/// Transport-independent view of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeRequest {
    /// Request path as received, including the leading slash.
    pub uri: String,
    /// Query string without the leading `?`; empty when absent.
    pub querystring: String,
    pub host: Option<String>,
    pub authorization: Option<String>,
    pub client_ip: String,
}

/// Failures while deciding how to answer a request. Surfaced to clients
/// only as a generic 500.
#[derive(Debug, Error)]
pub enum EdgeError {
    #[error("request has no Host header")]
    MissingHost,

    #[error("redirect location `{0}` is not a valid header value")]
    InvalidLocation(String),
}
