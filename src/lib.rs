//! Edge request interceptor for static sites.
//!
//! Sits in front of a static origin and, per request: enforces the IP
//! allowlist and Basic Authentication, applies redirect rules (exact,
//! prefix or regex conditions), adds missing trailing slashes to
//! directory-like paths, and rewrites `dir/` to `dir/index.html` before
//! forwarding to the origin.

pub mod config;
pub mod edge;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rules;
pub mod source;

pub use config::EdgeConfig;
pub use edge::{EdgeHandler, EdgeOutcome, EdgeRequest};
pub use http::HttpServer;
pub use lifecycle::shutdown::Shutdown;
pub use rules::RuleSet;
