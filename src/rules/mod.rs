//! Redirect rule engine.
//!
//! # Data Flow
//! ```text
//! JSON rule document (bundled or remote)
//!     → model.rs (deserialize + validate into RuleSet)
//!     → matcher.rs (first rule matching the normalized path)
//!     → uri.rs (build Location from rule, path and request origin)
//!         → template.rs (capture substitution for regexp rules)
//! ```
//!
//! # Design Decisions
//! - Rule sets are immutable and shared via `Arc`
//! - Regex patterns compiled once per document load
//! - Unknown condition kinds fail closed

pub mod defaults;
pub mod matcher;
pub mod model;
pub mod template;
pub mod uri;

pub use matcher::find_rule;
pub use model::{Condition, Redirect, RedirectRule, RedirectTarget, RuleDocumentError, RuleSet, TargetLocation};
pub use uri::{append_query, build_location};
