//! Default rule set shipped with the binary.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::rules::model::{RuleDocumentError, RuleSet};

/// Rule document compiled into the binary.
pub const BUNDLED_RULES: &str = include_str!("../../rules/redirect_rules.json");

#[derive(Debug, Error)]
pub enum DefaultRulesError {
    #[error("failed to read rules file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid rules in {origin}: {source}")]
    Document {
        origin: String,
        #[source]
        source: RuleDocumentError,
    },
}

/// Parse the bundled rule document.
pub fn bundled() -> Result<RuleSet, DefaultRulesError> {
    RuleSet::from_json_str(BUNDLED_RULES, None).map_err(|source| DefaultRulesError::Document {
        origin: "bundled rules".to_string(),
        source,
    })
}

/// Load the default rule set: `path` when given, the bundled document otherwise.
pub fn load(path: Option<&Path>) -> Result<RuleSet, DefaultRulesError> {
    let Some(path) = path else {
        return bundled();
    };

    let text = fs::read_to_string(path).map_err(|source| DefaultRulesError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rules = RuleSet::from_json_str(&text, None).map_err(|source| DefaultRulesError::Document {
        origin: path.display().to_string(),
        source,
    })?;

    tracing::info!(path = %path.display(), rules = rules.len(), "Loaded default redirect rules");
    Ok(rules)
}
