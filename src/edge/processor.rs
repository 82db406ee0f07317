//! Redirect decision pipeline.
//!
//! Stages run in order and the first one that produces a decision wins:
//!
//! 1. `rule`: first matching redirect rule
//! 2. `trailing_slash`: directory-like paths get a 302 to `path/`
//!
//! When neither applies the request is forwarded, with `index.html`
//! appended to paths ending in `/`.

use axum::http::StatusCode;

use crate::edge::{EdgeError, EdgeRequest};
use crate::rules::{append_query, build_location, find_rule, RuleSet};

/// Which step of the pipeline produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Rule,
    TrailingSlash,
    IndexDocument,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Rule => "rule",
            Stage::TrailingSlash => "trailing_slash",
            Stage::IndexDocument => "index_document",
        }
    }
}

/// Outcome of processing one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Answer with a redirect to `location`.
    Redirect {
        status: StatusCode,
        location: String,
        stage: Stage,
    },
    /// Send the request on to the origin with this path.
    Forward { uri: String },
}

/// Strip all leading slashes and one trailing slash.
pub fn normalize_path(uri: &str) -> &str {
    let trimmed = uri.trim_start_matches('/');
    trimmed.strip_suffix('/').unwrap_or(trimmed)
}

struct Evaluation<'a> {
    uri: &'a str,
    query: &'a str,
    path: &'a str,
    origin: &'a str,
    rules: &'a RuleSet,
}

type StageFn = fn(&Evaluation<'_>) -> Option<Decision>;

const PIPELINE: [StageFn; 2] = [redirect_by_rule, redirect_to_directory];

fn redirect_by_rule(eval: &Evaluation<'_>) -> Option<Decision> {
    let rule = find_rule(eval.path, eval.rules)?;
    let mut location = build_location(rule, eval.path, eval.origin);
    append_query(&mut location, eval.query);

    tracing::debug!(
        kind = rule.condition.kind(),
        path = %eval.path,
        location = %location,
        "Redirect rule matched"
    );

    Some(Decision::Redirect {
        status: rule.redirect.status_code,
        location,
        stage: Stage::Rule,
    })
}

fn redirect_to_directory(eval: &Evaluation<'_>) -> Option<Decision> {
    let last_segment = eval.path.rsplit('/').next().unwrap_or_default();
    if eval.uri.ends_with('/') || last_segment.contains('.') {
        return None;
    }

    let mut location = format!("{}/{}/", eval.origin, eval.path);
    append_query(&mut location, eval.query);

    Some(Decision::Redirect {
        status: StatusCode::FOUND,
        location,
        stage: Stage::TrailingSlash,
    })
}

fn serve_index_document(eval: &Evaluation<'_>) -> Decision {
    let uri = if eval.uri.ends_with('/') {
        format!("{}index.html", eval.uri)
    } else {
        eval.uri.to_string()
    };
    Decision::Forward { uri }
}

/// Applies the pipeline to requests.
#[derive(Debug, Clone)]
pub struct RequestProcessor {
    origin_scheme: String,
}

impl RequestProcessor {
    pub fn new(origin_scheme: impl Into<String>) -> Self {
        Self {
            origin_scheme: origin_scheme.into(),
        }
    }

    /// `scheme://host` for the request.
    pub fn origin(&self, request: &EdgeRequest) -> Result<String, EdgeError> {
        let host = request
            .host
            .as_deref()
            .filter(|h| !h.is_empty())
            .ok_or(EdgeError::MissingHost)?;
        Ok(format!("{}://{}", self.origin_scheme, host))
    }

    pub fn process(&self, request: &EdgeRequest, rules: &RuleSet) -> Result<Decision, EdgeError> {
        let origin = self.origin(request)?;
        let eval = Evaluation {
            uri: &request.uri,
            query: &request.querystring,
            path: normalize_path(&request.uri),
            origin: &origin,
            rules,
        };

        Ok(PIPELINE
            .iter()
            .find_map(|stage| stage(&eval))
            .unwrap_or_else(|| serve_index_document(&eval)))
    }
}

impl Default for RequestProcessor {
    fn default() -> Self {
        Self::new("https")
    }
}
