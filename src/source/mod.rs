//! Active rule set acquisition.
//!
//! # Data Flow
//! ```text
//! resolve()
//!     → redirects disabled?        → empty set
//!     → no remote URL?             → bundled defaults
//!     → fresh cache entry?         → cached set
//!     → fetch.rs (bounded by timeout)
//!         ok    → store in cache (when TTL set) → fetched set
//!         error → stale cache entry if any, else defaults
//! ```
//!
//! # Design Decisions
//! - Cache is an `ArcSwapOption`: lock-free reads, whole-set replacement
//! - Concurrent refreshes may both fetch; the last write wins
//! - A failed fetch never touches the cache (stale-if-error)

pub mod clock;
pub mod fetch;

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;

use crate::config::RedirectConfig;
use crate::observability::metrics;
use crate::rules::RuleSet;

pub use clock::{Clock, SystemClock};
#[cfg(test)]
pub use clock::ManualClock;
pub use fetch::{FetchError, HttpFetcher, RuleFetcher, DEFAULT_MAX_DOCUMENT_BYTES};

/// Rule set stored together with the time it was fetched.
#[derive(Debug, Clone)]
pub struct CachedRules {
    pub rules: RuleSet,
    pub fetched_at: u64,
}

/// Where the rules returned by [`RuleSource::resolve`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOrigin {
    Disabled,
    Defaults,
    Cached,
    Fetched,
    Stale,
    Fallback,
}

impl RuleOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleOrigin::Disabled => "disabled",
            RuleOrigin::Defaults => "defaults",
            RuleOrigin::Cached => "cached",
            RuleOrigin::Fetched => "fetched",
            RuleOrigin::Stale => "stale",
            RuleOrigin::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedRules {
    pub rules: RuleSet,
    pub origin: RuleOrigin,
}

#[derive(Debug, Clone)]
enum Mode {
    Disabled,
    Defaults,
    Remote { url: String, json_key: Option<String> },
}

/// Supplies the rule set for each request.
pub struct RuleSource {
    mode: Mode,
    defaults: RuleSet,
    cache_ttl: Option<Duration>,
    fetch_timeout: Duration,
    cache: ArcSwapOption<CachedRules>,
    fetcher: Arc<dyn RuleFetcher>,
    clock: Arc<dyn Clock>,
}

impl RuleSource {
    /// Build a source using the HTTP fetcher and the system clock.
    pub fn from_config(config: &RedirectConfig, defaults: RuleSet) -> Self {
        Self::with_parts(
            config,
            defaults,
            Arc::new(HttpFetcher::new(reqwest::Client::new(), config.max_rules_bytes)),
            Arc::new(SystemClock),
        )
    }

    /// Build a source with explicit fetcher and clock.
    pub fn with_parts(
        config: &RedirectConfig,
        defaults: RuleSet,
        fetcher: Arc<dyn RuleFetcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let mode = if !config.enabled {
            Mode::Disabled
        } else {
            match config.rules_url.as_deref().filter(|u| !u.is_empty()) {
                Some(url) => Mode::Remote {
                    url: url.to_string(),
                    json_key: config.json_key.clone().filter(|k| !k.is_empty()),
                },
                None => Mode::Defaults,
            }
        };

        Self {
            mode,
            defaults,
            // A zero TTL disables caching.
            cache_ttl: config.cache_ttl_ms.filter(|ttl| *ttl > 0).map(Duration::from_millis),
            fetch_timeout: Duration::from_millis(config.fetch_timeout_ms),
            cache: ArcSwapOption::empty(),
            fetcher,
            clock,
        }
    }

    /// Current cache entry, if any.
    pub fn cached(&self) -> Option<Arc<CachedRules>> {
        self.cache.load_full()
    }

    /// Determine the rule set for one request.
    pub async fn resolve(&self) -> ResolvedRules {
        let resolved = match &self.mode {
            Mode::Disabled => ResolvedRules {
                rules: RuleSet::empty(),
                origin: RuleOrigin::Disabled,
            },
            Mode::Defaults => ResolvedRules {
                rules: self.defaults.clone(),
                origin: RuleOrigin::Defaults,
            },
            Mode::Remote { url, json_key } => self.resolve_remote(url, json_key.as_deref()).await,
        };

        metrics::record_rule_resolution(resolved.origin.as_str());
        resolved
    }

    async fn resolve_remote(&self, url: &str, json_key: Option<&str>) -> ResolvedRules {
        let now = self.clock.now_millis();
        let cached = self.cache.load_full();

        if let (Some(ttl), Some(entry)) = (self.cache_ttl, cached.as_ref()) {
            if now.saturating_sub(entry.fetched_at) < ttl.as_millis() as u64 {
                return ResolvedRules {
                    rules: entry.rules.clone(),
                    origin: RuleOrigin::Cached,
                };
            }
        }

        match self.fetch(url, json_key).await {
            Ok(rules) => {
                tracing::info!(url = %url, rules = rules.len(), "Fetched redirect rules");
                if self.cache_ttl.is_some() {
                    self.cache.store(Some(Arc::new(CachedRules {
                        rules: rules.clone(),
                        fetched_at: now,
                    })));
                }
                ResolvedRules {
                    rules,
                    origin: RuleOrigin::Fetched,
                }
            }
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Redirect rule fetch failed");
                match cached {
                    Some(entry) => ResolvedRules {
                        rules: entry.rules.clone(),
                        origin: RuleOrigin::Stale,
                    },
                    None => ResolvedRules {
                        rules: self.defaults.clone(),
                        origin: RuleOrigin::Fallback,
                    },
                }
            }
        }
    }

    async fn fetch(&self, url: &str, json_key: Option<&str>) -> Result<RuleSet, FetchError> {
        let document = tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| FetchError::Timeout(self.fetch_timeout))??;
        Ok(RuleSet::from_json_value(document, json_key)?)
    }
}
