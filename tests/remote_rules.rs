//! Remote rule documents: fetching, caching, stale-if-error and timeouts.

use std::time::Duration;

use edge_redirect::config::EdgeConfig;
use reqwest::StatusCode;

mod common;
use common::{client, location, HOST};

const REMOTE_RULES: &str = r#"[
  {"condition": {"key": {"type": "exactMatch", "value": "promo"}},
   "redirect": {"statusCode": 307, "uri": "/campaign/spring/"}}
]"#;

const KEYED_RULES: &str = r#"{"version": 2, "redirects": [
  {"condition": {"key": {"type": "prefixMatch", "value": "shop"}},
   "redirect": {"statusCode": "301", "uri": {"origin": "https://store.example", "path": "/"}}}
]}"#;

async fn remote_config(rules_url: String, ttl_ms: Option<u64>) -> EdgeConfig {
    let origin = common::start_origin().await;
    let mut config = EdgeConfig::default();
    config.upstream.address = origin.to_string();
    config.redirect.enabled = true;
    config.redirect.rules_url = Some(rules_url);
    config.redirect.cache_ttl_ms = ttl_ms;
    config
}

async fn get(edge: &common::Edge, path: &str) -> reqwest::Response {
    client()
        .get(edge.url(path))
        .header("host", HOST)
        .send()
        .await
        .expect("edge unreachable")
}

#[tokio::test]
async fn test_remote_rules_applied_and_cached() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    let edge = common::start_edge(remote_config(url, Some(60_000)).await).await;

    let res = get(&edge, "/promo").await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&res), "/campaign/spring/");

    // Bundled rules are not active while remote rules are.
    let res = get(&edge, "/old-page").await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "https://www.example.com/old-page/");

    assert_eq!(rules.hits(), 1, "second request should use the cache");
}

#[tokio::test]
async fn test_without_ttl_every_request_fetches() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    let edge = common::start_edge(remote_config(url, None).await).await;

    get(&edge, "/promo").await;
    get(&edge, "/promo").await;
    assert_eq!(rules.hits(), 2);
}

#[tokio::test]
async fn test_json_key_document() {
    let (url, _rules) = common::start_rules_server(KEYED_RULES).await;
    let mut config = remote_config(url, None).await;
    config.redirect.json_key = Some("redirects".into());
    let edge = common::start_edge(config).await;

    let res = get(&edge, "/shop/shoes?size=9").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "https://store.example/?size=9");
}

#[tokio::test]
async fn test_fetch_failure_without_cache_uses_defaults() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    rules.set_failing(true);
    let edge = common::start_edge(remote_config(url, Some(60_000)).await).await;

    let res = get(&edge, "/old-page").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "/new-page/");
}

#[tokio::test]
async fn test_malformed_document_uses_defaults() {
    let (url, _rules) = common::start_rules_server(r#"{"not": "an array"}"#).await;
    let edge = common::start_edge(remote_config(url, Some(60_000)).await).await;

    let res = get(&edge, "/old-page").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "/new-page/");
}

#[tokio::test]
async fn test_oversized_document_uses_defaults() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    let mut config = remote_config(url, Some(60_000)).await;
    config.redirect.max_rules_bytes = 32;
    let edge = common::start_edge(config).await;

    let res = get(&edge, "/old-page").await;
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(location(&res), "/new-page/");
    assert_eq!(rules.hits(), 1);
}

#[tokio::test]
async fn test_stale_rules_survive_failed_refresh() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    let edge = common::start_edge(remote_config(url, Some(100)).await).await;

    let res = get(&edge, "/promo").await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT);

    rules.set_failing(true);
    tokio::time::sleep(Duration::from_millis(250)).await;

    let res = get(&edge, "/promo").await;
    assert_eq!(res.status(), StatusCode::TEMPORARY_REDIRECT, "stale cache should stay in effect");
    assert_eq!(rules.hits(), 2, "expired cache should trigger a refresh attempt");
}

#[tokio::test]
async fn test_refresh_replaces_rules_after_expiry() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    let edge = common::start_edge(remote_config(url, Some(100)).await).await;

    assert_eq!(get(&edge, "/promo").await.status(), StatusCode::TEMPORARY_REDIRECT);

    rules.set_body("[]");
    tokio::time::sleep(Duration::from_millis(250)).await;

    let res = get(&edge, "/promo").await;
    assert_eq!(res.status(), StatusCode::FOUND);
    assert_eq!(location(&res), "https://www.example.com/promo/");
}

#[tokio::test]
async fn test_slow_rule_source_times_out() {
    let (url, rules) = common::start_rules_server(REMOTE_RULES).await;
    rules.set_delay(Duration::from_secs(5));
    let mut config = remote_config(url, Some(60_000)).await;
    config.redirect.fetch_timeout_ms = 100;
    let edge = common::start_edge(config).await;

    let started = std::time::Instant::now();
    let res = get(&edge, "/old-page").await;
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY, "defaults apply after a timeout");
}
