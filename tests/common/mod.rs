//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use edge_redirect::config::EdgeConfig;
use edge_redirect::{HttpServer, Shutdown};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

pub const HOST: &str = "www.example.com";

/// Start an origin server that echoes the path and query it received.
pub async fn start_origin() -> SocketAddr {
    let app = Router::new().fallback(|uri: Uri| async move { format!("origin:{uri}") });
    serve(app).await
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Programmable rule document endpoint at `/rules.json`.
pub struct MockRules {
    pub body: Mutex<String>,
    pub fail: AtomicBool,
    pub delay_ms: AtomicU64,
    pub hits: AtomicUsize,
}

impl MockRules {
    pub fn set_body(&self, body: impl Into<String>) {
        *self.body.lock().unwrap() = body.into();
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve_rules(State(state): State<Arc<MockRules>>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
    if state.fail.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "rules unavailable").into_response();
    }

    let body = state.body.lock().unwrap().clone();
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Start a rule document server; returns the document URL and its controls.
pub async fn start_rules_server(body: &str) -> (String, Arc<MockRules>) {
    let state = Arc::new(MockRules {
        body: Mutex::new(body.to_string()),
        fail: AtomicBool::new(false),
        delay_ms: AtomicU64::new(0),
        hits: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/rules.json", get(serve_rules))
        .with_state(state.clone());
    let addr = serve(app).await;
    (format!("http://{addr}/rules.json"), state)
}

async fn serve(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

/// A running interceptor under test.
pub struct Edge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<EdgeConfig>,
}

impl Edge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the interceptor on an ephemeral port.
pub async fn start_edge(mut config: EdgeConfig) -> Edge {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let server = HttpServer::new(config).unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (updates, config_updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    Edge {
        addr,
        shutdown,
        updates,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
