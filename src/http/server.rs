//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all edge handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Answer redirects and denials directly
//! - Forward pass-through requests to the origin server
//! - Swap the edge handler when a new config arrives

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{uri::Authority, uri::Scheme, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::ValidationError;
use crate::config::{ConfigError, EdgeConfig};
use crate::edge::{EdgeHandler, EdgeOutcome};
use crate::http::request::{edge_request, request_id, UuidRequestId};
use crate::http::response::EdgeResponse;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::metrics;

/// Everything a request needs that can change on config reload.
pub struct ServiceState {
    pub handler: EdgeHandler,
    pub upstream: Authority,
    pub upstream_timeout: Duration,
}

impl ServiceState {
    pub fn from_config(config: &EdgeConfig) -> Result<Self, ConfigError> {
        let upstream = Authority::from_str(&config.upstream.address).map_err(|_| {
            ConfigError::Validation(vec![ValidationError::UpstreamAddress(
                config.upstream.address.clone(),
            )])
        })?;

        Ok(Self {
            handler: EdgeHandler::from_config(config)?,
            upstream,
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<ServiceState>>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the edge interceptor.
pub struct HttpServer {
    router: Router,
    config: EdgeConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: EdgeConfig) -> Result<Self, ConfigError> {
        let service = ServiceState::from_config(&config)?;

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(service)),
            client,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &EdgeConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Run the server, accepting connections on the given listener until
    /// Ctrl+C or a shutdown broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<EdgeConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let inner = self.state.inner.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                match ServiceState::from_config(&new_config) {
                    Ok(service) => {
                        inner.store(Arc::new(service));
                        tracing::info!("Configuration reloaded");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded configuration, keeping current");
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }

    /// Shared state, e.g. to inspect the rule cache.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Catch-all handler: decide at the edge, then answer or forward.
async fn edge_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let service = state.inner.load_full();
    let edge = edge_request(&request, addr.ip());

    tracing::debug!(
        request_id = %request_id,
        method = %request.method(),
        uri = %edge.uri,
        client_ip = %edge.client_ip,
        "Edge request"
    );

    match service.handler.handle(&edge).await {
        EdgeOutcome::Respond(response) => {
            metrics::record_request("respond", response.status().as_u16(), start_time);
            response.into_response()
        }
        EdgeOutcome::Forward { uri } => {
            forward(&state.client, &service, request, &uri, &request_id, start_time).await
        }
    }
}

/// Send the request to the origin with its path replaced by `path`.
async fn forward(
    client: &Client<HttpConnector, Body>,
    service: &ServiceState,
    request: Request<Body>,
    path: &str,
    request_id: &str,
    start_time: Instant,
) -> Response {
    let (mut parts, body) = request.into_parts();

    let path_and_query = match parts.uri.query() {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    };
    let target = Uri::builder()
        .scheme(Scheme::HTTP)
        .authority(service.upstream.clone())
        .path_and_query(path_and_query)
        .build();
    let target = match target {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build origin URI");
            metrics::record_request("forward", 500, start_time);
            return EdgeResponse::internal_error().into_response();
        }
    };

    parts.uri = target;
    parts.version = Version::HTTP_11;
    let upstream_request = Request::from_parts(parts, body);

    match tokio::time::timeout(service.upstream_timeout, client.request(upstream_request)).await {
        Ok(Ok(response)) => {
            metrics::record_request("forward", response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Ok(Err(e)) => {
            tracing::error!(request_id = %request_id, upstream = %service.upstream, error = %e, "Origin request failed");
            metrics::record_upstream_error("connect");
            metrics::record_request("forward", 502, start_time);
            (StatusCode::BAD_GATEWAY, "Origin request failed").into_response()
        }
        Err(_) => {
            tracing::error!(request_id = %request_id, upstream = %service.upstream, "Origin request timed out");
            metrics::record_upstream_error("timeout");
            metrics::record_request("forward", 504, start_time);
            (StatusCode::GATEWAY_TIMEOUT, "Origin request timed out").into_response()
        }
    }
}
