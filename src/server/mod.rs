//! HTTP server exposing the key-value API

mod handler;
mod response;

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::health::{HealthState, health_routes};
use crate::metrics::Metrics;
use crate::service::{KvStoreService, RequestContext};
use crate::storage::Storer;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Response;
use axum::routing::{delete, get, post, put};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

/// Prefix of every key-value route
pub const API_V1_PREFIX: &str = "/api/v1";

/// State shared by the key-value handlers
pub struct AppState {
    pub(crate) service: KvStoreService,
    pub(crate) metrics: Arc<Metrics>,
    pub(crate) config: ServerConfig,
    pub(crate) shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: ServerConfig,
        service: KvStoreService,
        metrics: Arc<Metrics>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            metrics,
            config,
            shutdown,
        }
    }

    /// Fresh context for one request, cancelled on shutdown
    fn request_context(&self) -> RequestContext {
        RequestContext::child_of(&self.shutdown, self.config.request_timeout())
    }

    fn error_response(&self, operation: &'static str, err: &ServiceError) -> Response {
        self.metrics.record_error(err.kind());
        response::service_error(operation, err, self.config.gateway_timeout_on_deadline)
    }
}

/// Key-value routes, each reachable with and without a trailing slash
fn kv_routes(state: Arc<AppState>) -> Router {
    let body_limit = match state.config.max_body_bytes {
        0 => DefaultBodyLimit::disable(),
        limit => DefaultBodyLimit::max(limit),
    };

    let endpoints = [
        ("/set", post(handler::set)),
        ("/get", get(handler::get)),
        ("/update", put(handler::update)),
        ("/delete", delete(handler::delete)),
        ("/list", get(handler::list)),
    ];

    endpoints
        .into_iter()
        .fold(Router::new(), |router, (path, endpoint)| {
            let endpoint = endpoint.fallback(handler::method_not_allowed);
            router
                .route(path, endpoint.clone())
                .route(&format!("{path}/"), endpoint)
        })
        .layer(body_limit)
        .with_state(state)
}

/// Full application router: health, metrics and `/api/v1`
pub fn router(state: Arc<AppState>, health: Arc<HealthState>) -> Router {
    Router::new()
        .merge(health_routes(health))
        .nest(API_V1_PREFIX, kv_routes(state))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Main server struct
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    health: Arc<HealthState>,
    cancel_token: CancellationToken,
}

impl Server {
    /// Create a new server
    pub fn new(
        config: ServerConfig,
        storage: Arc<dyn Storer>,
        metrics: Arc<Metrics>,
        health: Arc<HealthState>,
        cancel_token: CancellationToken,
    ) -> Self {
        metrics
            .entries
            .set(i64::try_from(storage.len()).unwrap_or(i64::MAX));
        let state = Arc::new(AppState::new(
            config.clone(),
            KvStoreService::new(storage),
            metrics,
            cancel_token.clone(),
        ));

        Self {
            config,
            state,
            health,
            cancel_token,
        }
    }

    /// Build the router serving this server's state
    pub fn router(&self) -> Router {
        router(Arc::clone(&self.state), Arc::clone(&self.health))
    }

    /// Run the server until the cancel token fires
    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        info!(listening = %addr, env = %self.config.server_env, "Starting api server");

        self.health.set_ready(true);

        let token = self.cancel_token.clone();
        let serve = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await });
        let mut serve = std::pin::pin!(serve.into_future());

        tokio::select! {
            biased;

            () = self.cancel_token.cancelled() => {
                self.health.set_ready(false);
                info!("Starting shutdown");
                let timeout = self.config.shutdown_timeout();
                match tokio::time::timeout(timeout, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => warn!("Could not stop server gracefully within {:?}", timeout),
                }
            }
            result = &mut serve => {
                self.health.set_ready(false);
                result?;
            }
        }

        info!("Shutdown completed");
        Ok(())
    }
}
