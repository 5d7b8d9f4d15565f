//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, rate limiting)
//! - Record every handled request in the event log and metrics
//! - Serve with graceful shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware,
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::auth::Authenticator;
use crate::config::GatewayConfig;
use crate::http::handlers;
use crate::observability::event_log::{EventLog, LogFields};
use crate::observability::metrics;
use crate::security::rate_limit::{client_identifier, rate_limit_middleware, RateLimiter};

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub limiter: Arc<RateLimiter>,
    pub log: Arc<EventLog>,
    pub auth: Arc<dyn Authenticator>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and
    /// collaborators. The rate limiter is owned here; the event log and
    /// authenticator are injected from the composition root.
    pub fn new(config: GatewayConfig, log: Arc<EventLog>, auth: Arc<dyn Authenticator>) -> Self {
        let limiter = Arc::new(RateLimiter::new(
            config.rate_limit.max_requests as usize,
            config.rate_limit.window(),
        ));

        let state = AppState {
            config: Arc::new(config),
            limiter,
            log,
            auth,
        };

        Self {
            router: Self::build_router(state),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        // Only register and login burn quota; logout is session-guarded.
        let guarded = Router::new()
            .route("/api/auth/register", post(handlers::register))
            .route("/api/auth/login", post(handlers::login))
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                rate_limit_middleware,
            ));

        let mut app = Router::new()
            .merge(guarded)
            .route("/api/auth/logout", post(handlers::logout))
            .route("/health", get(handlers::health))
            .with_state(state.clone());

        if state.config.admin.enabled {
            app = app.merge(crate::admin::admin_router(state.clone()));
        }

        let request_timeout = Duration::from_secs(state.config.timeouts.request_secs);
        app.layer(middleware::from_fn_with_state(
            state,
            request_log_middleware,
        ))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Run the server, accepting connections on the given listener until
    /// ctrl-c or a shutdown broadcast.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown_signal() => {}
                    _ = shutdown.recv() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Record every handled request: metrics counter plus an HTTP entry in the
/// event log with request id, client address and user agent.
pub async fn request_log_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let ip = client_identifier(request.headers(), Some(addr));

    let response = next.run(request).await;

    let status = response.status().as_u16();
    metrics::record_request(&method, status, start);
    state.log.log_request(
        &method,
        &path,
        status,
        start.elapsed().as_millis() as u64,
        LogFields {
            request_id,
            ip: Some(ip),
            user_agent,
            ..Default::default()
        },
    );

    response
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; fall back to running until the process dies.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
