use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::cors::build_cors_layer;
use crate::dedup::DuplicateSuppressor;
use crate::ratelimit::SlidingWindow;
use crate::routes;
use crate::signature::{HmacSha256Verifier, NoVerification, SignatureVerifier};
use crate::store::{EventStore, StoreLimits};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Shared state for the two pipelines.
///
/// Every mutable structure is explicitly owned here and injected into the
/// handlers, so tests construct isolated instances with their own clock
/// instead of touching process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub verifier: Arc<dyn SignatureVerifier>,
    pub submission_limiter: Arc<SlidingWindow>,
    pub retrieval_limiter: Arc<SlidingWindow>,
    pub duplicates: Arc<DuplicateSuppressor>,
    pub store: Arc<EventStore>,
}

impl AppState {
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Self {
        let verifier: Arc<dyn SignatureVerifier> = match config.webhook.secret.as_deref() {
            Some(secret) => Arc::new(HmacSha256Verifier::new(secret.as_bytes().to_vec())),
            None => Arc::new(NoVerification),
        };

        let submission_limiter = Arc::new(SlidingWindow::new(
            config.submission_limit.clone(),
            clock.clone(),
        ));
        let retrieval_limiter = Arc::new(SlidingWindow::new(
            config.retrieval_limit.clone(),
            clock.clone(),
        ));
        let duplicates = Arc::new(DuplicateSuppressor::new(
            config.dedup.window_millis(),
            clock.clone(),
        ));
        let store = Arc::new(EventStore::new(
            StoreLimits {
                capacity: config.store.capacity,
                ttl_millis: config.store.ttl_millis(),
            },
            clock.clone(),
        ));

        Self {
            config: Arc::new(config),
            clock,
            verifier,
            submission_limiter,
            retrieval_limiter,
            duplicates,
            store,
        }
    }
}

/// Main application structure.
pub struct App {
    router: Router,
    config: Config,
}

impl App {
    /// Create an app with the provided configuration and the system clock.
    pub fn with_config(config: Config) -> Self {
        Self::with_config_and_clock(config, Arc::new(SystemClock))
    }

    /// Create an app with an injected clock. Tests use this with a
    /// [`crate::clock::ManualClock`] to drive expiry deterministically.
    pub fn with_config_and_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        let state = AppState::new(config.clone(), clock);
        let router = Self::build_router(state, &config);
        Self { router, config }
    }

    fn build_router(state: AppState, config: &Config) -> Router {
        Router::new()
            .route("/webhook/donation", post(routes::submit_donation))
            .route("/donations", get(routes::fetch_donations))
            .route("/health", get(routes::health))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.server.max_body_size))
            .layer(build_cors_layer())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
    }

    /// Extract the router for in-process testing without a server.
    pub fn into_test_router(self) -> Router {
        self.router
    }

    /// Start the server and run until a shutdown signal arrives.
    pub async fn serve(self) -> Result<(), std::io::Error> {
        let addr = self
            .config
            .server
            .addr()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

        let listener = tokio::net::TcpListener::bind(addr).await?;

        tracing::info!("Donation bridge listening on http://{}", addr);
        if self.config.webhook.secret.is_none() {
            tracing::warn!("no webhook secret configured - signature verification is disabled");
        }

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
    }
}

/// Middleware for adding a request ID to all requests.
#[derive(Clone, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let request_id = Uuid::new_v4().to_string().parse().ok()?;
        Some(RequestId::new(request_id))
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give in-flight requests a grace period to finish.
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracing::info!("Shutdown complete");
}
