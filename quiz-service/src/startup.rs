//! Application startup and lifecycle management.

use crate::config::QuizConfig;
use crate::handlers;
use crate::services::workflow::VellumWorkflowClient;
use crate::services::{MongoQuizStore, QuizStore, WorkflowRunner};
use axum::{
    http::{HeaderValue, Request},
    middleware::from_fn,
    routing::get,
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics_middleware, request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state. Built once at startup; cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn QuizStore>,
    /// `None` disables enrichment.
    pub workflow: Option<Arc<dyn WorkflowRunner>>,
}

/// Build the HTTP router with CORS restricted to `allowed_origins`.
pub fn build_router(state: AppState, allowed_origins: &[String]) -> Result<Router, AppError> {
    let origins = allowed_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>().map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Credentials rule out `*`, so methods and headers are mirrored instead.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/quiz/:index", get(handlers::get_quiz))
        .route("/quiz/:index/llm", get(handlers::get_quiz_llm_output))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state);

    Ok(router)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Connect downstream clients, build the router and bind the listener.
    ///
    /// Port 0 binds a random port, which tests rely on.
    pub async fn build(config: QuizConfig) -> Result<Self, AppError> {
        let store = MongoQuizStore::connect(
            config.mongodb.uri.expose_secret(),
            &config.mongodb.database,
            &config.mongodb.collection,
        )
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            e
        })?;

        Self::build_with_store(config, Arc::new(store)).await
    }

    /// Like [`Application::build`] but with a caller-supplied store.
    pub async fn build_with_store(
        config: QuizConfig,
        store: Arc<dyn QuizStore>,
    ) -> Result<Self, AppError> {
        let workflow: Option<Arc<dyn WorkflowRunner>> = match &config.workflow.api_key {
            Some(api_key) => {
                let client = VellumWorkflowClient::new(&config.workflow, api_key.clone())
                    .map_err(|e| AppError::ConfigError(anyhow::Error::new(e)))?;
                tracing::info!(
                    deployment = %config.workflow.deployment_name,
                    release_tag = %config.workflow.release_tag,
                    "Initialized workflow client"
                );
                let client: Arc<dyn WorkflowRunner> = Arc::new(client);
                Some(client)
            }
            None => {
                tracing::warn!("VELLUM_API_KEY not set - quiz enrichment disabled");
                None
            }
        };

        let state = AppState { store, workflow };
        let router = build_router(state, &config.cors.allowed_origins)?;

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Quiz service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
