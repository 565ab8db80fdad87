// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use quiz_service::config::{
    CorsConfig, MongoConfig, ObservabilityConfig, QuizConfig, WorkflowConfig,
};
use quiz_service::models::QuizRecord;
use quiz_service::services::{
    InMemoryQuizStore, QuizStore, WorkflowError, WorkflowExecution, WorkflowOutput,
    WorkflowRunner,
};
use quiz_service::{build_router, AppState, Application};
use secrecy::Secret;
use serde_json::Value;
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::Notify;
use tower::ServiceExt;

pub const FRONTEND_ORIGIN: &str = "http://localhost:3000";

/// `count` quizzes named `Question {i}` with alternating answers.
pub fn sample_quizzes(count: usize) -> Vec<QuizRecord> {
    (0..count)
        .map(|i| {
            QuizRecord::new(
                format!("Question {}", i),
                if i % 2 == 0 { "real" } else { "fake" },
                format!("Reason {}", i),
            )
        })
        .collect()
}

pub fn router_with(
    store: Arc<dyn QuizStore>,
    workflow: Option<Arc<dyn WorkflowRunner>>,
) -> Router {
    build_router(
        AppState { store, workflow },
        &[FRONTEND_ORIGIN.to_string()],
    )
    .expect("Failed to build router")
}

pub fn router(records: Vec<QuizRecord>, workflow: Option<Arc<dyn WorkflowRunner>>) -> Router {
    router_with(Arc::new(InMemoryQuizStore::new(records)), workflow)
}

/// Issue a GET and decode the body as JSON (`Value::Null` if it is not JSON).
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

/// Store whose every call fails like an unreachable database.
pub struct FailingStore;

#[async_trait]
impl QuizStore for FailingStore {
    async fn find_by_offset(&self, _offset: u64) -> Result<Option<QuizRecord>, AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "server selection timeout"
        )))
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Err(AppError::DatabaseError(anyhow::anyhow!(
            "server selection timeout"
        )))
    }
}

/// Runner that holds calls for `gated_text` until [`GatedRunner::release`];
/// every other input is answered immediately.
pub struct GatedRunner {
    gated_text: String,
    started: Notify,
    gate: Notify,
}

impl GatedRunner {
    pub fn new(gated_text: impl Into<String>) -> Self {
        Self {
            gated_text: gated_text.into(),
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub async fn wait_until_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl WorkflowRunner for GatedRunner {
    async fn execute(&self, text: &str) -> Result<WorkflowExecution, WorkflowError> {
        if text == self.gated_text {
            self.started.notify_one();
            self.gate.notified().await;
        }

        Ok(WorkflowExecution::Fulfilled {
            outputs: vec![WorkflowOutput::text("text", format!("explained: {}", text))],
        })
    }
}

pub fn test_config(workflow_base_url: Option<String>) -> QuizConfig {
    QuizConfig {
        common: service_core::config::Config { port: 0 },
        mongodb: MongoConfig {
            uri: Secret::new("mongodb://localhost:27017".to_string()),
            database: "quizdb".to_string(),
            collection: "quizzes".to_string(),
        },
        workflow: WorkflowConfig {
            api_key: workflow_base_url
                .as_ref()
                .map(|_| Secret::new("test-api-key".to_string())),
            base_url: workflow_base_url.unwrap_or_else(|| "http://127.0.0.1:9".to_string()),
            deployment_name: "prompting".to_string(),
            release_tag: "LATEST".to_string(),
            timeout_secs: 5,
        },
        cors: CorsConfig {
            allowed_origins: vec![FRONTEND_ORIGIN.to_string()],
        },
        observability: ObservabilityConfig {
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
}

impl TestApp {
    /// Serve the full application on a random port over an in-memory store.
    pub async fn spawn(records: Vec<QuizRecord>, workflow_base_url: Option<String>) -> Self {
        let app = Application::build_with_store(
            test_config(workflow_base_url),
            Arc::new(InMemoryQuizStore::new(records)),
        )
        .await
        .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp { address, port }
    }
}
