//! VellumWorkflowClient against a local stub of the execute-workflow API.

mod common;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use common::{sample_quizzes, test_config, TestApp};
use quiz_service::services::workflow::VellumWorkflowClient;
use quiz_service::services::{WorkflowError, WorkflowExecution, WorkflowRunner};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// API key header and JSON body of each request the stub saw.
type Received = Arc<Mutex<Vec<(Option<String>, Value)>>>;

#[derive(Clone)]
struct Stub {
    status: StatusCode,
    reply: Value,
    received: Received,
}

async fn execute_workflow(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let api_key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.received.lock().unwrap().push((api_key, body));
    (stub.status, Json(stub.reply.clone()))
}

/// Start the stub and return its base URL plus the log of received requests.
async fn spawn_stub(status: StatusCode, reply: Value) -> (String, Received) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let stub = Stub {
        status,
        reply,
        received: received.clone(),
    };
    let app = Router::new()
        .route("/v1/execute-workflow", post(execute_workflow))
        .with_state(stub);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    (format!("http://{}", addr), received)
}

fn client_for(base_url: &str) -> VellumWorkflowClient {
    let config = test_config(Some(base_url.to_string()));
    VellumWorkflowClient::new(&config.workflow, Secret::new("test-api-key".to_string()))
        .expect("Failed to build workflow client")
}

#[tokio::test]
async fn sends_deployment_and_text_input() {
    let (base_url, received) = spawn_stub(
        StatusCode::OK,
        json!({
            "execution_id": "exec-1",
            "data": {
                "state": "FULFILLED",
                "outputs": [{"id": "o1", "type": "STRING", "name": "text", "value": "Explanation..."}]
            }
        }),
    )
    .await;

    let execution = client_for(&base_url)
        .execute("Because light bends")
        .await
        .expect("workflow call failed");

    assert_eq!(execution.output("text").as_deref(), Some("Explanation..."));

    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    let (api_key, body) = &received[0];
    assert_eq!(api_key.as_deref(), Some("test-api-key"));
    assert_eq!(body["workflow_deployment_name"], "prompting");
    assert_eq!(body["release_tag"], "LATEST");
    assert_eq!(
        body["inputs"],
        json!([{"type": "STRING", "name": "text", "value": "Because light bends"}])
    );
}

#[tokio::test]
async fn rejected_state_is_not_a_client_error() {
    let (base_url, _) = spawn_stub(
        StatusCode::OK,
        json!({
            "execution_id": "exec-2",
            "data": {"state": "REJECTED", "error": {"message": "Workflow failed", "code": "WORKFLOW_ERROR"}}
        }),
    )
    .await;

    let execution = client_for(&base_url).execute("r").await.unwrap();

    assert_eq!(
        execution,
        WorkflowExecution::Rejected {
            message: "Workflow failed".to_string()
        }
    );
}

#[tokio::test]
async fn non_success_status_is_api_error() {
    let (base_url, _) = spawn_stub(
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Invalid API key"}),
    )
    .await;

    let err = client_for(&base_url).execute("r").await.unwrap_err();

    match err {
        WorkflowError::Api(message) => {
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API key"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn unexpected_body_is_api_error() {
    let (base_url, _) = spawn_stub(StatusCode::OK, json!({"unexpected": true})).await;

    let err = client_for(&base_url).execute("r").await.unwrap_err();

    assert!(matches!(err, WorkflowError::Api(_)));
}

#[tokio::test]
async fn unreachable_service_is_network_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client_for(&format!("http://{}", addr))
        .execute("r")
        .await
        .unwrap_err();

    assert!(matches!(err, WorkflowError::Network(_)));
}

#[tokio::test]
async fn application_enriches_through_real_client() {
    let (base_url, received) = spawn_stub(
        StatusCode::OK,
        json!({
            "data": {
                "state": "FULFILLED",
                "outputs": [{"type": "STRING", "name": "text", "value": "Light slows down in water."}]
            }
        }),
    )
    .await;
    let app = TestApp::spawn(sample_quizzes(5), Some(base_url)).await;

    let response = reqwest::get(format!("{}/quiz/2", app.address))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["question"], "Question 2");
    assert_eq!(body["llm_output"], "Light slows down in water.");

    let received = received.lock().unwrap();
    assert_eq!(received[0].1["inputs"][0]["value"], "Reason 2");
}

#[tokio::test]
async fn application_surfaces_rejection_as_500() {
    let (base_url, _) = spawn_stub(
        StatusCode::OK,
        json!({"data": {"state": "REJECTED", "error": {"message": "Prompt blocked"}}}),
    )
    .await;
    let app = TestApp::spawn(sample_quizzes(1), Some(base_url)).await;

    let response = reqwest::get(format!("{}/quiz/0", app.address))
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Prompt blocked"));
    assert!(body.get("question").is_none());
}
