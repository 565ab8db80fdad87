//! Vellum workflow deployment client.
//!
//! Calls `POST {base_url}/v1/execute-workflow` and maps the terminal
//! execution state onto [`WorkflowExecution`].

use super::{WorkflowError, WorkflowExecution, WorkflowOutput, WorkflowRunner, TEXT_PARAMETER};
use crate::config::WorkflowConfig;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::Duration;

const API_KEY_HEADER: &str = "X-API-KEY";

pub struct VellumWorkflowClient {
    client: Client,
    api_key: Secret<String>,
    endpoint: String,
    deployment_name: String,
    release_tag: String,
}

impl VellumWorkflowClient {
    pub fn new(config: &WorkflowConfig, api_key: Secret<String>) -> Result<Self, WorkflowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WorkflowError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/v1/execute-workflow", config.base_url.trim_end_matches('/')),
            deployment_name: config.deployment_name.clone(),
            release_tag: config.release_tag.clone(),
        })
    }

    fn request_body<'a>(&'a self, text: &'a str) -> ExecuteWorkflowRequest<'a> {
        ExecuteWorkflowRequest {
            workflow_deployment_name: &self.deployment_name,
            release_tag: &self.release_tag,
            inputs: vec![WorkflowInput {
                kind: "STRING",
                name: TEXT_PARAMETER,
                value: text,
            }],
        }
    }
}

#[async_trait]
impl WorkflowRunner for VellumWorkflowClient {
    async fn execute(&self, text: &str) -> Result<WorkflowExecution, WorkflowError> {
        tracing::debug!(
            deployment = %self.deployment_name,
            release_tag = %self.release_tag,
            input_len = text.len(),
            "Executing workflow"
        );

        let response = self
            .client
            .traced_post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| WorkflowError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(WorkflowError::Api(format!(
                "workflow service returned {}: {}",
                status, error_text
            )));
        }

        let body: ExecuteWorkflowResponse = response
            .json()
            .await
            .map_err(|e| WorkflowError::Api(format!("Failed to parse response: {}", e)))?;

        tracing::debug!(
            execution_id = body.execution_id.as_deref().unwrap_or("-"),
            "Workflow execution finished"
        );

        Ok(body.data.into())
    }
}

#[derive(Debug, Serialize)]
struct ExecuteWorkflowRequest<'a> {
    workflow_deployment_name: &'a str,
    release_tag: &'a str,
    inputs: Vec<WorkflowInput<'a>>,
}

#[derive(Debug, Serialize)]
struct WorkflowInput<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'static str,
    value: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExecuteWorkflowResponse {
    #[serde(default)]
    execution_id: Option<String>,
    data: ExecutionData,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
enum ExecutionData {
    Fulfilled {
        #[serde(default)]
        outputs: Vec<OutputValue>,
    },
    Rejected {
        error: ExecutionError,
    },
}

#[derive(Debug, Deserialize)]
struct OutputValue {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ExecutionError {
    message: String,
}

impl From<ExecutionData> for WorkflowExecution {
    fn from(data: ExecutionData) -> Self {
        match data {
            ExecutionData::Fulfilled { outputs } => WorkflowExecution::Fulfilled {
                outputs: outputs
                    .into_iter()
                    .map(|o| WorkflowOutput {
                        name: o.name,
                        value: o.value,
                    })
                    .collect(),
            },
            ExecutionData::Rejected { error } => WorkflowExecution::Rejected {
                message: error.message,
            },
        }
    }
}
