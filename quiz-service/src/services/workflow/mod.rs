//! Hosted LLM workflow invocation.
//!
//! A workflow deployment is a named, versioned pipeline run remotely. This
//! service sends it one named string input and reads back one named output.

pub mod mock;
pub mod vellum;

pub use mock::MockWorkflowRunner;
pub use vellum::VellumWorkflowClient;

use async_trait::async_trait;
use thiserror::Error;

/// Name of both the input carrying the quiz reason and the output carrying
/// the explanation.
pub const TEXT_PARAMETER: &str = "text";

/// Transport or protocol failure talking to the workflow service.
///
/// A workflow that ran and rejected the input is not an error here; see
/// [`WorkflowExecution::Rejected`].
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Workflow client not configured: {0}")]
    NotConfigured(String),

    #[error("Workflow API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// One named output of a finished workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutput {
    pub name: String,
    pub value: serde_json::Value,
}

impl WorkflowOutput {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: serde_json::Value::String(value.into()),
        }
    }

    /// String outputs as-is, null as empty, anything else as JSON text.
    pub fn value_as_string(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Terminal state of one workflow execution.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowExecution {
    Fulfilled { outputs: Vec<WorkflowOutput> },
    Rejected { message: String },
}

impl WorkflowExecution {
    /// Value of the output called `name`, if the execution produced one.
    pub fn output(&self, name: &str) -> Option<String> {
        match self {
            WorkflowExecution::Fulfilled { outputs } => outputs
                .iter()
                .find(|o| o.name == name)
                .map(WorkflowOutput::value_as_string),
            WorkflowExecution::Rejected { .. } => None,
        }
    }
}

#[async_trait]
pub trait WorkflowRunner: Send + Sync {
    /// Run the configured deployment with `text` as its only input.
    async fn execute(&self, text: &str) -> Result<WorkflowExecution, WorkflowError>;
}
