//! Scripted workflow runner for tests.

use super::{WorkflowError, WorkflowExecution, WorkflowOutput, WorkflowRunner, TEXT_PARAMETER};
use async_trait::async_trait;
use std::sync::Mutex;

enum Script {
    Execution(WorkflowExecution),
    Error(String),
}

/// Returns the same scripted result for every call and records each input.
pub struct MockWorkflowRunner {
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl MockWorkflowRunner {
    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fulfils with a single `text` output.
    pub fn fulfilled(text: impl Into<String>) -> Self {
        Self::with_outputs(vec![WorkflowOutput::text(TEXT_PARAMETER, text)])
    }

    pub fn with_outputs(outputs: Vec<WorkflowOutput>) -> Self {
        Self::with_script(Script::Execution(WorkflowExecution::Fulfilled { outputs }))
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::with_script(Script::Execution(WorkflowExecution::Rejected {
            message: message.into(),
        }))
    }

    /// Fails every call with a network error.
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::with_script(Script::Error(message.into()))
    }

    /// Inputs received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl WorkflowRunner for MockWorkflowRunner {
    async fn execute(&self, text: &str) -> Result<WorkflowExecution, WorkflowError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }

        match &self.script {
            Script::Execution(execution) => Ok(execution.clone()),
            Script::Error(message) => Err(WorkflowError::Network(message.clone())),
        }
    }
}
