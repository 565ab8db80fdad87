//! Quiz enrichment: turn a stored reason into an LLM explanation.

use super::workflow::{WorkflowExecution, WorkflowRunner, TEXT_PARAMETER};
use metrics::{counter, histogram};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Run the workflow on `reason` and return its `text` output.
///
/// The call runs as its own task so a slow workflow never holds up other
/// requests; this future just waits on the join handle. A missing `text`
/// output yields an empty string. A rejected execution becomes
/// [`AppError::WorkflowRejected`]; everything else is an internal error.
pub async fn explain(runner: Arc<dyn WorkflowRunner>, reason: String) -> Result<String, AppError> {
    let started = Instant::now();

    let result = tokio::spawn(
        async move { runner.execute(&reason).await }.instrument(tracing::Span::current()),
    )
    .await;

    histogram!("quiz_workflow_duration_seconds").record(started.elapsed().as_secs_f64());

    let execution = match result {
        Ok(Ok(execution)) => execution,
        Ok(Err(e)) => {
            counter!("quiz_workflow_invocations_total", "outcome" => "error").increment(1);
            tracing::error!(error = %e, "Workflow invocation failed");
            return Err(AppError::InternalError(
                anyhow::Error::new(e).context("workflow invocation failed"),
            ));
        }
        Err(join_error) => {
            counter!("quiz_workflow_invocations_total", "outcome" => "error").increment(1);
            tracing::error!(error = %join_error, "Workflow task did not complete");
            return Err(AppError::InternalError(
                anyhow::Error::new(join_error).context("workflow task did not complete"),
            ));
        }
    };

    match execution {
        WorkflowExecution::Rejected { message } => {
            counter!("quiz_workflow_invocations_total", "outcome" => "rejected").increment(1);
            tracing::warn!(error = %message, "Workflow execution rejected");
            Err(AppError::WorkflowRejected(message))
        }
        fulfilled @ WorkflowExecution::Fulfilled { .. } => {
            counter!("quiz_workflow_invocations_total", "outcome" => "fulfilled").increment(1);
            let text = fulfilled.output(TEXT_PARAMETER).unwrap_or_else(|| {
                tracing::warn!("Workflow produced no text output");
                String::new()
            });
            Ok(text)
        }
    }
}
