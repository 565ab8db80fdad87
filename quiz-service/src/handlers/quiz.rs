//! `GET /quiz/{index}` and `GET /quiz/{index}/llm`.
//!
//! Failures are logged here and rendered by [`AppError`]; no handler ever
//! returns a partially enriched quiz.

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use service_core::error::AppError;

use crate::{
    models::{LlmOutputResponse, QuizRecord, QuizResponse},
    services::explain,
    AppState,
};

/// Fetch the quiz at `index`, enriched with `llm_output` when a workflow
/// runner is configured.
pub async fn get_quiz(
    State(state): State<AppState>,
    index: Result<Path<u64>, PathRejection>,
) -> Result<Json<QuizResponse>, AppError> {
    let index = parse_index(index)?;
    tracing::info!(index, "Fetching quiz");

    let record = find_quiz(&state, index).await?;

    let llm_output = match &state.workflow {
        Some(runner) => Some(
            explain(runner.clone(), record.reason.clone())
                .await
                .inspect_err(|e| log_failure(index, e))?,
        ),
        None => None,
    };

    Ok(Json(QuizResponse::new(record, llm_output)))
}

/// Only the LLM explanation for the quiz at `index`.
pub async fn get_quiz_llm_output(
    State(state): State<AppState>,
    index: Result<Path<u64>, PathRejection>,
) -> Result<Json<LlmOutputResponse>, AppError> {
    let index = parse_index(index)?;

    let Some(runner) = state.workflow.clone() else {
        return Err(AppError::ServiceUnavailable(
            "LLM enrichment is not configured".to_string(),
        ));
    };

    tracing::info!(index, "Fetching quiz explanation");

    let record = find_quiz(&state, index).await?;
    let llm_output = explain(runner, record.reason)
        .await
        .inspect_err(|e| log_failure(index, e))?;

    Ok(Json(LlmOutputResponse { llm_output }))
}

fn parse_index(index: Result<Path<u64>, PathRejection>) -> Result<u64, AppError> {
    index
        .map(|Path(index)| index)
        .map_err(|rejection| AppError::BadRequest(anyhow::anyhow!(rejection.body_text())))
}

async fn find_quiz(state: &AppState, index: u64) -> Result<QuizRecord, AppError> {
    state
        .store
        .find_by_offset(index)
        .await
        .inspect_err(|e| log_failure(index, e))?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("No quiz found at index {}", index)))
}

fn log_failure(index: u64, err: &AppError) {
    if err.status_code().is_server_error() {
        tracing::error!(index, error = ?err, "Quiz request failed");
    }
}
