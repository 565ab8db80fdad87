use serde::{Deserialize, Deserializer, Serialize};

/// A quiz document as stored in the `quizzes` collection.
///
/// Records have no stable key; they are addressed by scan offset. Missing
/// or null fields read as empty strings and unknown fields (including `_id`)
/// are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizRecord {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub question: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub answer: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub reason: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl QuizRecord {
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            reason: reason.into(),
        }
    }
}

/// Body of `GET /quiz/{index}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub question: String,
    pub answer: String,
    pub reason: String,
    /// Present only when enrichment is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_output: Option<String>,
}

impl QuizResponse {
    pub fn new(record: QuizRecord, llm_output: Option<String>) -> Self {
        Self {
            question: record.question,
            answer: record.answer,
            reason: record.reason,
            llm_output,
        }
    }
}

/// Body of `GET /quiz/{index}/llm`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmOutputResponse {
    pub llm_output: String,
}
