pub mod quiz;

pub use quiz::{LlmOutputResponse, QuizRecord, QuizResponse};
