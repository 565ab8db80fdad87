pub mod health;
pub mod quiz;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use quiz::{get_quiz, get_quiz_llm_output};
