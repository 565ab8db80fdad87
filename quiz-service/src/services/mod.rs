pub mod database;
pub mod enrichment;
pub mod metrics;
pub mod workflow;

pub use database::{InMemoryQuizStore, MongoQuizStore, QuizStore};
pub use enrichment::explain;
pub use metrics::{get_metrics, init_metrics};
pub use workflow::{WorkflowError, WorkflowExecution, WorkflowOutput, WorkflowRunner};
