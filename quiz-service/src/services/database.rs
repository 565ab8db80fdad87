//! Quiz lookup by scan offset.
//!
//! There is no sort key: "the Nth quiz" is whatever the store yields Nth in
//! its natural iteration order.

use crate::models::QuizRecord;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::doc, options::FindOptions, Client as MongoClient, Collection,
};
use service_core::error::AppError;

#[async_trait]
pub trait QuizStore: Send + Sync {
    /// Skip `offset` documents and return the next one, if any.
    async fn find_by_offset(&self, offset: u64) -> Result<Option<QuizRecord>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoQuizStore {
    client: MongoClient,
    quizzes: Collection<QuizRecord>,
}

impl MongoQuizStore {
    pub async fn connect(uri: &str, database: &str, collection: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, collection = %collection, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let quizzes = client.database(database).collection(collection);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, quizzes })
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }
}

/// Find options selecting the single document at `offset`.
///
/// The server takes `skip` as a signed 64-bit integer, so offsets above
/// `i64::MAX` cannot name a document and yield `None`.
fn offset_options(offset: u64) -> Option<FindOptions> {
    i64::try_from(offset).ok()?;
    Some(FindOptions::builder().skip(offset).limit(1).build())
}

#[async_trait]
impl QuizStore for MongoQuizStore {
    async fn find_by_offset(&self, offset: u64) -> Result<Option<QuizRecord>, AppError> {
        let Some(options) = offset_options(offset) else {
            tracing::debug!(offset, "Offset beyond any collection size");
            return Ok(None);
        };

        let mut cursor = self.quizzes.find(None, options).await.map_err(|e| {
            tracing::error!(offset, "Quiz lookup failed: {}", e);
            AppError::from(e)
        })?;

        let record = cursor.try_next().await.map_err(|e| {
            tracing::error!(offset, "Failed to read quiz document: {}", e);
            AppError::from(e)
        })?;

        Ok(record)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }
}

/// Fixed, ordered set of quizzes held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQuizStore {
    records: Vec<QuizRecord>,
}

impl InMemoryQuizStore {
    pub fn new(records: Vec<QuizRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl QuizStore for InMemoryQuizStore {
    async fn find_by_offset(&self, offset: u64) -> Result<Option<QuizRecord>, AppError> {
        let record = usize::try_from(offset)
            .ok()
            .and_then(|i| self.records.get(i))
            .cloned();
        Ok(record)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
