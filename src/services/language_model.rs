use async_trait::async_trait;

use crate::domain::batch::Batch;
use crate::error::AppResult;

#[async_trait]
pub trait LanguageModelService: Send + Sync {
    /// Returns the generated Markdown for one batch.
    async fn summarize_batch(&self, batch: &Batch) -> AppResult<String>;
}
