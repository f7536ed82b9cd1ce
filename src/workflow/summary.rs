use crate::context::AppContext;
use crate::domain::batch::plan_batches;
use crate::domain::summary::{BatchSummary, SummaryReport};
use crate::error::{AppError, AppResult};
use crate::services::CommitQuery;

pub struct SummaryRequest {
    pub repository: String,
    pub query: CommitQuery,
}

/// Fetch, batch, then summarize each batch in order.
///
/// A batch the model fails on becomes a failed section and the run goes on.
/// Authentication and configuration errors abort, since every later batch
/// would fail the same way.
pub async fn summarize_repository(
    ctx: &AppContext,
    request: SummaryRequest,
) -> AppResult<SummaryReport> {
    let commits = ctx.version_control.fetch_commits(&request.query).await?;
    let batches = plan_batches(commits, ctx.config.batch_size);
    tracing::info!(batches = batches.len(), "summarizing {}", request.repository);

    let mut sections = Vec::with_capacity(batches.len());
    for (index, batch) in batches.iter().enumerate() {
        tracing::debug!(
            "batch {}/{}: {} commits by {} on {}",
            index + 1,
            batches.len(),
            batch.len(),
            batch.author,
            batch.branch
        );
        let section = match ctx.language_model.summarize_batch(batch).await {
            Ok(text) if !text.trim().is_empty() => BatchSummary::new(batch, text),
            Ok(_) => BatchSummary::failed(batch, "empty response".to_string()),
            Err(err @ (AppError::Authentication(_) | AppError::Configuration(_))) => {
                return Err(err);
            }
            Err(err) => BatchSummary::failed(batch, err.to_string()),
        };
        if section.is_failed() {
            tracing::warn!(
                "failed to summarize {} commits by {} on {}",
                batch.len(),
                batch.author,
                batch.branch
            );
        }
        sections.push(section);
    }

    let CommitQuery {
        range,
        branch,
        author,
    } = request.query;
    Ok(SummaryReport {
        repository: request.repository,
        range,
        branch,
        author,
        sections,
    })
}
