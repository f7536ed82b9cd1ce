use async_trait::async_trait;

use crate::domain::commit::Commit;
use crate::domain::range::DateRange;
use crate::error::AppResult;

#[derive(Debug, Clone)]
pub struct CommitQuery {
    pub range: DateRange,
    pub branch: Option<String>,
    pub author: Option<String>,
}

impl CommitQuery {
    pub fn new(range: DateRange, branch: Option<String>, author: Option<String>) -> Self {
        Self {
            range,
            branch: branch.filter(|b| !b.trim().is_empty()),
            author: author.filter(|a| !a.trim().is_empty()),
        }
    }
}

/// Produces commits in chronological order, each reported once.
#[async_trait]
pub trait VersionControlService: Send + Sync {
    async fn fetch_commits(&self, query: &CommitQuery) -> AppResult<Vec<Commit>>;
}
