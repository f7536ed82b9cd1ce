use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};

use crate::domain::commit::Commit;

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(50) {
    Some(size) => size,
    None => unreachable!(),
};

/// Commits by one author on one branch, sent to the model in a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    pub branch: String,
    pub author: String,
    pub commits: Vec<Commit>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Earliest and latest commit timestamps.
    pub fn period(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first = self.commits.iter().map(|c| c.timestamp).min()?;
        let last = self.commits.iter().map(|c| c.timestamp).max()?;
        Some((first, last))
    }
}

/// Splits `items` into consecutive chunks of `size`; only the last may be shorter.
pub fn chunk<T>(items: Vec<T>, size: NonZeroUsize) -> Vec<Vec<T>> {
    let size = size.get();
    let mut chunks = Vec::with_capacity(items.len().div_ceil(size));
    let mut current = Vec::with_capacity(size.min(items.len()));
    for item in items {
        current.push(item);
        if current.len() == size {
            chunks.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Groups commits by (branch, author) in order of first appearance, then
/// chunks each group.
pub fn plan_batches(commits: Vec<Commit>, size: NonZeroUsize) -> Vec<Batch> {
    let mut groups: Vec<(String, String, Vec<Commit>)> = Vec::new();
    for commit in commits {
        match groups
            .iter_mut()
            .find(|(branch, author, _)| *branch == commit.branch && *author == commit.author_name)
        {
            Some((_, _, members)) => members.push(commit),
            None => groups.push((
                commit.branch.clone(),
                commit.author_name.clone(),
                vec![commit],
            )),
        }
    }

    groups
        .into_iter()
        .flat_map(|(branch, author, members)| {
            chunk(members, size)
                .into_iter()
                .map(move |commits| Batch {
                    branch: branch.clone(),
                    author: author.clone(),
                    commits,
                })
        })
        .collect()
}
