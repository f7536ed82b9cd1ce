use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use git2::{BranchType, Oid, Repository, Sort};

use crate::domain::commit::Commit;
use crate::error::{AppError, AppResult};
use crate::services::{CommitQuery, VersionControlService};

/// Reads commits straight out of a repository on disk.
pub struct GitRepository {
    path: PathBuf,
}

impl GitRepository {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl VersionControlService for GitRepository {
    async fn fetch_commits(&self, query: &CommitQuery) -> AppResult<Vec<Commit>> {
        let path = self.path.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || collect_commits(&path, &query))
            .await
            .map_err(|err| AppError::VersionControl(format!("git worker failed: {err}")))?
    }
}

pub fn collect_commits(path: &Path, query: &CommitQuery) -> AppResult<Vec<Commit>> {
    let repo = Repository::discover(path).map_err(|err| {
        AppError::InvalidInput(format!(
            "{} is not a git repository: {}",
            path.display(),
            err.message()
        ))
    })?;

    let tips = branch_tips(&repo, query.branch.as_deref())?;
    tracing::debug!(branches = tips.len(), "walking {}", path.display());

    let mut seen: HashSet<Oid> = HashSet::new();
    let mut commits = Vec::new();

    for (branch, tip) in &tips {
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push(*tip)?;

        for oid in revwalk {
            let oid = oid?;
            if seen.contains(&oid) {
                continue;
            }
            let commit = repo.find_commit(oid)?;
            let timestamp = commit_timestamp(&commit)?;

            // Newest first, so nothing older can follow.
            if timestamp < query.range.start() {
                break;
            }
            if timestamp > query.range.end() {
                continue;
            }

            let mut record = to_record(&commit, branch, timestamp);
            if let Some(author) = query.author.as_deref()
                && !record.authored_by(author)
            {
                continue;
            }
            record.diff_summary = Some(diff_summary(&repo, &commit)?);

            seen.insert(oid);
            commits.push(record);
        }
    }

    commits.sort_by_key(|commit| commit.timestamp);
    tracing::info!("found {} commits in {}", commits.len(), path.display());
    Ok(commits)
}

/// The checked-out branch first, then the rest by name.
fn branch_tips(repo: &Repository, wanted: Option<&str>) -> AppResult<Vec<(String, Oid)>> {
    if let Some(name) = wanted {
        let branch = repo
            .find_branch(name, BranchType::Local)
            .map_err(|_| AppError::InvalidInput(format!("branch '{name}' not found")))?;
        let tip = branch.get().target().ok_or_else(|| {
            AppError::VersionControl(format!("branch '{name}' does not point at a commit"))
        })?;
        return Ok(vec![(name.to_string(), tip)]);
    }

    let current = repo
        .head()
        .ok()
        .filter(|head| head.is_branch())
        .and_then(|head| head.shorthand().map(str::to_string));

    let mut tips = Vec::new();
    for entry in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = entry?;
        let (Some(name), Some(tip)) = (branch.name()?, branch.get().target()) else {
            continue;
        };
        tips.push((name.to_string(), tip));
    }

    tips.sort_by(|(a, _), (b, _)| {
        let a_current = current.as_deref() == Some(a.as_str());
        let b_current = current.as_deref() == Some(b.as_str());
        b_current.cmp(&a_current).then_with(|| a.cmp(b))
    });

    if tips.is_empty()
        && let Ok(head) = repo.head()
        && let Some(oid) = head.target()
    {
        tips.push(("HEAD".to_string(), oid));
    }

    Ok(tips)
}

fn commit_timestamp(commit: &git2::Commit) -> AppResult<DateTime<Utc>> {
    let seconds = commit.time().seconds();
    DateTime::<Utc>::from_timestamp(seconds, 0).ok_or_else(|| {
        AppError::VersionControl(format!(
            "commit {} has an out-of-range timestamp {seconds}",
            commit.id()
        ))
    })
}

fn to_record(commit: &git2::Commit, branch: &str, timestamp: DateTime<Utc>) -> Commit {
    let author = commit.author();
    Commit {
        hash: commit.id().to_string(),
        author_name: String::from_utf8_lossy(author.name_bytes()).into_owned(),
        author_email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
        timestamp,
        message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
        diff_summary: None,
        branch: branch.to_string(),
    }
}

fn diff_summary(repo: &Repository, commit: &git2::Commit) -> AppResult<String> {
    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
    let stats = diff.stats()?;
    Ok(format_stats(
        stats.files_changed(),
        stats.insertions(),
        stats.deletions(),
    ))
}

fn format_stats(files: usize, insertions: usize, deletions: usize) -> String {
    let plural = |n: usize, one: &str, many: &str| {
        if n == 1 {
            format!("{n} {one}")
        } else {
            format!("{n} {many}")
        }
    };
    let mut parts = vec![plural(files, "file changed", "files changed")];
    if insertions > 0 {
        parts.push(plural(insertions, "insertion(+)", "insertions(+)"));
    }
    if deletions > 0 {
        parts.push(plural(deletions, "deletion(-)", "deletions(-)"));
    }
    parts.join(", ")
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::Path;

    use chrono::{DateTime, TimeZone, Utc};
    use git2::{Oid, Repository, RepositoryInitOptions, Signature, Time};

    pub fn init_repo(path: &Path) -> Repository {
        Repository::init_opts(path, RepositoryInitOptions::new().initial_head("main")).unwrap()
    }

    pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    /// Commits a new file named after `message` onto `reference`.
    pub fn commit_on(
        repo: &Repository,
        reference: &str,
        author: &str,
        when: DateTime<Utc>,
        message: &str,
    ) -> Oid {
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(when.timestamp(), 0)).unwrap();

        let file_name = format!("{}.txt", message.to_lowercase().replace(' ', "-"));
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(&file_name), format!("{message}\n")).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(&file_name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let parent = repo
            .find_reference(reference)
            .ok()
            .and_then(|r| r.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some(reference), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Five commits on `main` across 2024-03-04 and 2024-03-05 (UTC).
    pub fn two_day_history(repo: &Repository) -> Oid {
        commit_on(repo, "refs/heads/main", "Ada", at(4, 9), "Add parser");
        commit_on(repo, "refs/heads/main", "Grace", at(4, 12), "Fix lexer");
        commit_on(repo, "refs/heads/main", "Ada", at(4, 17), "Document grammar");
        commit_on(repo, "refs/heads/main", "Grace", at(5, 10), "Speed up lexer");
        commit_on(repo, "refs/heads/main", "Ada", at(5, 15), "Add tests")
    }
}
