use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use git2::{Cred, FetchOptions, RemoteCallbacks, Repository};

use crate::domain::commit::Commit;
use crate::error::{AppError, AppResult};
use crate::infra::git::collect_commits;
use crate::services::{CommitQuery, VersionControlService};

const MIRROR_REFSPEC: &str = "+refs/heads/*:refs/heads/*";
const SECONDS_PER_DAY: u64 = 86_400;

/// Clones a remote into a local cache as a bare mirror and reads it there.
#[derive(Clone)]
pub struct RemoteMirror {
    url: String,
    cache_root: PathBuf,
    max_age: Duration,
}

impl RemoteMirror {
    pub fn new(url: String, cache_root: PathBuf, cache_duration_days: u64) -> Self {
        Self {
            url,
            cache_root,
            max_age: Duration::from_secs(cache_duration_days.saturating_mul(SECONDS_PER_DAY)),
        }
    }

    pub fn mirror_path(&self) -> PathBuf {
        self.cache_root.join(cache_key(&self.url))
    }

    fn ensure_mirror(&self) -> AppResult<PathBuf> {
        let path = self.mirror_path();
        if path.exists() {
            if is_fresh(&path, self.max_age) && Repository::open_bare(&path).is_ok() {
                tracing::info!("using cached clone at {}", path.display());
                return Ok(path);
            }
            tracing::info!("cached clone at {} expired, removing", path.display());
            fs::remove_dir_all(&path)?;
        }

        fs::create_dir_all(&self.cache_root)?;
        tracing::info!("cloning {} into {}", self.url, path.display());
        if let Err(err) = clone_mirror(&self.url, &path) {
            let _ = fs::remove_dir_all(&path);
            return Err(err);
        }
        Ok(path)
    }
}

#[async_trait]
impl VersionControlService for RemoteMirror {
    async fn fetch_commits(&self, query: &CommitQuery) -> AppResult<Vec<Commit>> {
        let mirror = self.clone();
        let query = query.clone();
        tokio::task::spawn_blocking(move || {
            let path = mirror.ensure_mirror()?;
            collect_commits(&path, &query)
        })
        .await
        .map_err(|err| AppError::VersionControl(format!("git worker failed: {err}")))?
    }
}

fn clone_mirror(url: &str, path: &Path) -> AppResult<()> {
    let repo = Repository::init_bare(path)?;
    let mut remote = repo.remote("origin", url)?;

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username, _allowed| {
        Cred::ssh_key_from_agent(username.unwrap_or("git"))
    });
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);

    remote
        .fetch(&[MIRROR_REFSPEC], Some(&mut options), None)
        .map_err(|err| {
            AppError::VersionControl(format!("failed to clone {url}: {}", err.message()))
        })?;
    tracing::debug!("cloned {url} into {}", path.display());
    Ok(())
}

fn is_fresh(path: &Path, max_age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age < max_age)
}

/// Readable and collision-free: `<slug>-<hash prefix>`.
fn cache_key(url: &str) -> String {
    let name = url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(url)
        .trim_end_matches(".git");
    let digest = blake3::hash(url.as_bytes()).to_hex();
    format!("{}-{}", slugify(name), &digest[..12])
}

fn slugify(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut prev_dash = true;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            result.push('-');
            prev_dash = true;
        }
    }
    let trimmed = result.trim_end_matches('-');
    if trimmed.is_empty() {
        "repo".to_string()
    } else {
        trimmed.to_string()
    }
}
