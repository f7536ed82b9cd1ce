use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const GITHUB_PREFIXES: [&str; 3] = [
    "https://github.com/",
    "http://github.com/",
    "git@github.com:",
];
const GITLAB_PREFIXES: [&str; 3] = [
    "https://gitlab.com/",
    "http://gitlab.com/",
    "git@gitlab.com:",
];
const REMOTE_PREFIXES: [&str; 3] = ["https://", "http://", "git@"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryLocation {
    Local(PathBuf),
    GitHub { owner: String, repo: String },
    GitLab(String),
    Remote(String),
}

impl RepositoryLocation {
    pub fn parse(input: &str) -> AppResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput(
                "repository path or URL is required".to_string(),
            ));
        }

        if let Some(rest) = strip_any(trimmed, &GITHUB_PREFIXES) {
            let (owner, repo) = owner_and_repo(rest).ok_or_else(|| {
                AppError::InvalidInput(format!("invalid GitHub repository link: {trimmed}"))
            })?;
            return Ok(Self::GitHub { owner, repo });
        }
        if strip_any(trimmed, &GITLAB_PREFIXES).is_some() {
            return Ok(Self::GitLab(trimmed.to_string()));
        }
        if strip_any(trimmed, &REMOTE_PREFIXES).is_some() {
            return Ok(Self::Remote(trimmed.to_string()));
        }

        let path = Path::new(trimmed);
        if path.exists() {
            return Ok(Self::Local(path.to_path_buf()));
        }
        if trimmed.matches('/').count() == 1
            && let Some((owner, repo)) = owner_and_repo(trimmed)
            && is_identifier(&owner)
            && is_identifier(&repo)
        {
            return Ok(Self::GitHub { owner, repo });
        }

        Err(AppError::InvalidInput(format!(
            "'{trimmed}' is neither an existing path, a repository URL, nor owner/repo"
        )))
    }

    /// URL that a plain git clone can fetch from.
    pub fn clone_url(&self) -> Option<String> {
        match self {
            Self::Local(_) => None,
            Self::GitHub { owner, repo } => Some(format!("https://github.com/{owner}/{repo}.git")),
            Self::GitLab(url) | Self::Remote(url) => Some(url.clone()),
        }
    }

    /// Short name used in report headings and cache directories.
    pub fn name(&self) -> String {
        match self {
            Self::Local(path) => {
                let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
                resolved
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string())
            }
            Self::GitHub { repo, .. } => repo.clone(),
            Self::GitLab(url) | Self::Remote(url) => {
                let last = url
                    .trim_end_matches('/')
                    .rsplit(['/', ':'])
                    .next()
                    .unwrap_or(url.as_str());
                last.trim_end_matches(".git").to_string()
            }
        }
    }
}

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{}", path.display()),
            Self::GitHub { owner, repo } => write!(f, "{owner}/{repo}"),
            Self::GitLab(url) | Self::Remote(url) => f.write_str(url),
        }
    }
}

fn strip_any<'a>(value: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|prefix| value.strip_prefix(prefix))
}

fn owner_and_repo(path: &str) -> Option<(String, String)> {
    let mut parts = path.trim_end_matches('/').split('/');
    let owner = parts.next()?.trim();
    let repo = parts.next()?.trim();
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((owner.to_string(), repo.to_string()))
}

fn is_identifier(value: &str) -> bool {
    !value.starts_with('.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}
