use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{ACCEPT, AUTHORIZATION, USER_AGENT},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::commit::Commit;
use crate::error::{AppError, AppResult};
use crate::services::{CommitQuery, VersionControlService};

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";
const CLIENT_AGENT: &str = concat!("riddlesolver/", env!("CARGO_PKG_VERSION"));

pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
}

impl GitHubClient {
    pub fn new(api_url: String, token: String, owner: String, repo: String) -> Self {
        Self {
            http: Client::new(),
            api_url,
            token,
            owner,
            repo,
        }
    }

    fn repo_endpoint(&self, resource: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            resource
        )
    }

    async fn branch_names(&self) -> AppResult<Vec<String>> {
        let endpoint = self.repo_endpoint("branches");
        let mut names = Vec::new();
        for page in 1.. {
            let request = self
                .http
                .get(&endpoint)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let batch: Vec<GitHubBranch> = send(authorized(request, &self.token)).await?;
            let done = batch.len() < PER_PAGE;
            names.extend(batch.into_iter().map(|branch| branch.name));
            if done {
                break;
            }
        }
        Ok(names)
    }

    async fn branch_commits(&self, branch: &str, query: &CommitQuery) -> AppResult<Vec<Commit>> {
        let endpoint = self.repo_endpoint("commits");
        let since = query.range.start().to_rfc3339_opts(SecondsFormat::Secs, true);
        let until = query.range.end().to_rfc3339_opts(SecondsFormat::Secs, true);

        let mut commits = Vec::new();
        for page in 1.. {
            let mut params = vec![
                ("sha", branch.to_string()),
                ("since", since.clone()),
                ("until", until.clone()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            if let Some(author) = &query.author {
                params.push(("author", author.clone()));
            }

            let request = self.http.get(&endpoint).query(&params);
            let batch: Vec<GitHubCommit> = send(authorized(request, &self.token)).await?;
            let done = batch.len() < PER_PAGE;
            for item in batch {
                commits.push(item.into_commit(branch)?);
            }
            if done {
                break;
            }
        }
        tracing::debug!("branch {branch}: {} commits", commits.len());
        Ok(commits)
    }
}

#[async_trait]
impl VersionControlService for GitHubClient {
    async fn fetch_commits(&self, query: &CommitQuery) -> AppResult<Vec<Commit>> {
        let branches = match &query.branch {
            Some(branch) => vec![branch.clone()],
            None => self.branch_names().await?,
        };
        tracing::info!(
            "fetching commits for {}/{} across {} branches",
            self.owner,
            self.repo,
            branches.len()
        );

        let mut seen = HashSet::new();
        let mut commits = Vec::new();
        for branch in &branches {
            for commit in self.branch_commits(branch, query).await? {
                if seen.insert(commit.hash.clone()) {
                    commits.push(commit);
                }
            }
        }

        // `author` is filtered server-side, where it may also be a login.
        commits.retain(|commit| query.range.contains(commit.timestamp));
        commits.sort_by_key(|commit| commit.timestamp);
        Ok(commits)
    }
}

/// Confirms a token is usable and returns the login it belongs to.
pub async fn authenticated_login(api_url: &str, token: &str) -> AppResult<String> {
    let endpoint = format!("{}/user", api_url.trim_end_matches('/'));
    let request = Client::new().get(endpoint);
    let user: GitHubUser = send(authorized(request, token)).await?;
    Ok(user.login)
}

fn authorized(request: RequestBuilder, token: &str) -> RequestBuilder {
    request
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(ACCEPT, "application/vnd.github+json")
        .header(USER_AGENT, CLIENT_AGENT)
        .header("X-GitHub-Api-Version", API_VERSION)
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> AppResult<T> {
    let response = request
        .send()
        .await
        .map_err(|err| AppError::HostingService(format!("failed to call GitHub: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        return Err(status_error(status, &body));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| AppError::HostingService(format!("failed to parse GitHub response: {err}")))
}

fn status_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::Authentication(format!(
            "GitHub rejected the access token ({status}): {body}"
        )),
        StatusCode::NOT_FOUND => AppError::InvalidInput(format!(
            "GitHub repository or branch not found ({status}): {body}"
        )),
        _ => AppError::HostingService(format!("GitHub responded with {status}: {body}")),
    }
}

#[derive(Deserialize)]
struct GitHubBranch {
    name: String,
}

#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

#[derive(Deserialize)]
struct GitHubCommit {
    sha: String,
    commit: GitHubCommitDetail,
}

#[derive(Deserialize)]
struct GitHubCommitDetail {
    message: String,
    author: Option<GitHubSignature>,
    committer: Option<GitHubSignature>,
}

#[derive(Deserialize)]
struct GitHubSignature {
    name: Option<String>,
    email: Option<String>,
    date: Option<String>,
}

impl GitHubCommit {
    fn into_commit(self, branch: &str) -> AppResult<Commit> {
        let detail = self.commit;
        let date = detail
            .committer
            .as_ref()
            .and_then(|sig| sig.date.as_deref())
            .or_else(|| detail.author.as_ref().and_then(|sig| sig.date.as_deref()))
            .ok_or_else(|| {
                AppError::HostingService(format!("commit {} has no date", self.sha))
            })?;
        let timestamp = DateTime::parse_from_rfc3339(date)
            .map_err(|err| {
                AppError::HostingService(format!("commit {} has a bad date '{date}': {err}", self.sha))
            })?
            .with_timezone(&Utc);

        let author = detail.author.as_ref();
        Ok(Commit {
            hash: self.sha,
            author_name: author
                .and_then(|sig| sig.name.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            author_email: author.and_then(|sig| sig.email.clone()).unwrap_or_default(),
            timestamp,
            message: detail.message,
            diff_summary: None,
            branch: branch.to_string(),
        })
    }
}
