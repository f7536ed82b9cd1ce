use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::location::RepositoryLocation;
use crate::infra::git::GitRepository;
use crate::infra::github::GitHubClient;
use crate::infra::llm::OpenAiClient;
use crate::infra::remote::RemoteMirror;
use crate::services::{LanguageModelService, VersionControlService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub language_model: Arc<dyn LanguageModelService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        language_model: Arc<dyn LanguageModelService>,
    ) -> Self {
        Self {
            config,
            version_control,
            language_model,
        }
    }

    /// Wires the commit source for `location` and the configured model endpoint.
    pub fn for_location(config: AppConfig, location: &RepositoryLocation) -> Self {
        let version_control = commit_source(location, &config);
        let language_model: Arc<dyn LanguageModelService> = Arc::new(OpenAiClient::new(
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            config.openai_base_url.clone(),
        ));
        Self::new(config, version_control, language_model)
    }
}

/// Hosted API when a token is available, otherwise a cached clone.
fn commit_source(
    location: &RepositoryLocation,
    config: &AppConfig,
) -> Arc<dyn VersionControlService> {
    match location {
        RepositoryLocation::Local(path) => Arc::new(GitRepository::new(path.clone())),
        RepositoryLocation::GitHub { owner, repo } => match &config.github_token {
            Some(token) => Arc::new(GitHubClient::new(
                config.github_api_url.clone(),
                token.clone(),
                owner.clone(),
                repo.clone(),
            )),
            None => {
                tracing::warn!("no GitHub access token configured; cloning {owner}/{repo} instead");
                mirror(location, config)
            }
        },
        RepositoryLocation::GitLab(_) | RepositoryLocation::Remote(_) => mirror(location, config),
    }
}

fn mirror(location: &RepositoryLocation, config: &AppConfig) -> Arc<dyn VersionControlService> {
    let url = location.clone_url().unwrap_or_else(|| location.to_string());
    Arc::new(RemoteMirror::new(
        url,
        config.cache_dir.clone(),
        config.cache_duration_days,
    ))
}
