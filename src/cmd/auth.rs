use crate::cmd::config::{PromptAction, prompt};
use crate::config::{AppConfig, GITHUB_SECTION, StoredConfig};
use crate::error::{AppError, AppResult};
use crate::infra::github::authenticated_login;

const TOKEN_KEY: &str = "access_token";

/// Ask for a personal access token, check it against the API, then store it.
pub async fn run() -> AppResult<()> {
    let mut stored = StoredConfig::load()?;
    let config = AppConfig::from_stored(&stored)?;

    println!("Create a token at https://github.com/settings/tokens with the `repo` scope.");
    let current = stored.value(GITHUB_SECTION, TOKEN_KEY);
    let token = match prompt("GitHub access token", current.as_deref(), true)? {
        PromptAction::Set(token) => token,
        PromptAction::Keep => current.ok_or_else(|| {
            AppError::InvalidInput("no GitHub access token provided".to_string())
        })?,
        PromptAction::Clear => {
            stored.set(GITHUB_SECTION, TOKEN_KEY, "");
            stored.save()?;
            println!("GitHub access token removed.");
            return Ok(());
        }
    };

    let login = authenticated_login(&config.github_api_url, &token).await?;
    tracing::info!(%login, "GitHub token verified");

    stored.set(GITHUB_SECTION, TOKEN_KEY, &token);
    stored.save()?;
    println!("GitHub authentication granted for {login}.");
    Ok(())
}
