use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{GENERAL_SECTION, GITHUB_SECTION, OPENAI_SECTION, StoredConfig};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
    /// Print a single value.
    Get { section: String, key: String },
    /// Set a single value and rewrite the config file.
    Set {
        section: String,
        key: String,
        value: String,
    },
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;
    match command {
        ConfigCommand::Init => run_init(&mut cfg),
        ConfigCommand::Show => {
            run_show(&cfg);
            Ok(())
        }
        ConfigCommand::Get { section, key } => {
            match cfg.get(&section, &key) {
                Some(value) => println!("{value}"),
                None => eprintln!("[{section}] {key} is not set"),
            }
            Ok(())
        }
        ConfigCommand::Set {
            section,
            key,
            value,
        } => run_set(&mut cfg, &section, &key, &value),
    }
}

fn run_set(cfg: &mut StoredConfig, section: &str, key: &str, value: &str) -> AppResult<()> {
    cfg.set(section, key, value);
    cfg.save()?;
    let shown = if is_secret(key) {
        mask_secret(Some(value))
    } else {
        value.to_string()
    };
    println!("Configuration updated: [{section}] {key} = {shown}");
    Ok(())
}

fn run_init(cfg: &mut StoredConfig) -> AppResult<()> {
    println!("Configuring riddlesolver.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(cfg, OPENAI_SECTION, "api_key", "OpenAI API key", true)?;
    apply_prompt(cfg, OPENAI_SECTION, "model", "Model", false)?;
    apply_prompt(
        cfg,
        OPENAI_SECTION,
        "base_url",
        "API base URL (e.g., https://api.openai.com/v1)",
        false,
    )?;
    apply_prompt(cfg, GENERAL_SECTION, "cache_dir", "Clone cache directory", false)?;
    apply_prompt(
        cfg,
        GENERAL_SECTION,
        "cache_duration",
        "Clone cache duration (days)",
        false,
    )?;
    apply_prompt(cfg, GENERAL_SECTION, "batch_size", "Commits per request", false)?;
    apply_prompt(cfg, GITHUB_SECTION, "access_token", "GitHub access token", true)?;

    cfg.save()?;
    println!("\nConfiguration saved to {}", cfg.path().display());
    Ok(())
}

fn run_show(cfg: &StoredConfig) {
    println!("Configuration file: {}", cfg.path().display());
    for (section, entries) in cfg.entries() {
        println!("\n[{section}]");
        for (key, value) in entries {
            let shown = if is_secret(&key) {
                mask_secret(Some(&value))
            } else {
                display_value(Some(&value))
            };
            println!("{key} = {shown}");
        }
    }
}

fn apply_prompt(
    cfg: &mut StoredConfig,
    section: &str,
    key: &str,
    label: &str,
    secret: bool,
) -> AppResult<()> {
    let current = cfg.value(section, key);
    match prompt(label, current.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => cfg.set(section, key, ""),
        PromptAction::Set(value) => cfg.set(section, key, &value),
    }
    Ok(())
}

pub(crate) fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(PromptAction::from_input(&input))
}

fn is_secret(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    key.contains("key") || key.contains("token")
}

fn display_value(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let chars: Vec<char> = token.chars().collect();
            let prefix: String = chars[..3].iter().collect();
            let suffix: String = chars[chars.len() - 3..].iter().collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PromptAction {
    Keep,
    Clear,
    Set(String),
}

impl PromptAction {
    fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            PromptAction::Keep
        } else if trimmed == "-" {
            PromptAction::Clear
        } else {
            PromptAction::Set(trimmed.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets() {
        assert_eq!(mask_secret(Some("sk-1234567890")), "sk-***890");
        assert_eq!(mask_secret(Some("abc")), "***");
        assert_eq!(mask_secret(Some("")), "<not set>");
        assert_eq!(mask_secret(None), "<not set>");
    }

    #[test]
    fn recognizes_secret_keys() {
        assert!(is_secret("api_key"));
        assert!(is_secret("access_token"));
        assert!(!is_secret("model"));
    }

    #[test]
    fn interprets_prompt_input() {
        assert_eq!(PromptAction::from_input("\n"), PromptAction::Keep);
        assert_eq!(PromptAction::from_input(" - \n"), PromptAction::Clear);
        assert_eq!(
            PromptAction::from_input("gpt-4o\n"),
            PromptAction::Set("gpt-4o".to_string())
        );
    }

    #[test]
    fn set_rewrites_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");
        let mut cfg = StoredConfig::load_from(&path).unwrap();

        run_set(&mut cfg, GENERAL_SECTION, "cache_duration", "14").unwrap();

        let reloaded = StoredConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.get(GENERAL_SECTION, "cache_duration"), Some("14"));
    }
}
