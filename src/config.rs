use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use ini::{Ini, ParseOption};

use crate::domain::batch::DEFAULT_BATCH_SIZE;
use crate::error::{AppError, AppResult};

pub const CONFIG_ENV_VAR: &str = "RIDDLESOLVER_CONFIG";
const CONFIG_FILE_NAME: &str = ".riddlesolver";

pub const OPENAI_SECTION: &str = "openai";
pub const GENERAL_SECTION: &str = "general";
pub const GITHUB_SECTION: &str = "github";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_CACHE_DIR: &str = "~/.cache/repo_cache";
const DEFAULT_CACHE_DURATION_DAYS: u64 = 7;

const DEFAULTS: &[(&str, &str, &str)] = &[
    (OPENAI_SECTION, "api_key", ""),
    (OPENAI_SECTION, "model", DEFAULT_MODEL),
    (OPENAI_SECTION, "base_url", DEFAULT_OPENAI_BASE_URL),
    (GENERAL_SECTION, "cache_dir", DEFAULT_CACHE_DIR),
    (GENERAL_SECTION, "cache_duration", "7"),
    (GENERAL_SECTION, "batch_size", "50"),
    (GITHUB_SECTION, "access_token", ""),
    (GITHUB_SECTION, "api_url", DEFAULT_GITHUB_API_URL),
];

/// Location of the INI file; `RIDDLESOLVER_CONFIG` overrides `~/.riddlesolver`.
pub fn config_file_path() -> AppResult<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV_VAR).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    dirs::home_dir()
        .map(|home| home.join(CONFIG_FILE_NAME))
        .ok_or_else(|| {
            AppError::Configuration("unable to determine the home directory".to_string())
        })
}

/// The persisted key/value store, section by section.
pub struct StoredConfig {
    path: PathBuf,
    ini: Ini,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(config_file_path()?)
    }

    /// Reads the file at `path`, writing a default one first if it is missing.
    pub fn load_from(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let ini = match fs::read_to_string(&path) {
            Ok(contents) => Ini::load_from_str_opt(&contents, parse_options()).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let stored = Self {
                    path,
                    ini: default_ini(),
                };
                stored.save()?;
                tracing::info!("created default configuration at {}", stored.path.display());
                return Ok(stored);
            }
            Err(err) => return Err(AppError::Io(err)),
        };
        Ok(Self { path, ini })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key)
    }

    /// Surrounding whitespace is dropped from both key and value; everything
    /// else, quotes included, reads back unchanged.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.ini
            .with_section(Some(section))
            .set(key.trim(), value.trim());
    }

    /// Like `get`, but blank values count as unset.
    pub fn value(&self, section: &str, key: &str) -> Option<String> {
        self.get(section, key)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    /// All named sections with their entries, in file order.
    pub fn entries(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.ini
            .iter()
            .filter_map(|(section, props)| {
                let section = section?;
                let pairs = props
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_string()))
                    .collect();
                Some((section.to_string(), pairs))
            })
            .collect()
    }

    pub fn save(&self) -> AppResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        self.ini.write_to_file(&self.path)?;
        Ok(())
    }
}

/// Quotes are kept as part of the value; backslash escapes written by `save`
/// are decoded.
fn parse_options() -> ParseOption {
    ParseOption {
        enabled_quote: false,
        enabled_escape: true,
        ..ParseOption::default()
    }
}

fn default_ini() -> Ini {
    let mut ini = Ini::new();
    for (section, key, value) in DEFAULTS {
        ini.with_section(Some(*section)).set(*key, *value);
    }
    ini
}

/// Resolved, typed settings used by a summarize run.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub cache_dir: PathBuf,
    pub cache_duration_days: u64,
    pub batch_size: NonZeroUsize,
    pub github_token: Option<String>,
    pub github_api_url: String,
}

impl AppConfig {
    pub fn from_stored(stored: &StoredConfig) -> AppResult<Self> {
        let cache_dir = stored
            .value(GENERAL_SECTION, "cache_dir")
            .unwrap_or_else(|| DEFAULT_CACHE_DIR.to_string());

        let cache_duration_days = match stored.value(GENERAL_SECTION, "cache_duration") {
            Some(raw) => parse_number::<u64>("general.cache_duration", &raw)?,
            None => DEFAULT_CACHE_DURATION_DAYS,
        };

        let batch_size = match stored.value(GENERAL_SECTION, "batch_size") {
            Some(raw) => parse_number::<NonZeroUsize>("general.batch_size", &raw)?,
            None => DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            openai_api_key: stored
                .value(OPENAI_SECTION, "api_key")
                .or_else(|| env_secret("OPENAI_API_KEY")),
            openai_model: stored
                .value(OPENAI_SECTION, "model")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            openai_base_url: stored
                .value(OPENAI_SECTION, "base_url")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            cache_dir: expand_home(&cache_dir),
            cache_duration_days,
            batch_size,
            github_token: stored
                .value(GITHUB_SECTION, "access_token")
                .or_else(|| env_secret("GITHUB_TOKEN")),
            github_api_url: stored
                .value(GITHUB_SECTION, "api_url")
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|err| {
        AppError::Configuration(format!("{key} must be a positive integer, got '{raw}': {err}"))
    })
}

fn env_secret(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(rest.trim_start_matches('/')),
            None => PathBuf::from(path),
        },
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let stored = StoredConfig::load_from(&path).unwrap();

        assert!(path.exists());
        assert_eq!(stored.get(OPENAI_SECTION, "model"), Some(DEFAULT_MODEL));
        assert_eq!(stored.get(GENERAL_SECTION, "cache_duration"), Some("7"));
        assert_eq!(stored.get(GITHUB_SECTION, "access_token"), Some(""));
        let sections: Vec<String> = stored.entries().into_iter().map(|(s, _)| s).collect();
        assert_eq!(sections, vec!["openai", "general", "github"]);
    }

    #[test]
    fn set_value_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut stored = StoredConfig::load_from(&path).unwrap();
        stored.set(OPENAI_SECTION, "model", "gpt-4o-mini");
        stored.set("custom", "flavour", "vanilla");
        stored.save().unwrap();

        let reloaded = StoredConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.get(OPENAI_SECTION, "model"), Some("gpt-4o-mini"));
        assert_eq!(reloaded.get("custom", "flavour"), Some("vanilla"));
        assert_eq!(
            reloaded.get(OPENAI_SECTION, "base_url"),
            Some(DEFAULT_OPENAI_BASE_URL)
        );
    }

    #[test]
    fn special_characters_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.ini");

        let mut stored = StoredConfig::load_from(&path).unwrap();
        stored.set("custom", "quoted", "\"quoted\"");
        stored.set("custom", "single", "'single'");
        stored.set("custom", "path", "C:\\cache\\repos");
        stored.set("custom", "padded", "  spaced  ");
        stored.save().unwrap();

        let reloaded = StoredConfig::load_from(&path).unwrap();
        assert_eq!(reloaded.get("custom", "quoted"), Some("\"quoted\""));
        assert_eq!(reloaded.get("custom", "single"), Some("'single'"));
        assert_eq!(reloaded.get("custom", "path"), Some("C:\\cache\\repos"));
        assert_eq!(reloaded.get("custom", "padded"), Some("spaced"));
    }

    #[test]
    fn resolves_typed_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut stored = StoredConfig::load_from(dir.path().join("config.ini")).unwrap();
        stored.set(OPENAI_SECTION, "api_key", "sk-test");
        stored.set(GENERAL_SECTION, "cache_dir", "/tmp/repos");
        stored.set(GENERAL_SECTION, "cache_duration", "3");
        stored.set(GENERAL_SECTION, "batch_size", "10");
        stored.set(GITHUB_SECTION, "access_token", "ghp_token");

        let config = AppConfig::from_stored(&stored).unwrap();
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai_model, DEFAULT_MODEL);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/repos"));
        assert_eq!(config.cache_duration_days, 3);
        assert_eq!(config.batch_size.get(), 10);
        assert_eq!(config.github_token.as_deref(), Some("ghp_token"));
        assert_eq!(config.github_api_url, DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn rejects_zero_batch_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut stored = StoredConfig::load_from(dir.path().join("config.ini")).unwrap();
        stored.set(GENERAL_SECTION, "batch_size", "0");

        assert!(matches!(
            AppConfig::from_stored(&stored),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn expands_home_prefix_only() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/.cache/x"), home.join(".cache/x"));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("~other/x"), PathBuf::from("~other/x"));
    }
}
