use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
    #[error("version control error: {0}")]
    VersionControl(String),
    #[error("hosting service error: {0}")]
    HostingService(String),
    #[error("language model error: {0}")]
    LanguageModel(String),
    #[error("language model rate limit exceeded: {0}")]
    RateLimited(String),
    #[error("{failed} of {total} batches could not be summarized")]
    IncompleteSummary { failed: usize, total: usize },
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
