use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV_VAR: &str = "RIDDLESOLVER_LOG";

/// Logs go to stderr so a summary printed on stdout stays clean.
pub fn setup_logger(level: LevelFilter) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let fmt = fmt::layer()
        .with_target(cfg!(debug_assertions))
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(fmt)
        .with(env_filter)
        .init();
}
