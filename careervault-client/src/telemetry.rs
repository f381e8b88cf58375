use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError,
};

/// Install the global subscriber: human-readable lines on stderr, filtered by `RUST_LOG`
/// or `default_level` when that is unset.
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_tracing(default_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter(default_level))
        .try_init()
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = default_level.parse().unwrap_or(LevelFilter::INFO);
        EnvFilter::builder()
            .with_default_directive(level.into())
            .parse_lossy("")
    })
}
