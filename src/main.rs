use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use wavscribe::config::Args;

/// Application-specific environment variable for log filtering.
const LOG_ENV_VAR: &str = "WAVSCRIBE_LOG";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // WAVSCRIBE_LOG overrides the default level
    let filter = EnvFilter::builder()
        .with_env_var(LOG_ENV_VAR)
        .with_default_directive("wavscribe=info".parse()?)
        .from_env()?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Route whisper.cpp and GGML logs through tracing
    whisper_rs::install_logging_hooks();

    let args = Args::parse();
    wavscribe::driver::run(args).await
}
