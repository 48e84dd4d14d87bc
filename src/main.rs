use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use callcycle::config::{CycleConfig, LogFormat, LoggingConfig};

#[derive(Parser)]
#[command(
    name = "callcycle",
    about = "Self-sustaining HTTP call cycle with delayed scheduling and call history",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, env = "CALLCYCLE_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overrides `server.bind`
    #[arg(long, env = "CALLCYCLE_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, origin) = CycleConfig::resolve(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
    }

    init_tracing(&config.logging);
    origin.log();

    callcycle::serve(config).await
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
