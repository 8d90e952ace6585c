use std::env;

use anyhow::Context as _;
use cloudctl_manager::Manager;
use cloudctl_manager::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use cloudctl_manager::observability::{apply_logging_level, init_tracing};
use tokio_util::sync::CancellationToken;

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From CLOUDCTL_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (cloudctl.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (CLOUDCTL_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    init_tracing();

    let (config_path, source) = resolve_config_path();
    let cfg = match load_config(Some(&config_path)) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };
    apply_logging_level(&cfg.logging.level);
    tracing::info!(path = %config_path, %source, "configuration loaded");

    let manager = match Manager::new(cfg) {
        Ok(manager) => manager,
        Err(e) => {
            eprintln!("Manager initialization failed: {e}");
            std::process::exit(2);
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
            shutdown.cancel();
        }
    });

    manager.run(shutdown).await.context("controller manager failed")
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: CLOUDCTL_CONFIG
/// 3. Default: cloudctl.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    match env::var("CLOUDCTL_CONFIG") {
        Ok(path) if !path.is_empty() => (path, ConfigSource::EnvironmentVariable),
        _ => (DEFAULT_CONFIG_PATH.to_string(), ConfigSource::Default),
    }
}
