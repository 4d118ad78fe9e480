// NutriPlan AI
// Main entry point for the nutri binary

use anyhow::Context;
use clap::Parser;
use nutri_engine::cli::{Cli, Command};
use nutri_engine::config::Config;
use nutri_engine::handlers::{handle_ask, handle_chat, handle_config, handle_macros, OutputFormat};
use nutri_engine::telemetry::{init_telemetry, init_telemetry_with_level};
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        // The macro calculator needs no configuration
        Command::Macros { calories } => {
            match cli.log.as_deref() {
                Some(level) => init_telemetry_with_level(level),
                None => init_telemetry(),
            }
            handle_macros(calories, format)
        }

        Command::Chat => {
            let (config, _) = load_config(cli.config.as_deref(), cli.log.as_deref())?;
            handle_chat(&config).await
        }

        Command::Ask { messages } => {
            let (config, _) = load_config(cli.config.as_deref(), cli.log.as_deref())?;
            handle_ask(messages, &config, format).await
        }

        Command::Config => {
            let (config, path) = load_config(cli.config.as_deref(), cli.log.as_deref())?;
            handle_config(&config, &path, format)
        }
    }
}

/// Load configuration (or use custom path if provided), then start logging.
///
/// `--log` wins over the configured level; `RUST_LOG` wins over both.
fn load_config(custom: Option<&Path>, log: Option<&str>) -> anyhow::Result<(Config, PathBuf)> {
    let (config, path) = match custom {
        Some(path) => (Config::load_from_path(path), path.to_path_buf()),
        None => {
            let path = Config::default_config_path()?;
            (Config::load_or_create(), path)
        }
    };
    let config = config.with_context(|| format!("Failed to load {}", path.display()))?;

    init_telemetry_with_level(log.unwrap_or(&config.core.log_level));
    tracing::info!("NutriPlan v{}", env!("CARGO_PKG_VERSION"));

    Ok((config, path))
}
