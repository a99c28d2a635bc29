use std::env;
use std::process::ExitCode;

use tokio::sync::mpsc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use zone_levels::bot::{Bot, BotConfig};
use zone_levels::config::{Config, PositionSeed};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = parse_config_path();
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.app.log_level.as_deref());

    let seeds = config.positions.clone();
    let bot = match Bot::from_config(BotConfig {
        app_config: config,
        version: env!("CARGO_PKG_VERSION").to_string(),
    }) {
        Ok(bot) => bot,
        Err(e) => {
            error!(error = %e, "Failed to create bot");
            return ExitCode::FAILURE;
        }
    };

    info!(config = %config_path, "Bot initialized");

    if env::args().any(|arg| arg == "--decide") {
        return decide_seeds(&bot, &seeds).await;
    }

    // Fill events come from the order-management layer; none is wired in dry-run.
    let (_events_tx, events_rx) = mpsc::unbounded_channel();

    tokio::select! {
        result = bot.start(events_rx) => {
            if let Err(e) = result {
                error!(error = %e, "Bot error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested");
        }
    }

    let _ = bot.stop().await;
    ExitCode::SUCCESS
}

/// Prints the entry outcome of every seeded position as JSON.
async fn decide_seeds(bot: &Bot, seeds: &[PositionSeed]) -> ExitCode {
    let mut failed = false;
    for seed in seeds {
        match bot.evaluate_entry(seed).await {
            Ok(entry) => match serde_json::to_string_pretty(&entry) {
                Ok(json) => println!("{}: {}", seed.pair, json),
                Err(e) => {
                    error!(pair = %seed.pair, error = %e, "Failed to encode decision");
                    failed = true;
                }
            },
            Err(e) => {
                warn!(pair = %seed.pair, error = %e, "No decision");
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
