//! `periodctl` entry point.
//!
//! Resolves a period configuration, initializes a registry from it and
//! answers a single period query per invocation.

mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use period_common::config::PeriodConfig;
use period_common::time::parse_timestamp;
use period_core::PeriodRegistry;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::output::{render_config, render_period, render_span, OutputFormat};

/// periodctl command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "periodctl",
    about = "Sequential time period numbering - map timestamps to period IDs",
    version,
    long_about = None
)]
struct Args {
    /// Path to a period configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Start of period 1, as epoch milliseconds or RFC 3339 (overrides config file).
    #[arg(long, value_name = "TIMESTAMP", value_parser = parse_timestamp, global = true)]
    origin: Option<u64>,

    /// Period length in milliseconds (overrides config file).
    #[arg(long, value_name = "MILLIS", global = true)]
    span: Option<u64>,

    /// Read the local clock only, never the time server.
    #[arg(long, global = true)]
    test: bool,

    /// Fall back instead of failing when the time server cannot be read.
    #[arg(long, global = true)]
    force: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Period containing a timestamp (epoch milliseconds or RFC 3339).
    Get {
        #[arg(value_parser = parse_timestamp)]
        timestamp: u64,
    },
    /// Period containing the current time; fails if the clock cannot be read.
    Current,
    /// Period containing the current time, or "no period" on clock failure.
    Now,
    /// Boundaries of an explicit period ID.
    Period { id: u64 },
    /// Period following the one that contains a timestamp.
    Next {
        #[arg(value_parser = parse_timestamp)]
        timestamp: u64,
    },
    /// Configured period length.
    Span,
    /// Print the resolved configuration.
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    debug!(version = env!("CARGO_PKG_VERSION"), command = ?args.command, "Starting periodctl");

    let mut config = load_config(&args)?;
    apply_overrides(&mut config, &args);
    config.validate().context("Invalid period configuration")?;

    info!(
        config.origin_timestamp,
        config.span,
        config.test_environment,
        config.force,
        "Configuration resolved"
    );

    let answer = run(&args.command, &config, args.format)?;
    println!("{answer}");
    Ok(())
}

/// Initialize logging with the specified log level.
///
/// Logs go to stderr so stdout carries only the answer.
fn init_logging(level: &str) {
    let filter = format!(
        "periodctl={level},period_core={level},period_timesource={level},period_common={level}"
    );

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `PERIOD_CONFIG_PATH` environment variable
/// 3. `/etc/period/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<PeriodConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return PeriodConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var("PERIOD_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from PERIOD_CONFIG_PATH");
            return PeriodConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from PERIOD_CONFIG_PATH={env_path}")
            });
        }
        warn!(
            path = %env_path,
            "PERIOD_CONFIG_PATH set but file does not exist, checking other locations"
        );
    }

    // 3. System path
    let system_path = PathBuf::from("/etc/period/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return PeriodConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {}", system_path.display()));
    }

    // 4. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return PeriodConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {}", local_path.display()));
    }

    // 5. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(PeriodConfig::default())
}

/// Command-line flags win over file values.
fn apply_overrides(config: &mut PeriodConfig, args: &Args) {
    if let Some(origin) = args.origin {
        config.origin_timestamp = origin;
    }
    if let Some(span) = args.span {
        config.span = span;
    }
    if args.test {
        config.test_environment = true;
    }
    if args.force {
        config.force = true;
    }
}

/// Answer one query against a registry built from `config`.
fn run(command: &Command, config: &PeriodConfig, format: OutputFormat) -> Result<String> {
    if *command == Command::Config {
        return render_config(config, format);
    }

    let registry =
        PeriodRegistry::from_config(config).context("Failed to initialize period registry")?;

    match command {
        Command::Get { timestamp } => {
            let period = registry
                .get(*timestamp)
                .with_context(|| format!("No period for timestamp {timestamp}"))?;
            render_period(&period, format)
        }
        Command::Current => {
            let period = registry
                .current()
                .context("Failed to determine the current period")?;
            render_period(&period, format)
        }
        Command::Now => render_period(&registry.now(), format),
        Command::Period { id } => {
            anyhow::ensure!(*id > 0, "period IDs start at 1");
            render_period(&registry.period(*id), format)
        }
        Command::Next { timestamp } => {
            let period = registry
                .get(*timestamp)
                .with_context(|| format!("No period for timestamp {timestamp}"))?;
            render_period(&period.next(), format)
        }
        Command::Span => render_span(registry.span(), registry.duration(), format),
        Command::Config => render_config(config, format),
    }
}
