//! Demolens CLI: inspect components, run interpretations and exercise flagging.

mod commands;
mod demos;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Demolens: input components and black-box interpretation for model demos
#[derive(Parser, Debug)]
#[command(name = "demolens", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (for `.demolens/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// List registered component types and shorthands
    Components,
    /// Print the template context of a component
    Describe {
        /// Component type or shorthand
        name: String,
        /// Constructor options as a JSON object
        #[arg(short, long)]
        options: Option<String>,
    },
    /// Print a representative raw value for a component
    Sample {
        /// Component type or shorthand
        name: String,
        /// Constructor options as a JSON object
        #[arg(short, long)]
        options: Option<String>,
    },
    /// Interpret one of the built-in demo functions
    Interpret {
        /// Demo function to wrap
        #[arg(value_enum)]
        demo: demos::Demo,
        /// Raw input values, one per slot (JSON, plain text, or a media file path)
        inputs: Vec<String>,
        /// Interpretation method for every slot
        #[arg(short, long, value_enum, default_value = "default")]
        method: commands::MethodArg,
        /// Seed for Shapley permutation sampling
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Save a raw value under the flagging directory and print its reference
    Flag {
        /// Component type or shorthand
        name: String,
        /// Raw value (JSON, plain text, or a media file path)
        value: String,
        /// Column name the value is stored under
        #[arg(long)]
        slot: Option<String>,
        /// Flagging directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Restore a flagged value from its stored reference
    Restore {
        /// Component type or shorthand
        name: String,
        /// Stored reference as printed by `flag` (JSON)
        stored: String,
        /// Flagging directory (defaults to the configured one)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create a default configuration file in the workspace
    Init,
    /// Show the effective configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = demolens_core::config::load_config(Some(&workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    // Human-readable layer for stderr (always active)
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    // JSON file layer, only when a log directory is configured
    let mut _guard = None;
    let json_layer = match &config.logging.file_dir {
        Some(log_dir) => {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, "demolens.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            _guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    commands::handle_command(cli.command, &workspace, config)
}
