//! Command line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::{ConfigError, PrecheckConfig};
use crate::logging::LogLevel;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Text,
    /// Machine-readable JSON
    Json,
}

/// Command to execute
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Validate credentials for a round; a failure is persisted and exits 1
    Run {
        /// Round identifier; the result is stored under `result-<ROUND>`
        #[arg(long)]
        round: String,
        /// Result store file (overrides `store_path` from the config file)
        #[arg(long, value_name = "PATH")]
        store: Option<PathBuf>,
    },
    /// Validate every credential and print a report, without persisting
    Check,
    /// List all status codes with their labels
    Statuses,
    /// Print version information
    Version,
}

/// Parsed command line arguments
#[derive(Debug, Clone, Parser)]
#[command(
    name = "credential-precheck",
    version,
    about = "Validate Anthropic and GitHub credentials before a task round",
    after_help = "Credentials are read from ANTHROPIC_API_KEY, GITHUB_USERNAME and GITHUB_TOKEN.\n\n\
                  EXIT CODES:\n    0   All credentials valid\n    1   A credential was rejected\n    3   Runtime error"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Load configuration from a TOML file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Timeout in milliseconds for each outbound call
    #[arg(long, global = true, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Diagnostic log level (RUST_LOG takes precedence)
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    /// Emit diagnostic logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

impl Args {
    /// Configuration from `--config` (or defaults) with command line
    /// overrides applied
    pub fn load_config(&self) -> Result<PrecheckConfig, ConfigError> {
        let mut config = match self.config {
            Some(ref path) => PrecheckConfig::load(path)?,
            None => PrecheckConfig::default(),
        };

        if let Some(timeout_ms) = self.timeout_ms {
            config.timeout_ms = timeout_ms;
        }

        if let Command::Run {
            store: Some(ref store),
            ..
        } = self.command
        {
            config.store_path = store.clone();
        }

        config.validate()?;
        Ok(config)
    }
}
