//! credential-precheck library
//!
//! Validates the credentials a task round depends on before the round runs:
//! - Anthropic API key: format, authentication, and available credit
//! - GitHub username and token: existence, authentication, and that the
//!   token belongs to the named account
//!
//! A failed precheck is logged to the operator with a remediation message,
//! its short label is persisted under `result-<round>`, and the round is
//! aborted with a [`PrecheckError`].
//!
//! # Example
//!
//! ```no_run
//! use credential_precheck::checks::Credentials;
//! use credential_precheck::config::PrecheckConfig;
//! use credential_precheck::engine::logger::TracingLogger;
//! use credential_precheck::engine::store::MemoryStore;
//! use credential_precheck::run_precheck;
//!
//! let store = MemoryStore::new();
//! match run_precheck(&PrecheckConfig::default(), "42", &Credentials::from_env(), &store, TracingLogger) {
//!     Ok(report) => println!("{} credentials valid", report.summary().valid),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```

pub mod checks;
pub mod cli;
pub mod config;
pub mod engine;
pub mod http;
pub mod logging;
pub mod version;

use std::sync::Arc;

use thiserror::Error;

use checks::{AnthropicValidator, Credentials, GithubValidator, StatusCode};
use config::{ConfigError, PrecheckConfig};
use engine::logger::TaskLogger;
use engine::orchestrator::PrecheckOrchestrator;
use engine::result::PrecheckReport;
use engine::store::ResultStore;
use http::HttpClient;

// Re-exports for public API
pub use checks::CredentialCheck;
pub use engine::orchestrator::PrecheckOrchestrator as Orchestrator;

/// Error types for precheck operations.
#[derive(Debug, Error)]
pub enum PrecheckError {
    /// A credential failed validation; the message is the remediation text
    #[error("{}", .status.remediation())]
    CredentialRejected { round: String, status: StatusCode },
    /// The precheck could not be set up
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PrecheckError {
    /// Status code of a rejected credential
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            PrecheckError::CredentialRejected { status, .. } => Some(*status),
            PrecheckError::Config(_) => None,
        }
    }

    /// True when the rejection came from an unreachable API rather than a
    /// bad credential; the next round may succeed unchanged
    pub fn is_transient(&self) -> bool {
        self.status().map(|s| s.is_transient()).unwrap_or(false)
    }
}

/// Build the standard orchestrator: Anthropic first, then GitHub, both
/// sharing one HTTP client configured from `config`.
pub fn build_orchestrator<S: ResultStore, L: TaskLogger>(
    config: &PrecheckConfig,
    store: S,
    logger: L,
) -> Result<PrecheckOrchestrator<S, L>, ConfigError> {
    config.validate()?;

    let client = Arc::new(HttpClient::with_config(config.http_config()));

    let anthropic = AnthropicValidator::with_endpoint(client.clone(), config.anthropic_endpoint()?)
        .with_model(&config.anthropic.model)
        .with_api_version(&config.anthropic.api_version);
    let github = GithubValidator::with_endpoint(client, config.github_endpoint()?);

    Ok(PrecheckOrchestrator::new(store, logger)
        .with_validator(Box::new(anthropic))
        .with_validator(Box::new(github)))
}

/// Run the standard precheck for one round.
///
/// This is the main entry point for task runners.
pub fn run_precheck<S: ResultStore, L: TaskLogger>(
    config: &PrecheckConfig,
    round: &str,
    credentials: &Credentials,
    store: S,
    logger: L,
) -> Result<PrecheckReport, PrecheckError> {
    let orchestrator = build_orchestrator(config, store, logger)?;
    orchestrator.run(round, credentials)
}
