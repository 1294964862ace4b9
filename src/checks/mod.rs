//! Credential validation checks.
//!
//! This module contains the validators run by the precheck:
//! - Format: syntactic key check, no I/O
//! - Anthropic: API key authentication and credit
//! - GitHub: username, token, and username/token pairing
//!
//! # Failure Handling
//!
//! Validators never return errors. Every outcome, including an unreachable
//! remote API, is a [`CredentialCheck`] carrying a [`StatusCode`]; turning a
//! failed check into an error is the orchestrator's job.

pub mod anthropic;
pub mod format;
pub mod github;
pub mod status;

use std::fmt;

use serde::Serialize;

pub use anthropic::AnthropicValidator;
pub use github::GithubValidator;
pub use status::{ActionLabel, Credential, StatusCode};

/// Environment variable holding the Anthropic API key
pub const ANTHROPIC_API_KEY_VAR: &str = "ANTHROPIC_API_KEY";
/// Environment variable holding the GitHub username
pub const GITHUB_USERNAME_VAR: &str = "GITHUB_USERNAME";
/// Environment variable holding the GitHub token
pub const GITHUB_TOKEN_VAR: &str = "GITHUB_TOKEN";

/// Result of validating one credential.
///
/// `valid` is derived from the status code, so a check is valid exactly when
/// its status is one of the success codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialCheck {
    valid: bool,
    status: StatusCode,
}

impl CredentialCheck {
    pub fn new(status: StatusCode) -> Self {
        CredentialCheck {
            valid: status.is_success(),
            status,
        }
    }

    pub fn valid(&self) -> bool {
        self.valid
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn credential(&self) -> Credential {
        self.status.credential()
    }
}

impl From<StatusCode> for CredentialCheck {
    fn from(status: StatusCode) -> Self {
        CredentialCheck::new(status)
    }
}

impl fmt::Display for CredentialCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.valid { "VALID" } else { "INVALID" };
        write!(f, "{}: {} ({})", verdict, self.status.label(), self.status)
    }
}

/// Credentials supplied for one round. Empty values count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    anthropic_api_key: Option<String>,
    github_username: Option<String>,
    github_token: Option<String>,
}

impl Credentials {
    pub fn new(
        anthropic_api_key: Option<String>,
        github_username: Option<String>,
        github_token: Option<String>,
    ) -> Self {
        Credentials {
            anthropic_api_key: non_empty(anthropic_api_key),
            github_username: non_empty(github_username),
            github_token: non_empty(github_token),
        }
    }

    /// Read credentials from `ANTHROPIC_API_KEY`, `GITHUB_USERNAME` and
    /// `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        Credentials::new(
            std::env::var(ANTHROPIC_API_KEY_VAR).ok(),
            std::env::var(GITHUB_USERNAME_VAR).ok(),
            std::env::var(GITHUB_TOKEN_VAR).ok(),
        )
    }

    pub fn anthropic_api_key(&self) -> Option<&str> {
        self.anthropic_api_key.as_deref()
    }

    pub fn github_username(&self) -> Option<&str> {
        self.github_username.as_deref()
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github_token.as_deref()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn redacted(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<redacted>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("anthropic_api_key", &redacted(&self.anthropic_api_key))
            .field("github_username", &self.github_username)
            .field("github_token", &redacted(&self.github_token))
            .finish()
    }
}

/// A validator the orchestrator can run as one precheck step
pub trait CredentialValidator {
    /// Credential this validator is responsible for
    fn credential(&self) -> Credential;

    /// Validate the relevant part of `credentials`
    fn check(&self, credentials: &Credentials) -> CredentialCheck;
}
