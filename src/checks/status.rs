//! Status codes and their user-facing messages.
//!
//! Every [`StatusCode`] maps to exactly one short label (persisted for the
//! round) and one remediation text (shown to the operator). Both tables are
//! exhaustive `match` expressions, so adding a code without its messages does
//! not compile.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Credential a status code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Credential {
    Anthropic,
    Github,
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Anthropic => write!(f, "Anthropic"),
            Credential::Github => write!(f, "GitHub"),
        }
    }
}

/// Action offered to the operator next to a failure message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionLabel {
    /// The operator has to fix their credentials
    SetUpCredentials,
    /// Nothing to configure; the operator acknowledges the message
    Acknowledge,
}

impl ActionLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionLabel::SetUpCredentials => "Set up credentials",
            ActionLabel::Acknowledge => "I understand",
        }
    }
}

impl fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating one credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCode {
    #[serde(rename = "ANTHROPIC_API_KEY_NOT_SET")]
    AnthropicKeyNotSet,
    #[serde(rename = "ANTHROPIC_API_KEY_INVALID")]
    AnthropicKeyInvalid,
    #[serde(rename = "ANTHROPIC_API_KEY_NO_CREDIT")]
    AnthropicKeyNoCredit,
    #[serde(rename = "ANTHROPIC_API_UNREACHABLE")]
    AnthropicUnreachable,
    AnthropicValid,
    GithubUsernameNotSet,
    GithubTokenNotSet,
    GithubUsernameInvalid,
    GithubTokenInvalid,
    GithubUsernameIncorrect,
    #[serde(rename = "GITHUB_API_UNREACHABLE")]
    GithubUnreachable,
    GithubValid,
}

impl StatusCode {
    /// Every status code, Anthropic first
    pub const ALL: [StatusCode; 12] = [
        StatusCode::AnthropicKeyNotSet,
        StatusCode::AnthropicKeyInvalid,
        StatusCode::AnthropicKeyNoCredit,
        StatusCode::AnthropicUnreachable,
        StatusCode::AnthropicValid,
        StatusCode::GithubUsernameNotSet,
        StatusCode::GithubTokenNotSet,
        StatusCode::GithubUsernameInvalid,
        StatusCode::GithubTokenInvalid,
        StatusCode::GithubUsernameIncorrect,
        StatusCode::GithubUnreachable,
        StatusCode::GithubValid,
    ];

    /// Stable machine-readable code, identical to the serialized form
    pub fn code(&self) -> &'static str {
        match self {
            StatusCode::AnthropicKeyNotSet => "ANTHROPIC_API_KEY_NOT_SET",
            StatusCode::AnthropicKeyInvalid => "ANTHROPIC_API_KEY_INVALID",
            StatusCode::AnthropicKeyNoCredit => "ANTHROPIC_API_KEY_NO_CREDIT",
            StatusCode::AnthropicUnreachable => "ANTHROPIC_API_UNREACHABLE",
            StatusCode::AnthropicValid => "ANTHROPIC_VALID",
            StatusCode::GithubUsernameNotSet => "GITHUB_USERNAME_NOT_SET",
            StatusCode::GithubTokenNotSet => "GITHUB_TOKEN_NOT_SET",
            StatusCode::GithubUsernameInvalid => "GITHUB_USERNAME_INVALID",
            StatusCode::GithubTokenInvalid => "GITHUB_TOKEN_INVALID",
            StatusCode::GithubUsernameIncorrect => "GITHUB_USERNAME_INCORRECT",
            StatusCode::GithubUnreachable => "GITHUB_API_UNREACHABLE",
            StatusCode::GithubValid => "GITHUB_VALID",
        }
    }

    /// Short label persisted under `result-<round>`
    pub fn label(&self) -> &'static str {
        match self {
            StatusCode::AnthropicKeyNotSet => "Anthropic API key is not set",
            StatusCode::AnthropicKeyInvalid => "Anthropic API key is invalid",
            StatusCode::AnthropicKeyNoCredit => "Anthropic API key has no credit",
            StatusCode::AnthropicUnreachable => "Anthropic API is unreachable",
            StatusCode::AnthropicValid => "Anthropic API key is valid",
            StatusCode::GithubUsernameNotSet => "GitHub username is not set",
            StatusCode::GithubTokenNotSet => "GitHub token is not set",
            StatusCode::GithubUsernameInvalid => "GitHub username is invalid",
            StatusCode::GithubTokenInvalid => "GitHub token is invalid",
            StatusCode::GithubUsernameIncorrect => "GitHub username is incorrect",
            StatusCode::GithubUnreachable => "GitHub API is unreachable",
            StatusCode::GithubValid => "GitHub username and token are valid",
        }
    }

    /// Remediation text shown to the operator
    pub fn remediation(&self) -> &'static str {
        match self {
            StatusCode::AnthropicKeyNotSet => {
                "Your Anthropic API key is not set. Please use the task extension helper to set up your Anthropic API key correctly."
            }
            StatusCode::AnthropicKeyInvalid => {
                "Your Anthropic API key is invalid. Please use the task extension helper to set up your Anthropic API key correctly."
            }
            StatusCode::AnthropicKeyNoCredit => {
                "Your Anthropic API key has no credit. Please add credits to your Anthropic account to continue."
            }
            StatusCode::AnthropicUnreachable => {
                "The Anthropic API could not be reached. Please check your network connection; the check will run again next round."
            }
            StatusCode::AnthropicValid => "Your Anthropic API key is valid and has credit.",
            StatusCode::GithubUsernameNotSet => {
                "Your GitHub username is not set. Please use the task extension helper to set up your GitHub username correctly."
            }
            StatusCode::GithubTokenNotSet => {
                "Your GitHub token is not set. Please use the task extension helper to set up your GitHub token correctly."
            }
            StatusCode::GithubUsernameInvalid => {
                "Your GitHub username is invalid. Please use the task extension helper to set up your GitHub username correctly."
            }
            StatusCode::GithubTokenInvalid => {
                "Your GitHub token is invalid. Please use the task extension helper to set up your GitHub token correctly."
            }
            StatusCode::GithubUsernameIncorrect => {
                "Your GitHub username is incorrect. Please double check your GitHub username and make sure it is from the same account as your GitHub token."
            }
            StatusCode::GithubUnreachable => {
                "The GitHub API could not be reached. Please check your network connection; the check will run again next round."
            }
            StatusCode::GithubValid => "Your GitHub username and token are valid.",
        }
    }

    /// Action offered next to the remediation text
    pub fn action(&self) -> ActionLabel {
        match self {
            StatusCode::AnthropicKeyNoCredit
            | StatusCode::AnthropicUnreachable
            | StatusCode::GithubUnreachable => ActionLabel::Acknowledge,
            StatusCode::AnthropicKeyNotSet
            | StatusCode::AnthropicKeyInvalid
            | StatusCode::AnthropicValid
            | StatusCode::GithubUsernameNotSet
            | StatusCode::GithubTokenNotSet
            | StatusCode::GithubUsernameInvalid
            | StatusCode::GithubTokenInvalid
            | StatusCode::GithubUsernameIncorrect
            | StatusCode::GithubValid => ActionLabel::SetUpCredentials,
        }
    }

    pub fn credential(&self) -> Credential {
        match self {
            StatusCode::AnthropicKeyNotSet
            | StatusCode::AnthropicKeyInvalid
            | StatusCode::AnthropicKeyNoCredit
            | StatusCode::AnthropicUnreachable
            | StatusCode::AnthropicValid => Credential::Anthropic,
            StatusCode::GithubUsernameNotSet
            | StatusCode::GithubTokenNotSet
            | StatusCode::GithubUsernameInvalid
            | StatusCode::GithubTokenInvalid
            | StatusCode::GithubUsernameIncorrect
            | StatusCode::GithubUnreachable
            | StatusCode::GithubValid => Credential::Github,
        }
    }

    /// True only for the one success code of each credential
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::AnthropicValid | StatusCode::GithubValid)
    }

    /// The remote authority could not be reached; the credential itself may
    /// be fine
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StatusCode::AnthropicUnreachable | StatusCode::GithubUnreachable
        )
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
