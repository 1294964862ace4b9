//! GitHub username/token validation.
//!
//! The check is an ordered list of stages. Each stage either lets the next
//! one run or ends the check with a status code, so the reported failure
//! names the credential that is wrong: a missing value, an unknown username,
//! a rejected token, or a token that belongs to a different account.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{Credential, CredentialCheck, CredentialValidator, Credentials, StatusCode};
use crate::http::{
    is_valid_header_value, Endpoint, HttpRequest, HttpResponse, HttpTransport, TransportError,
};
use crate::version::user_agent;

pub const API_HOST: &str = "api.github.com";
const ACCEPT_V3: &str = "application/vnd.github.v3+json";

/// One step of the GitHub check, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    UsernamePresent,
    TokenPresent,
    UsernameExists,
    TokenAuthenticates,
    IdentityMatches,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::UsernamePresent,
        Stage::TokenPresent,
        Stage::UsernameExists,
        Stage::TokenAuthenticates,
        Stage::IdentityMatches,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::UsernamePresent => "username-present",
            Stage::TokenPresent => "token-present",
            Stage::UsernameExists => "username-exists",
            Stage::TokenAuthenticates => "token-authenticates",
            Stage::IdentityMatches => "identity-matches",
        };
        f.write_str(name)
    }
}

/// What a stage decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Continue,
    Done(StatusCode),
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

/// Validates a GitHub username and personal access token
pub struct GithubValidator<T> {
    transport: T,
    endpoint: Endpoint,
    user_agent: String,
}

impl<T: HttpTransport> GithubValidator<T> {
    /// Validator talking to the public GitHub API
    pub fn new(transport: T) -> Self {
        Self::with_endpoint(transport, Endpoint::https(API_HOST))
    }

    /// Validator talking to a specific API endpoint (e.g. GitHub Enterprise)
    pub fn with_endpoint(transport: T, endpoint: Endpoint) -> Self {
        GithubValidator {
            transport,
            endpoint,
            user_agent: user_agent(),
        }
    }

    /// Run every stage in order, stopping at the first one that decides.
    pub fn validate(&self, username: Option<&str>, token: Option<&str>) -> CredentialCheck {
        let username = username.filter(|u| !u.is_empty());
        let token = token.filter(|t| !t.is_empty());

        for stage in Stage::ORDER {
            match self.run_stage(stage, username, token) {
                StageOutcome::Continue => {
                    debug!(credential = "github", stage = %stage, "stage passed");
                }
                StageOutcome::Done(status) => {
                    info!(credential = "github", stage = %stage, status = %status, "{}", status.label());
                    return status.into();
                }
            }
        }

        info!(
            credential = "github",
            status = %StatusCode::GithubValid,
            "GitHub username and token are valid"
        );
        StatusCode::GithubValid.into()
    }

    /// Run a single stage. Network stages that are reached without a
    /// username or token report the matching "not set" status.
    pub fn run_stage(
        &self,
        stage: Stage,
        username: Option<&str>,
        token: Option<&str>,
    ) -> StageOutcome {
        match (stage, username, token) {
            (Stage::UsernamePresent, None, _) => StageOutcome::Done(StatusCode::GithubUsernameNotSet),
            (Stage::UsernamePresent, Some(_), _) => StageOutcome::Continue,
            (Stage::TokenPresent, _, None) => StageOutcome::Done(StatusCode::GithubTokenNotSet),
            // A token that cannot be sent as a header value cannot authenticate
            (Stage::TokenPresent, _, Some(token)) if !is_valid_header_value(token) => {
                StageOutcome::Done(StatusCode::GithubTokenInvalid)
            }
            (Stage::TokenPresent, _, Some(_)) => StageOutcome::Continue,
            (_, None, _) => StageOutcome::Done(StatusCode::GithubUsernameNotSet),
            (_, _, None) => StageOutcome::Done(StatusCode::GithubTokenNotSet),
            (Stage::UsernameExists, Some(username), Some(_)) => self.check_username(username),
            (Stage::TokenAuthenticates, Some(_), Some(token)) => self.check_token(token),
            (Stage::IdentityMatches, Some(username), Some(token)) => {
                self.check_identity(username, token)
            }
        }
    }

    fn check_username(&self, username: &str) -> StageOutcome {
        let path = format!("/users/{}", encode_path_segment(username));
        let request = HttpRequest::get(&self.endpoint, &path).header("User-Agent", &self.user_agent);

        match self.send(&request) {
            Ok(response) if response.status == 200 => StageOutcome::Continue,
            Ok(response) => {
                debug!(credential = "github", http_status = response.status, "username lookup rejected");
                StageOutcome::Done(StatusCode::GithubUsernameInvalid)
            }
            Err(_) => StageOutcome::Done(StatusCode::GithubUnreachable),
        }
    }

    fn check_token(&self, token: &str) -> StageOutcome {
        let request = self.authenticated_user_request(token);

        match self.send(&request) {
            Ok(response) if response.status == 200 => StageOutcome::Continue,
            Ok(response) => {
                debug!(credential = "github", http_status = response.status, "token rejected");
                StageOutcome::Done(StatusCode::GithubTokenInvalid)
            }
            Err(_) => StageOutcome::Done(StatusCode::GithubUnreachable),
        }
    }

    fn check_identity(&self, username: &str, token: &str) -> StageOutcome {
        let request = self
            .authenticated_user_request(token)
            .header("Accept", ACCEPT_V3);

        let response = match self.send(&request) {
            Ok(response) => response,
            Err(_) => return StageOutcome::Done(StatusCode::GithubUnreachable),
        };

        if response.status != 200 {
            debug!(credential = "github", http_status = response.status, "identity lookup rejected");
            return StageOutcome::Done(StatusCode::GithubUsernameIncorrect);
        }

        match response.json::<AuthenticatedUser>() {
            Ok(user) if user.login.to_lowercase() == username.to_lowercase() => {
                StageOutcome::Continue
            }
            Ok(user) => {
                info!(
                    credential = "github",
                    claimed = username,
                    token_owner = %user.login,
                    "token belongs to a different account"
                );
                StageOutcome::Done(StatusCode::GithubUsernameIncorrect)
            }
            Err(e) => {
                warn!(credential = "github", error = %e, "identity response has no readable login");
                StageOutcome::Done(StatusCode::GithubUsernameIncorrect)
            }
        }
    }

    fn authenticated_user_request(&self, token: &str) -> HttpRequest {
        HttpRequest::get(&self.endpoint, "/user")
            .header("Authorization", &format!("token {}", token))
            .header("User-Agent", &self.user_agent)
    }

    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.transport.send(request).map_err(|e| {
            warn!(
                credential = "github",
                url = %request.url(),
                error = %e,
                "GitHub API could not be reached"
            );
            e
        })
    }
}

impl<T: HttpTransport> CredentialValidator for GithubValidator<T> {
    fn credential(&self) -> Credential {
        Credential::Github
    }

    fn check(&self, credentials: &Credentials) -> CredentialCheck {
        self.validate(credentials.github_username(), credentials.github_token())
    }
}

/// Percent-encode everything outside the RFC 3986 unreserved set
fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
