//! Anthropic API key validation.
//!
//! A key is checked in three steps, cheapest first:
//!
//! 1. presence
//! 2. format (`sk-ant-` prefix and length), see [`super::format`]
//! 3. one Messages API call asking for a single output token
//!
//! The API call is classified by status: 200 is a usable key, 401 a rejected
//! key, 403 with a billing error a key without credit. Anything else is
//! treated as an invalid key.

use serde::Deserialize;
use tracing::{info, warn};

use super::format::is_valid_key_format;
use super::{Credential, CredentialCheck, CredentialValidator, Credentials, StatusCode};
use crate::http::{Endpoint, HttpRequest, HttpResponse, HttpTransport};

pub const API_HOST: &str = "api.anthropic.com";
const API_PATH: &str = "/v1/messages";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
const PROBE_MAX_TOKENS: u32 = 1;
const PROBE_PROMPT: &str = "Hi";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

/// Validates an Anthropic API key against the Messages API
pub struct AnthropicValidator<T> {
    transport: T,
    endpoint: Endpoint,
    model: String,
    api_version: String,
}

impl<T: HttpTransport> AnthropicValidator<T> {
    /// Validator talking to the public Anthropic API
    pub fn new(transport: T) -> Self {
        Self::with_endpoint(transport, Endpoint::https(API_HOST))
    }

    /// Validator talking to a specific API endpoint
    pub fn with_endpoint(transport: T, endpoint: Endpoint) -> Self {
        AnthropicValidator {
            transport,
            endpoint,
            model: DEFAULT_MODEL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    /// Set the model used for the probe request
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the `anthropic-version` header value
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.to_string();
        self
    }

    /// Validate `api_key`. Absent and malformed keys are rejected without a
    /// network call.
    pub fn validate(&self, api_key: Option<&str>) -> CredentialCheck {
        let api_key = match api_key {
            Some(key) if !key.is_empty() => key,
            _ => {
                info!(credential = "anthropic", status = %StatusCode::AnthropicKeyNotSet, "Anthropic API key is not set");
                return StatusCode::AnthropicKeyNotSet.into();
            }
        };

        if !is_valid_key_format(api_key) {
            info!(
                credential = "anthropic",
                status = %StatusCode::AnthropicKeyInvalid,
                "Anthropic API key doesn't match the expected format"
            );
            return StatusCode::AnthropicKeyInvalid.into();
        }

        let request = self.build_request(api_key);
        let status = match self.transport.send(&request) {
            Ok(response) => classify_response(&response),
            Err(e) => {
                warn!(
                    credential = "anthropic",
                    status = %StatusCode::AnthropicUnreachable,
                    url = %request.url(),
                    error = %e,
                    "Anthropic API could not be reached"
                );
                StatusCode::AnthropicUnreachable
            }
        };

        status.into()
    }

    fn build_request(&self, api_key: &str) -> HttpRequest {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": PROBE_MAX_TOKENS,
            "messages": [{"role": "user", "content": PROBE_PROMPT}],
        });

        HttpRequest::post(&self.endpoint, API_PATH, body.to_string())
            .header("x-api-key", api_key)
            .header("anthropic-version", &self.api_version)
            .header("content-type", "application/json")
    }
}

/// Map a Messages API response to a status code
fn classify_response(response: &HttpResponse) -> StatusCode {
    match response.status {
        200 => {
            info!(credential = "anthropic", status = %StatusCode::AnthropicValid, "API key is valid and has credit");
            return StatusCode::AnthropicValid;
        }
        401 => {
            info!(credential = "anthropic", status = %StatusCode::AnthropicKeyInvalid, "Invalid API key");
            return StatusCode::AnthropicKeyInvalid;
        }
        _ => {}
    }

    let message = match response.json::<ErrorBody>() {
        Ok(body) => body.error.and_then(|e| e.message),
        Err(e) => {
            warn!(
                credential = "anthropic",
                http_status = response.status,
                error = %e,
                "Unexpected response: body is not a JSON error"
            );
            return StatusCode::AnthropicKeyInvalid;
        }
    };

    let mentions_billing = message
        .as_deref()
        .map(|m| m.to_lowercase().contains("billing"))
        .unwrap_or(false);

    if response.status == 403 && mentions_billing {
        info!(
            credential = "anthropic",
            status = %StatusCode::AnthropicKeyNoCredit,
            "API key has no credit or is not authorized"
        );
        StatusCode::AnthropicKeyNoCredit
    } else {
        warn!(
            credential = "anthropic",
            http_status = response.status,
            api_message = message.as_deref().unwrap_or(""),
            "Unexpected response"
        );
        StatusCode::AnthropicKeyInvalid
    }
}

impl<T: HttpTransport> CredentialValidator for AnthropicValidator<T> {
    fn credential(&self) -> Credential {
        Credential::Anthropic
    }

    fn check(&self, credentials: &Credentials) -> CredentialCheck {
        self.validate(credentials.anthropic_api_key())
    }
}
