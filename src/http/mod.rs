//! Outbound HTTP layer used by the credential validators.
//!
//! Validators never open sockets themselves; they build an [`HttpRequest`]
//! and hand it to an [`HttpTransport`]. The production transport is
//! [`client::HttpClient`], a blocking HTTP/1.1 client with TLS provided by
//! rustls when the `tls` feature is enabled. Tests substitute scripted
//! transports.

pub mod client;

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub use client::{HttpClient, HttpConfig};

/// Errors raised below the HTTP status line: the request never produced a
/// usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("connection to {address} failed: {message}")]
    Connect { address: String, message: String },
    #[error("request to {address} timed out")]
    Timeout { address: String },
    #[error("TLS error: {message}")]
    Tls { message: String },
    #[error("HTTPS requires the `tls` feature; rebuild with --features tls")]
    TlsUnavailable,
    #[error("I/O error: {message}")]
    Io { message: String },
    #[error("malformed HTTP response: {message}")]
    MalformedResponse { message: String },
    #[error("invalid value for header '{name}'")]
    InvalidHeader { name: String },
}

/// URL scheme of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn default_port(&self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Base location of a remote API, e.g. `https://api.github.com` or
/// `http://127.0.0.1:8080/api/v3`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    /// Path prefix prepended to every request path, without trailing slash
    pub base_path: String,
}

impl Endpoint {
    /// HTTPS endpoint on the default port
    pub fn https(host: &str) -> Endpoint {
        Endpoint {
            scheme: Scheme::Https,
            host: host.to_string(),
            port: Scheme::Https.default_port(),
            base_path: String::new(),
        }
    }

    /// Parse a base URL. Only `http` and `https` are accepted; query strings
    /// and fragments are rejected.
    pub fn parse(url: &str) -> Result<Endpoint, TransportError> {
        let invalid = |reason: &str| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = url.trim();
        let (scheme, rest) = if let Some(rest) = trimmed.strip_prefix("https://") {
            (Scheme::Https, rest)
        } else if let Some(rest) = trimmed.strip_prefix("http://") {
            (Scheme::Http, rest)
        } else {
            return Err(invalid("expected an http:// or https:// URL"));
        };

        if rest.contains(['?', '#']) {
            return Err(invalid("query strings and fragments are not supported"));
        }

        let (authority, base_path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], rest[idx..].trim_end_matches('/')),
            None => (rest, ""),
        };

        // IPv6 literals keep their brackets: `[::1]:8080`
        let (host, port) = if authority.starts_with('[') {
            let close = authority
                .find(']')
                .ok_or_else(|| invalid("unterminated IPv6 address"))?;
            let (host, rest) = authority.split_at(close + 1);
            match rest {
                "" => (host, None),
                _ => match rest.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(invalid("unexpected characters after IPv6 address")),
                },
            }
        } else {
            match authority.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (authority, None),
            }
        };

        let port = match port {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| invalid(&format!("invalid port '{}'", port)))?,
            None => scheme.default_port(),
        };

        if host.is_empty() || host == "[]" {
            return Err(invalid("missing host"));
        }

        Ok(Endpoint {
            scheme,
            host: host.to_string(),
            port,
            base_path: base_path.to_string(),
        })
    }

    /// `host:port` used for the TCP connection
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Value of the `Host` header; the port is omitted when it is the default
    pub fn host_header(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            self.address()
        }
    }

    /// Full URL for a request path, used in diagnostics
    pub fn url(&self, path: &str) -> String {
        format!("{}://{}{}{}", self.scheme, self.host_header(), self.base_path, path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url(""))
    }
}

/// True when `name` is an HTTP header field name (an RFC 9110 token)
pub fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// True when `value` can be written on a single header line: no CR, LF, or
/// other control characters except horizontal tab
pub fn is_valid_header_value(value: &str) -> bool {
    value.bytes().all(|b| b == b'\t' || !b.is_ascii_control())
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// A single outbound request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub endpoint: Endpoint,
    /// Request path relative to the endpoint's base path, starting with `/`
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn get(endpoint: &Endpoint, path: &str) -> Self {
        HttpRequest {
            method: Method::Get,
            endpoint: endpoint.clone(),
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(endpoint: &Endpoint, path: &str, body: String) -> Self {
        HttpRequest {
            method: Method::Post,
            endpoint: endpoint.clone(),
            path: path.to_string(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Get a header value by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Request target as sent on the request line
    pub fn target(&self) -> String {
        format!("{}{}", self.endpoint.base_path, self.path)
    }

    /// Full URL, used in diagnostics
    pub fn url(&self) -> String {
        self.endpoint.url(&self.path)
    }
}

/// HTTP response from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body
    pub body: String,
}

impl HttpResponse {
    /// Convenience constructor for a response without headers
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Get a header value by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Deserialize the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Sends one request and returns the response, whatever its status.
///
/// Non-2xx statuses are responses, not errors; only failures to obtain a
/// response at all are reported as [`TransportError`].
pub trait HttpTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

impl<T: HttpTransport + ?Sized> HttpTransport for Arc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}
