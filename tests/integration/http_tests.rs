//! HTTP client and validators over a real local socket.

use std::time::{Duration, Instant};

use credential_precheck::checks::{AnthropicValidator, Credentials, GithubValidator, StatusCode};
use credential_precheck::config::PrecheckConfig;
use credential_precheck::engine::store::MemoryStore;
use credential_precheck::http::{
    Endpoint, HttpClient, HttpConfig, HttpRequest, HttpTransport, TransportError,
};
use credential_precheck::run_precheck;

use crate::mocks::{closed_port_url, MockServer, RecordingLogger, GOOD_KEY};

fn endpoint(server: &MockServer) -> Endpoint {
    Endpoint::parse(&server.base_url()).unwrap()
}

#[test]
fn test_client_get_round_trip() {
    let server = MockServer::start(1, |_| (200, r#"{"login": "alice"}"#.to_string()));
    let request = HttpRequest::get(&endpoint(&server), "/user").header("Authorization", "token t");

    let response = HttpClient::new().send(&request).unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"login": "alice"}"#);
    assert_eq!(response.get_header("content-type"), Some("application/json"));

    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].method, "GET");
    assert_eq!(received[0].target, "/user");
    assert_eq!(received[0].header("Authorization"), Some("token t"));
    assert!(received[0].header("Host").unwrap().starts_with("127.0.0.1:"));
}

#[test]
fn test_client_post_sends_body() {
    let server = MockServer::start(1, |request| (201, request.body.clone()));
    let request = HttpRequest::post(&endpoint(&server), "/echo", r#"{"a": 1}"#.to_string());

    let response = HttpClient::new().send(&request).unwrap();

    assert_eq!(response.status, 201);
    assert_eq!(response.body, r#"{"a": 1}"#);
    assert_eq!(server.received()[0].header("Content-Length"), Some("8"));
}

#[test]
fn test_client_honours_base_path() {
    let server = MockServer::start(1, |_| (200, "{}".to_string()));
    let base = Endpoint::parse(&format!("{}/api/v3", server.base_url())).unwrap();

    HttpClient::new().send(&HttpRequest::get(&base, "/user")).unwrap();

    assert_eq!(server.received()[0].target, "/api/v3/user");
}

#[test]
fn test_client_decodes_chunked_body() {
    let server = MockServer::raw(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    );

    let response = HttpClient::new()
        .send(&HttpRequest::get(&endpoint(&server), "/"))
        .unwrap();

    assert_eq!(response.body, "hello world");
}

#[test]
fn test_client_rejects_garbage_response() {
    let server = MockServer::raw(b"this is not http\r\n\r\n");

    let result = HttpClient::new().send(&HttpRequest::get(&endpoint(&server), "/"));

    assert!(matches!(result, Err(TransportError::MalformedResponse { .. })));
}

#[test]
fn test_client_reports_refused_connection() {
    let base = Endpoint::parse(&closed_port_url()).unwrap();

    let result = HttpClient::new().send(&HttpRequest::get(&base, "/"));

    assert!(matches!(
        result,
        Err(TransportError::Connect { .. }) | Err(TransportError::Timeout { .. })
    ));
}

#[test]
fn test_client_rejects_oversized_chunk_size() {
    let server = MockServer::raw(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nffffffffffffffff\r\nab",
    );

    let result = HttpClient::new().send(&HttpRequest::get(&endpoint(&server), "/"));

    assert!(matches!(result, Err(TransportError::MalformedResponse { .. })));
}

#[test]
fn test_client_rejects_oversized_response() {
    let server = MockServer::start(1, |_| (200, "x".repeat(64 * 1024)));
    let config = HttpConfig {
        max_response_bytes: 4 * 1024,
        ..HttpConfig::default()
    };

    let result = HttpClient::with_config(config).send(&HttpRequest::get(&endpoint(&server), "/"));

    assert!(matches!(result, Err(TransportError::MalformedResponse { .. })));
}

#[test]
fn test_client_timeout_bounds_whole_exchange() {
    let server = MockServer::trickle(
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        Duration::from_millis(100),
    );
    let client = HttpClient::with_config(HttpConfig::with_timeout_ms(300));

    let start = Instant::now();
    let result = client.send(&HttpRequest::get(&endpoint(&server), "/"));

    assert!(matches!(result, Err(TransportError::Timeout { .. })));
    assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
}

#[test]
fn test_client_never_sends_header_with_line_break() {
    let server = MockServer::start(1, |_| (200, "{}".to_string()));
    let request = HttpRequest::get(&endpoint(&server), "/user")
        .header("Authorization", "token tok\r\nX-Injected: yes");

    let result = HttpClient::new().send(&request);

    assert!(matches!(result, Err(TransportError::InvalidHeader { .. })));
    assert!(server.received().is_empty());
}

#[test]
fn test_github_token_with_line_break_is_rejected_before_sending() {
    let server = MockServer::start(3, |_| (200, r#"{"login": "alice"}"#.to_string()));

    let validator = GithubValidator::with_endpoint(HttpClient::new(), endpoint(&server));
    assert_eq!(
        validator
            .validate(Some("alice"), Some("tok\r\nX-Injected: yes"))
            .status(),
        StatusCode::GithubTokenInvalid
    );
    assert!(server.received().is_empty());
}

#[test]
fn test_anthropic_validator_over_socket() {
    let server = MockServer::start(1, |request| {
        if request.header("x-api-key") == Some(GOOD_KEY) && request.target == "/v1/messages" {
            (200, r#"{"type": "message"}"#.to_string())
        } else {
            (401, r#"{"error": {"message": "invalid x-api-key"}}"#.to_string())
        }
    });

    let validator = AnthropicValidator::with_endpoint(HttpClient::new(), endpoint(&server));
    assert_eq!(validator.validate(Some(GOOD_KEY)).status(), StatusCode::AnthropicValid);
    assert!(server.received()[0].body.contains("\"max_tokens\":1"));
}

#[test]
fn test_github_validator_over_socket() {
    let server = MockServer::start(3, |request| match request.target.as_str() {
        "/users/alice" => (200, r#"{"login": "alice"}"#.to_string()),
        "/user" if request.header("Authorization") == Some("token tok") => {
            (200, r#"{"login": "Alice"}"#.to_string())
        }
        _ => (401, r#"{"message": "Bad credentials"}"#.to_string()),
    });

    let validator = GithubValidator::with_endpoint(HttpClient::new(), endpoint(&server));
    assert_eq!(
        validator.validate(Some("alice"), Some("tok")).status(),
        StatusCode::GithubValid
    );
    assert_eq!(server.received().len(), 3);
}

#[test]
fn test_validators_report_unreachable_api() {
    let base = Endpoint::parse(&closed_port_url()).unwrap();
    let client = HttpClient::with_config(HttpConfig::with_timeout_ms(2_000));

    let anthropic = AnthropicValidator::with_endpoint(&client, base.clone());
    assert_eq!(anthropic.validate(Some(GOOD_KEY)).status(), StatusCode::AnthropicUnreachable);

    let github = GithubValidator::with_endpoint(&client, base);
    assert_eq!(
        github.validate(Some("alice"), Some("tok")).status(),
        StatusCode::GithubUnreachable
    );
}

#[test]
fn test_run_precheck_against_local_apis() {
    let server = MockServer::start(4, |request| match request.target.as_str() {
        "/v1/messages" => (200, "{}".to_string()),
        "/users/alice" => (200, "{}".to_string()),
        "/user" => (200, r#"{"login": "mallory"}"#.to_string()),
        _ => (404, "{}".to_string()),
    });

    let mut config = PrecheckConfig::default();
    config.anthropic.base_url = server.base_url();
    config.github.base_url = server.base_url();

    let store = MemoryStore::new();
    let logger = RecordingLogger::new();
    let credentials = Credentials::new(
        Some(GOOD_KEY.to_string()),
        Some("alice".to_string()),
        Some("tok".to_string()),
    );

    let error = run_precheck(&config, "21", &credentials, &store, &logger).unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::GithubUsernameIncorrect));
    assert_eq!(store.get("result-21"), Some("GitHub username is incorrect".to_string()));
    assert_eq!(logger.entries().len(), 1);
}
