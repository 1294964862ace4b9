//! Minimal blocking HTTP/1.1 client.
//!
//! Requests are sent over a fresh connection with `Connection: close` and the
//! response is read until the server closes it. HTTPS goes through rustls
//! with the webpki root store; without the `tls` feature only plain HTTP
//! endpoints can be reached.
//!
//! # Design Notes
//!
//! - Address resolution and connecting share the connect timeout
//! - Sending the request and reading the whole response share the I/O
//!   timeout; a peer trickling bytes cannot extend it
//! - Responses larger than `max_response_bytes` are rejected
//! - No retries: one request, one classification
//! - Chunked transfer encoding is decoded; other encodings are passed through

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{
    is_valid_header_name, is_valid_header_value, HttpRequest, HttpResponse, HttpTransport, Scheme,
    TransportError,
};

/// Default cap on the size of a response, headers included
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Configuration for HTTP requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Bound on address resolution plus connecting, in milliseconds
    pub connect_timeout_ms: u64,
    /// Bound on sending the request and reading the full response, in
    /// milliseconds
    pub io_timeout_ms: u64,
    /// Largest response accepted
    pub max_response_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            connect_timeout_ms: 10_000,
            io_timeout_ms: 10_000,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl HttpConfig {
    /// Same bound for connecting and for the exchange
    pub fn with_timeout_ms(timeout_ms: u64) -> Self {
        HttpConfig {
            connect_timeout_ms: timeout_ms,
            io_timeout_ms: timeout_ms,
            ..HttpConfig::default()
        }
    }

    fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.max(1))
    }

    fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms.max(1))
    }
}

/// Simple HTTP client
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    config: HttpConfig,
}

impl HttpTransport for HttpClient {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        debug!(method = %request.method, url = %request.url(), "sending request");

        let raw = self.build_request(request)?;
        let address = request.endpoint.address();
        let stream = self.connect(&address)?;
        let stream = DeadlineStream::new(stream, Instant::now() + self.config.io_timeout());

        let buffer = match request.endpoint.scheme {
            Scheme::Http => self.exchange_plain(stream, &raw, &address)?,
            Scheme::Https => self.exchange_tls(stream, &raw, request)?,
        };

        let response = parse_response(&buffer)?;
        debug!(status = response.status, url = %request.url(), "received response");
        Ok(response)
    }
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Self {
        HttpClient {
            config: HttpConfig::default(),
        }
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpConfig) -> Self {
        HttpClient { config }
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn connect(&self, address: &str) -> Result<TcpStream, TransportError> {
        let deadline = Instant::now() + self.config.connect_timeout();
        let addrs = resolve(address, self.config.connect_timeout())?;

        let mut last_error = None;
        for addr in addrs {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::Timeout {
                    address: address.to_string(),
                });
            }
            match TcpStream::connect_timeout(&addr, remaining) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_error = Some(e),
            }
        }

        Err(match last_error {
            Some(e) if is_timeout(&e) => TransportError::Timeout {
                address: address.to_string(),
            },
            Some(e) => TransportError::Connect {
                address: address.to_string(),
                message: e.to_string(),
            },
            None => TransportError::Connect {
                address: address.to_string(),
                message: "no addresses resolved".to_string(),
            },
        })
    }

    fn exchange_plain(
        &self,
        mut stream: DeadlineStream,
        raw: &[u8],
        address: &str,
    ) -> Result<Vec<u8>, TransportError> {
        stream.write_all(raw).map_err(|e| io_error(address, e))?;
        stream.flush().map_err(|e| io_error(address, e))?;
        read_until_close(&mut stream, address, self.config.max_response_bytes)
    }

    #[cfg(feature = "tls")]
    fn exchange_tls(
        &self,
        mut stream: DeadlineStream,
        raw: &[u8],
        request: &HttpRequest,
    ) -> Result<Vec<u8>, TransportError> {
        use std::sync::Arc;

        // IPv6 literals are bracketed in URLs but not in server names
        let host = request
            .endpoint
            .host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let address = request.endpoint.address();

        let root_store = rustls::RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };

        let config = rustls::ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let server_name = rustls::pki_types::ServerName::try_from(host.clone()).map_err(|_| {
            TransportError::Tls {
                message: format!("invalid server name: {}", host),
            }
        })?;

        let mut conn = rustls::ClientConnection::new(Arc::new(config), server_name).map_err(|e| {
            TransportError::Tls {
                message: format!("TLS setup failed: {}", e),
            }
        })?;

        let mut tls_stream = rustls::Stream::new(&mut conn, &mut stream);

        tls_stream.write_all(raw).map_err(|e| tls_io_error(&address, e))?;
        tls_stream.flush().map_err(|e| tls_io_error(&address, e))?;

        read_until_close(&mut tls_stream, &address, self.config.max_response_bytes)
    }

    #[cfg(not(feature = "tls"))]
    fn exchange_tls(
        &self,
        _stream: DeadlineStream,
        _raw: &[u8],
        _request: &HttpRequest,
    ) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::TlsUnavailable)
    }

    /// Serialize the request head and body. Header names and values that
    /// could not be written on a single line are rejected.
    fn build_request(&self, request: &HttpRequest) -> Result<Vec<u8>, TransportError> {
        let target = request.target();
        if target.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
            return Err(TransportError::InvalidUrl {
                url: request.url(),
                reason: "request target contains whitespace or control characters".to_string(),
            });
        }

        let host = request.endpoint.host_header();
        if !is_valid_header_value(&host) {
            return Err(TransportError::InvalidHeader {
                name: "Host".to_string(),
            });
        }

        let mut head = format!(
            "{} {} HTTP/1.1\r\n\
             Host: {}\r\n\
             Connection: close\r\n",
            request.method, target, host,
        );

        if let Some(ref body) = request.body {
            head.push_str(&format!("Content-Length: {}\r\n", body.len()));
        }

        for (name, value) in &request.headers {
            if !is_valid_header_name(name) || !is_valid_header_value(value) {
                return Err(TransportError::InvalidHeader { name: name.clone() });
            }
            head.push_str(&format!("{}: {}\r\n", name, value));
        }

        head.push_str("\r\n");

        let mut bytes = head.into_bytes();
        if let Some(ref body) = request.body {
            bytes.extend_from_slice(body.as_bytes());
        }
        Ok(bytes)
    }
}

/// Resolve `address` on a helper thread so a stalled resolver is bounded by
/// `timeout`. A resolver that never answers leaves its thread behind.
fn resolve(address: &str, timeout: Duration) -> Result<Vec<SocketAddr>, TransportError> {
    let (tx, rx) = mpsc::channel();
    let target = address.to_string();

    thread::Builder::new()
        .name("resolve".to_string())
        .spawn(move || {
            let _ = tx.send(target.to_socket_addrs().map(|addrs| addrs.collect::<Vec<_>>()));
        })
        .map_err(|e| io_error(address, e))?;

    match rx.recv_timeout(timeout) {
        Ok(Ok(addrs)) => Ok(addrs),
        Ok(Err(e)) => Err(TransportError::Connect {
            address: address.to_string(),
            message: format!("address resolution failed: {}", e),
        }),
        Err(RecvTimeoutError::Timeout) => Err(TransportError::Timeout {
            address: address.to_string(),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(TransportError::Connect {
            address: address.to_string(),
            message: "address resolution failed".to_string(),
        }),
    }
}

/// Socket whose reads and writes all draw on one deadline. Each operation
/// gets the time left; once it is spent, operations fail with `TimedOut`.
struct DeadlineStream {
    inner: TcpStream,
    deadline: Instant,
}

impl DeadlineStream {
    fn new(inner: TcpStream, deadline: Instant) -> Self {
        DeadlineStream { inner, deadline }
    }

    fn remaining(&self) -> io::Result<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded"))
        } else {
            Ok(remaining)
        }
    }
}

impl Read for DeadlineStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_read_timeout(Some(remaining))?;
        self.inner.read(buf)
    }
}

impl Write for DeadlineStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let remaining = self.remaining()?;
        self.inner.set_write_timeout(Some(remaining))?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

fn io_error(address: &str, e: io::Error) -> TransportError {
    if is_timeout(&e) {
        TransportError::Timeout {
            address: address.to_string(),
        }
    } else {
        TransportError::Io {
            message: format!("{}: {}", address, e),
        }
    }
}

#[cfg(feature = "tls")]
fn tls_io_error(address: &str, e: io::Error) -> TransportError {
    // rustls reports handshake and certificate failures as InvalidData
    if e.kind() == io::ErrorKind::InvalidData {
        TransportError::Tls {
            message: format!("{}: {}", address, e),
        }
    } else {
        io_error(address, e)
    }
}

fn read_until_close<R: Read>(
    reader: &mut R,
    address: &str,
    limit: usize,
) -> Result<Vec<u8>, TransportError> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        match reader.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buffer.extend_from_slice(&chunk[..n]);
                if buffer.len() > limit {
                    return Err(malformed(format!("response exceeds {} bytes", limit)));
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // Peers that close without a TLS close_notify
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !buffer.is_empty() => break,
            Err(e) => return Err(io_error(address, e)),
        }
    }

    Ok(buffer)
}

fn malformed(message: impl Into<String>) -> TransportError {
    TransportError::MalformedResponse {
        message: message.into(),
    }
}

/// Parse a complete HTTP/1.1 response
pub(crate) fn parse_response(buffer: &[u8]) -> Result<HttpResponse, TransportError> {
    let header_end = find_subsequence(buffer, b"\r\n\r\n")
        .ok_or_else(|| malformed("no header/body separator"))?;

    let header_section = String::from_utf8_lossy(&buffer[..header_end]);
    let body_bytes = &buffer[header_end + 4..];

    let mut lines = header_section.lines();
    let status_line = lines.next().ok_or_else(|| malformed("empty response"))?;
    let status = parse_status_line(status_line)?;

    let mut headers = Vec::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.to_ascii_lowercase().contains("chunked")
    });

    let body = if chunked {
        decode_chunked(body_bytes)?
    } else {
        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse::<usize>().ok());
        match content_length {
            Some(len) if len < body_bytes.len() => body_bytes[..len].to_vec(),
            _ => body_bytes.to_vec(),
        }
    };

    Ok(HttpResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

fn parse_status_line(line: &str) -> Result<u16, TransportError> {
    // Format: "HTTP/1.1 200 OK"
    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(version), Some(code)) if version.starts_with("HTTP/") => code
            .parse()
            .map_err(|_| malformed(format!("invalid status code: {}", code))),
        _ => Err(malformed(format!("invalid status line: {}", line))),
    }
}

fn decode_chunked(body: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut result = Vec::new();
    let mut remaining = body;

    loop {
        let size_end =
            find_subsequence(remaining, b"\r\n").ok_or_else(|| malformed("invalid chunked encoding"))?;

        let size_line = String::from_utf8_lossy(&remaining[..size_end]);
        // Chunk extensions follow a ';'
        let size_str = size_line.split(';').next().unwrap_or("").trim();
        let chunk_size = usize::from_str_radix(size_str, 16)
            .map_err(|_| malformed(format!("invalid chunk size: {}", size_str)))?;

        if chunk_size == 0 {
            break;
        }

        let chunk_start = size_end + 2;
        let chunk_end = chunk_start
            .checked_add(chunk_size)
            .ok_or_else(|| malformed("chunk size overflow"))?;

        if chunk_end > remaining.len() {
            // Truncated chunk, keep what arrived
            result.extend_from_slice(&remaining[chunk_start.min(remaining.len())..]);
            break;
        }

        result.extend_from_slice(&remaining[chunk_start..chunk_end]);
        let next = chunk_end
            .checked_add(2)
            .ok_or_else(|| malformed("chunk size overflow"))?;
        remaining = remaining.get(next..).unwrap_or(&[]);
        if remaining.is_empty() {
            break;
        }
    }

    Ok(result)
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
