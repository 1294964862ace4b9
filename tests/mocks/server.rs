//! Minimal local HTTP server for exercising the real client.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// A request as seen by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serves `connections` requests on 127.0.0.1 from a background thread, one
/// request per connection, answering each through `handler`.
pub struct MockServer {
    port: u16,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl MockServer {
    pub fn start<F>(connections: usize, handler: F) -> Self
    where
        F: Fn(&ReceivedRequest) -> (u16, String) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();

        thread::spawn(move || {
            for stream in listener.incoming().take(connections) {
                let Ok(stream) = stream else { continue };
                serve(stream, &handler, &log);
            }
        });

        MockServer { port, received }
    }

    /// Serve a raw byte response to the first connection
    pub fn raw(response: &'static [u8]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            if let Some(Ok(mut stream)) = listener.incoming().next() {
                let _ = read_request(&mut stream);
                let _ = stream.write_all(response);
            }
        });

        MockServer {
            port,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Serve `response` to the first connection one byte at a time, pausing
    /// `delay` between bytes
    pub fn trickle(response: &'static [u8], delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        thread::spawn(move || {
            if let Some(Ok(mut stream)) = listener.incoming().next() {
                let _ = read_request(&mut stream);
                for byte in response {
                    if stream.write_all(std::slice::from_ref(byte)).is_err() {
                        break;
                    }
                    thread::sleep(delay);
                }
            }
        });

        MockServer {
            port,
            received: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }
}

/// A local port with nothing listening on it
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

fn serve<F>(mut stream: TcpStream, handler: &F, log: &Mutex<Vec<ReceivedRequest>>)
where
    F: Fn(&ReceivedRequest) -> (u16, String),
{
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let (status, body) = handler(&request);
    log.lock().unwrap().push(request);
    let response = format!(
        "HTTP/1.1 {} Mock\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

fn read_request(stream: &mut TcpStream) -> Option<ReceivedRequest> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let target = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).ok()?;

    Some(ReceivedRequest {
        method,
        target,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}
