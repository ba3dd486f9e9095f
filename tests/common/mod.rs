//! Shared utilities for integration testing.

use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a mock registry serving fixed JSON bodies per endpoint.
///
/// Knows the three registry routes the gateway consumes; anything else
/// gets a 404. A `{{path}}` token in the template body is replaced with
/// the requested path so tests can observe the fetch parameters.
pub async fn start_mock_registry(
    config_json: String,
    template_json: String,
    domains_json: String,
) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            let config_json = config_json.clone();
            let template_json = template_json.clone();
            let domains_json = domains_json.clone();
            tokio::spawn(async move {
                let Some((socket, path, _head)) = read_request(socket).await else {
                    return;
                };
                let (status, body) = if path.starts_with("/api/v1/template/") {
                    ("200 OK", template_json.replace("{{path}}", &path))
                } else if path.starts_with("/api/v1/router_domains") {
                    ("200 OK", domains_json)
                } else if path.starts_with("/api/v1/config") {
                    ("200 OK", config_json)
                } else {
                    ("404 Not Found", "{}".to_string())
                };
                respond(socket, status, "application/json", &body).await;
            });
        }
    });

    addr
}

/// Start a mock composition engine echoing the forwarding headers.
///
/// Responds 200 with a body of the form
/// `composed host=<x-request-host> uri=<x-request-uri>`.
pub async fn start_mock_engine() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let Some((socket, _path, head)) = read_request(socket).await else {
                    return;
                };
                let host = header_value(&head, "x-request-host").unwrap_or_default();
                let uri = header_value(&head, "x-request-uri").unwrap_or_default();
                let body = format!("composed host={host} uri={uri}");
                respond(socket, "200 OK", "text/html; charset=utf-8", &body).await;
            });
        }
    });

    addr
}

/// Read the request head; returns the socket, path and raw header block.
async fn read_request(mut socket: TcpStream) -> Option<(TcpStream, String, String)> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&buffer).to_string();
    let request_line = head.lines().next()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();
    Some((socket, path, head))
}

fn header_value(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}

async fn respond(mut socket: TcpStream, status: &str, content_type: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
