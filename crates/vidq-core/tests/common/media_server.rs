//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves fixed bodies by request path. Routes can be added after start
//! (so manifests can point back at the server's own URL) and can trickle
//! their body to keep a transfer in flight.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: Vec<u8>,
    /// When set, the body is written in small chunks with this pause between them.
    pub chunk_delay: Option<Duration>,
}

impl Route {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            chunk_delay: None,
        }
    }

    pub fn slow(body: impl Into<Vec<u8>>, chunk_delay: Duration) -> Self {
        Self {
            chunk_delay: Some(chunk_delay),
            ..Self::ok(body)
        }
    }
}

#[derive(Clone)]
pub struct MediaServer {
    pub base_url: String,
    routes: Arc<Mutex<HashMap<String, Route>>>,
}

impl MediaServer {
    /// Registers `route` at `path` (e.g. "/media/abc.mp4").
    pub fn route(&self, path: &str, route: Route) {
        self.routes.lock().unwrap().insert(path.to_string(), route);
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Starts a server in a background thread. The server runs until the process exits.
pub fn start() -> MediaServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes: Arc<Mutex<HashMap<String, Route>>> = Arc::default();
    let shared = Arc::clone(&routes);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&shared);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    MediaServer {
        base_url: format!("http://127.0.0.1:{}", port),
        routes,
    }
}

fn handle(mut stream: std::net::TcpStream, routes: &Mutex<HashMap<String, Route>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("/");
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
        return;
    }
    let route = routes.lock().unwrap().get(path).cloned();
    let Some(route) = route else {
        let _ = stream.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        return;
    };

    let header = format!(
        "HTTP/1.1 {} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        route.status,
        route.body.len()
    );
    if stream.write_all(header.as_bytes()).is_err() {
        return;
    }
    match route.chunk_delay {
        None => {
            let _ = stream.write_all(&route.body);
        }
        Some(delay) => {
            for chunk in route.body.chunks(64) {
                if stream.write_all(chunk).is_err() {
                    return;
                }
                let _ = stream.flush();
                thread::sleep(delay);
            }
        }
    }
}
