//! Minimal HTTP/1.1 server for integration tests.
//!
//! Each path gets a script of replies (status, body, delay before answering).
//! Requests walk through the script; the last reply repeats. Hits are counted
//! per path so tests can tell whether the network was touched.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Default)]
struct Routes {
    scripts: HashMap<String, Vec<Reply>>,
    hits: HashMap<String, usize>,
}

pub struct PageServer {
    base: String,
    routes: Arc<Mutex<Routes>>,
}

impl PageServer {
    /// Starts a server in a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let routes = Arc::new(Mutex::new(Routes::default()));
        let shared = Arc::clone(&routes);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &routes));
            }
        });
        Self {
            base: format!("http://127.0.0.1:{}", port),
            routes,
        }
    }

    /// Registers the reply script for `path` and returns its full URL.
    pub fn route(&self, path: &str, replies: Vec<Reply>) -> String {
        assert!(!replies.is_empty());
        self.routes
            .lock()
            .unwrap()
            .scripts
            .insert(path.to_string(), replies);
        format!("{}{}", self.base, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.routes
            .lock()
            .unwrap()
            .hits
            .get(path)
            .copied()
            .unwrap_or(0)
    }
}

fn handle(mut stream: TcpStream, routes: &Mutex<Routes>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    let reply = {
        let mut routes = routes.lock().unwrap();
        let seen = {
            let hits = routes.hits.entry(path.clone()).or_insert(0);
            *hits += 1;
            *hits
        };
        routes
            .scripts
            .get(&path)
            .map(|script| script[(seen - 1).min(script.len() - 1)].clone())
            .unwrap_or_else(|| Reply::status(404, ""))
    };

    if !reply.delay.is_zero() {
        thread::sleep(reply.delay);
    }
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        reply.status,
        reason(reply.status),
        reply.body.len(),
        reply.body
    );
    let _ = stream.write_all(response.as_bytes());
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}
