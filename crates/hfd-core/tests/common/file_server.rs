//! Minimal HTTP/1.1 server for integration tests: serves one static body.
//!
//! Every GET receives the same response, with a configurable status line, so
//! tests can exercise both the success and the canceled paths.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

/// Starts a server in a background thread serving `body` with 200 OK.
/// Returns the base URL (e.g. "http://127.0.0.1:12345/"). The server runs
/// until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_status(body, "200 OK")
}

/// Like `start` but with an arbitrary status line (e.g. "404 Not Found").
pub fn start_with_status(body: Vec<u8>, status: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, status));
        }
    });
    format!("http://127.0.0.1:{}/", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], status: &str) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));

    // Drain the request head; the content is irrelevant here.
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }

    let header = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes());
    let _ = stream.write_all(body);
}
