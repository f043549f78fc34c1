#![allow(dead_code)]

//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed map of paths to bodies; unknown paths get 404. Paths can be
//! told to answer 503 a number of times before succeeding.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Default)]
pub struct Routes {
    bodies: HashMap<String, Vec<u8>>,
    failures: HashMap<String, usize>,
}

impl Routes {
    pub fn body(mut self, path: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(path.to_string(), body);
        self
    }

    /// Answer 503 `times` times before serving `path`.
    pub fn flaky(mut self, path: &str, times: usize) -> Self {
        self.failures.insert(path.to_string(), times);
        self
    }
}

/// Starts the server in a background thread and returns its base URL
/// without a trailing slash. Runs until the process exits.
pub fn start(routes: Routes) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let routes = Arc::new(Mutex::new(routes));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            thread::spawn(move || handle(stream, &routes));
        }
    });
    format!("http://127.0.0.1:{}", port)
}

fn handle(mut stream: std::net::TcpStream, routes: &Mutex<Routes>) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
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

    let (status, body) = {
        let mut routes = routes.lock().unwrap();
        match routes.failures.get_mut(&path) {
            Some(left) if *left > 0 => {
                *left -= 1;
                ("503 Service Unavailable", Vec::new())
            }
            _ => match routes.bodies.get(&path) {
                Some(body) => ("200 OK", body.clone()),
                None => ("404 Not Found", Vec::new()),
            },
        }
    };

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&body);
    let _ = stream.flush();
}

/// Deterministic, distinct content for chunk `index`.
pub fn chunk(index: u32) -> Vec<u8> {
    (0..(500 + index as usize * 13))
        .map(|i| (i as u32 ^ index) as u8)
        .collect()
}
