//! Test doubles for the transport seam

use crate::transport::{RequestOptions, RestRequest, RestResponse, Transport, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Replays canned outcomes in order and records every request it sees.
/// Once the script runs out, every call fails with a transport error.
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<RestResponse, TransportError>>>,
    requests: Mutex<Vec<RestRequest>>,
    options: Mutex<Vec<RequestOptions>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<RestResponse, TransportError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            requests: Mutex::new(Vec::new()),
            options: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: &str) -> Self {
        Self::new(vec![Ok(RestResponse::new(200, body))])
    }

    pub fn requests(&self) -> Vec<RestRequest> {
        self.requests.lock().clone()
    }

    /// Options passed with each attempt, in call order
    pub fn options(&self) -> Vec<RequestOptions> {
        self.options.lock().clone()
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(
        &self,
        request: &RestRequest,
        options: &RequestOptions,
    ) -> Result<RestResponse, TransportError> {
        self.requests.lock().push(request.clone());
        self.options.lock().push(options.clone());
        self.outcomes
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
    }
}

/// Serves one canned raw HTTP response per accepted connection on a
/// loopback port. The handle yields the raw request heads it received.
pub fn serve(responses: Vec<String>) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let mut heads = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 1024];
            let head_end = loop {
                if let Some(pos) = received.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break received.len();
                }
                received.extend_from_slice(&buf[..n]);
            };
            let head = String::from_utf8_lossy(&received[..head_end]).into_owned();

            // Drain the body so closing the socket does not reset the client.
            let body_len = content_length(&head);
            while received.len() < head_end + body_len {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                received.extend_from_slice(&buf[..n]);
            }
            heads.push(head);
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
        }
        heads
    });

    (port, handle)
}

/// Accepts one connection, reads the request head and never answers. The
/// thread ends once the client gives up and closes the socket.
pub fn serve_silently() -> (u16, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 1024];
        while let Ok(n) = stream.read(&mut buf) {
            if n == 0 {
                break;
            }
        }
    });

    (port, handle)
}

fn content_length(head: &str) -> usize {
    head.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}

pub fn http_response(status_line: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_line,
        body.len(),
        body
    )
}
