//! libcurl-backed HTTP client adapter.
//!
//! Runs each GET on a worker thread and translates libcurl's callbacks into
//! the event stream the dispatcher consumes: `SocketConnected` and `Requested`
//! when the first header line arrives, `Response` once the status and content
//! length are known, `Chunk` per body write, and `Disconnected` with a
//! classified reason when the transfer ends. Bodies no larger than the
//! receive-buffer threshold are delivered inline with the `Response` event,
//! matching the single-shot path of the state machine.

use std::cell::{Cell, RefCell};
use std::net::ToSocketAddrs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::event::{BodyChunk, DisconnectReason, Event, HttpEvent, HttpRequest, ResponseHead};
use crate::transport::{HttpClient, TransportError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(300);

/// How long `send_request` waits for the previous worker to wind down. A
/// worker that just reported a disconnect exits almost immediately, and the
/// immediate-retry path re-requests in the same poll iteration.
const WORKER_EXIT_GRACE_MS: u64 = 100;

/// HTTP client over libcurl. One request at a time; progress arrives on the
/// event channel, never through return values.
pub struct CurlHttpClient {
    events: Sender<Event>,
    receive_buffer_threshold: usize,
    cancel: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl CurlHttpClient {
    pub fn new(events: Sender<Event>, receive_buffer_threshold: usize) -> Self {
        Self {
            events,
            receive_buffer_threshold,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl HttpClient for CurlHttpClient {
    fn send_request(&mut self, request: &HttpRequest) -> Result<(), TransportError> {
        let parsed = url::Url::parse(&request.url)
            .map_err(|_| TransportError::InvalidUrl(request.url.clone()))?;

        if let Some(handle) = self.worker.take() {
            let mut waited = 0;
            while !handle.is_finished() && waited < WORKER_EXIT_GRACE_MS {
                std::thread::sleep(Duration::from_millis(1));
                waited += 1;
            }
            if !handle.is_finished() {
                self.worker = Some(handle);
                return Err(TransportError::RequestInFlight);
            }
            let _ = handle.join();
        }

        self.cancel.store(false, Ordering::Relaxed);

        let url = request.url.clone();
        let headers: Vec<String> = request
            .headers
            .iter()
            .map(|(k, v)| format!("{}: {}", k.trim(), v.trim()))
            .collect();
        let threshold = self.receive_buffer_threshold;
        let tx = self.events.clone();
        let cancel = Arc::clone(&self.cancel);

        self.worker = Some(std::thread::spawn(move || {
            resolve_and_report(&parsed, &tx);
            if let Err(e) = run_transfer(&url, &headers, threshold, &tx, &cancel) {
                if cancel.load(Ordering::Relaxed) {
                    // Aborted by close(); the state machine asked for it.
                    return;
                }
                let reason = classify_disconnect(&e);
                tracing::debug!(code = e.code(), "transfer ended with error: {}", e);
                let _ = tx.send(Event::Http(HttpEvent::Disconnected(reason)));
            }
        }));

        Ok(())
    }

    fn close(&mut self) {
        self.cancel.store(true, Ordering::Relaxed);
    }
}

impl Drop for CurlHttpClient {
    fn drop(&mut self) {
        // Abort any in-flight transfer; the worker exits on its own.
        self.cancel.store(true, Ordering::Relaxed);
    }
}

/// Resolve the host ourselves first so the resolved address gets logged the
/// way the DNS callback used to report it. libcurl resolves again internally.
fn resolve_and_report(parsed: &url::Url, tx: &Sender<Event>) {
    let Some(host) = parsed.host_str() else {
        return;
    };
    let port = parsed.port_or_known_default().unwrap_or(80);
    if let Ok(mut addrs) = (host, port).to_socket_addrs() {
        if let Some(addr) = addrs.next() {
            let _ = tx.send(Event::DnsResolved {
                host: host.to_string(),
                addr: addr.ip(),
            });
        }
    }
}

/// Perform the GET, streaming events as libcurl delivers headers and body.
fn run_transfer(
    url: &str,
    header_lines: &[String],
    threshold: usize,
    tx: &Sender<Event>,
    cancel: &AtomicBool,
) -> Result<(), curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.connect_timeout(CONNECT_TIMEOUT)?;
    easy.timeout(TRANSFER_TIMEOUT)?;

    if !header_lines.is_empty() {
        let mut list = curl::easy::List::new();
        for line in header_lines {
            list.append(line)?;
        }
        easy.http_headers(list)?;
    }

    let code = Cell::new(0u32);
    let content_length = Cell::new(0u64);
    let first_header = Cell::new(true);
    let announced = Cell::new(false);
    let buffering = Cell::new(false);
    let inline = RefCell::new(Vec::<u8>::new());

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|line| {
            if first_header.get() {
                first_header.set(false);
                let _ = tx.send(Event::Http(HttpEvent::SocketConnected));
                let _ = tx.send(Event::Http(HttpEvent::Requested));
            }
            if let Ok(s) = std::str::from_utf8(line) {
                let s = s.trim();
                if s.starts_with("HTTP/") {
                    // New header block (redirects restart it); last one wins.
                    if let Some(c) = s
                        .split_whitespace()
                        .nth(1)
                        .and_then(|t| t.parse::<u32>().ok())
                    {
                        code.set(c);
                        content_length.set(0);
                    }
                } else if let Some((name, value)) = s.split_once(':') {
                    if name.trim().eq_ignore_ascii_case("content-length") {
                        if let Ok(n) = value.trim().parse::<u64>() {
                            content_length.set(n);
                        }
                    }
                }
            }
            true
        })?;
        transfer.write_function(|data| {
            if cancel.load(Ordering::Relaxed) {
                // Short write aborts the transfer.
                return Ok(0);
            }
            if code.get() != 200 {
                // Announce the failing status once; the error body is noise.
                if !announced.get() {
                    announced.set(true);
                    let _ = tx.send(Event::Http(HttpEvent::Response(ResponseHead {
                        code: code.get(),
                        content_length: content_length.get(),
                        body: None,
                    })));
                }
                return Ok(data.len());
            }
            if !announced.get() && !buffering.get() {
                let cl = content_length.get();
                if cl > 0 && cl <= threshold as u64 {
                    buffering.set(true);
                } else {
                    announced.set(true);
                    let _ = tx.send(Event::Http(HttpEvent::Response(ResponseHead {
                        code: 200,
                        content_length: cl,
                        body: None,
                    })));
                }
            }
            if buffering.get() {
                inline.borrow_mut().extend_from_slice(data);
            } else {
                let _ = tx.send(Event::Http(HttpEvent::Chunk(BodyChunk {
                    data: data.to_vec(),
                    is_final: false,
                })));
            }
            Ok(data.len())
        })?;
        transfer.perform()?;
    }

    let final_code = easy.response_code().unwrap_or_else(|_| code.get());

    if !announced.get() {
        // Whole body (possibly empty) was buffered: the single-shot path.
        let body = inline.into_inner();
        let cl = if content_length.get() > 0 {
            content_length.get()
        } else {
            body.len() as u64
        };
        let body = if final_code == 200 { Some(body) } else { None };
        let _ = tx.send(Event::Http(HttpEvent::Response(ResponseHead {
            code: final_code,
            content_length: cl,
            body,
        })));
    } else if code.get() == 200 && content_length.get() == 0 {
        // Length was never announced; mark the end of the body explicitly.
        let _ = tx.send(Event::Http(HttpEvent::Chunk(BodyChunk {
            data: Vec::new(),
            is_final: true,
        })));
    }

    let _ = tx.send(Event::Http(HttpEvent::Disconnected(
        DisconnectReason::IdleClosed,
    )));
    Ok(())
}

/// Map libcurl failures onto the disconnect taxonomy: unreachable or silent
/// servers retry immediately, everything else waits for the supervisor cycle.
fn classify_disconnect(e: &curl::Error) -> DisconnectReason {
    if e.is_operation_timedout() || e.is_couldnt_connect() || e.is_couldnt_resolve_host() {
        DisconnectReason::NoResponse
    } else {
        DisconnectReason::Other(e.code() as i32)
    }
}
