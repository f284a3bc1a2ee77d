//! Link, DNS, and HTTP client events; the request the core issues.
//!
//! Collaborator adapters translate whatever their backend reports into these
//! enums and push them onto the supervisor's event channel. The dispatcher
//! consumes them synchronously from the poll loop.

use std::collections::HashMap;
use std::net::IpAddr;

/// Events delivered to the supervisor's poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Link(LinkEvent),
    /// DNS resolution result; logged, never acted on directly.
    DnsResolved { host: String, addr: IpAddr },
    Http(HttpEvent),
}

/// Link-layer notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Associated, no address yet.
    Connected,
    /// Link lost.
    Disconnected,
    /// Address acquired; the link is usable.
    IpAcquired(IpAddr),
}

/// HTTP client callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HttpEvent {
    /// Transport socket connected to the server.
    SocketConnected,
    /// Request written and acknowledged by the transport.
    Requested,
    /// Response headers parsed.
    Response(ResponseHead),
    /// A piece of the response body.
    Chunk(BodyChunk),
    /// Connection closed, with the transport's reason.
    Disconnected(DisconnectReason),
}

/// Parsed response headers, plus the body when it fit entirely inside the
/// client's receive buffer (the single-shot path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub code: u32,
    pub content_length: u64,
    pub body: Option<Vec<u8>>,
}

/// One body chunk. `is_final` is the transport's explicit end-of-body marker;
/// completion is also reached when the byte count catches up with the
/// announced content length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyChunk {
    pub data: Vec<u8>,
    pub is_final: bool,
}

/// Why the transport closed the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// Server closed an idle connection after a completed exchange. Normal.
    IdleClosed,
    /// Server never responded; retry immediately.
    NoResponse,
    /// Anything else, with the transport's native code.
    Other(i32),
}

/// HTTP method. GET is the only supported method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
}

/// The request the dispatcher hands to the HTTP collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Plain GET with no extra headers.
    pub fn get(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }
}
