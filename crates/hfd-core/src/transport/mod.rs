//! Collaborator seams: link driver, HTTP client, packet sink.
//!
//! The dispatcher talks to these traits only. Host adapters ([`CurlHttpClient`],
//! [`HostLink`], [`FileStore`](crate::storage::FileStore)) report back by
//! pushing [`Event`](crate::event::Event)s onto the supervisor's channel, the
//! way interrupt-driven drivers hand their results to a main loop.

mod curl_client;
mod error;
mod host_link;

#[cfg(test)]
pub(crate) mod mock;

pub use curl_client::CurlHttpClient;
pub use error::TransportError;
pub use host_link::HostLink;

use crate::config::WifiConfig;
use crate::event::HttpRequest;

/// Link-layer driver: joins a network and acquires an address.
///
/// Both operations complete asynchronously; outcomes arrive as
/// [`LinkEvent`](crate::event::LinkEvent)s.
pub trait LinkDriver {
    /// Start joining the configured network.
    fn connect(&mut self, wifi: &WifiConfig) -> Result<(), TransportError>;

    /// Start address acquisition (DHCP on real hardware).
    fn request_address(&mut self) -> Result<(), TransportError>;
}

/// HTTP client: issues one request at a time and reports progress as
/// [`HttpEvent`](crate::event::HttpEvent)s.
pub trait HttpClient {
    /// Hand the request to the transport. Acceptance here does not mean the
    /// request was sent; the transport confirms with `HttpEvent::Requested`.
    fn send_request(&mut self, request: &HttpRequest) -> Result<(), TransportError>;

    /// Tear down the current connection, aborting any in-flight transfer.
    fn close(&mut self);
}

/// Destination for the downloaded byte stream, append-in-order per attempt.
pub trait PacketSink {
    /// Discard anything from a previous attempt and start fresh.
    fn reset(&mut self) -> anyhow::Result<()>;

    /// Append one packet.
    fn store(&mut self, data: &[u8]) -> anyhow::Result<()>;

    /// Make the completed attempt durable.
    fn commit(&mut self) -> anyhow::Result<()>;
}
