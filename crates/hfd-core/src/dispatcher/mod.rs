//! Event dispatcher: maps each inbound event to state transitions plus at
//! most one outbound collaborator action.
//!
//! The dispatcher owns the download flags and the transfer tracker for one
//! transfer at a time. It performs no I/O of its own; every effect goes
//! through the collaborator traits, so the whole transition table is unit
//! testable against mocks.

use crate::config::WifiConfig;
use crate::event::{DisconnectReason, Event, HttpEvent, HttpRequest, LinkEvent, ResponseHead};
use crate::state::DownloadState;
use crate::tracker::TransferTracker;
use crate::transport::{HttpClient, LinkDriver, PacketSink};


pub struct Dispatcher {
    state: DownloadState,
    tracker: TransferTracker,
    request: HttpRequest,
    wifi: WifiConfig,
    receive_buffer_threshold: usize,
}

impl Dispatcher {
    pub fn new(request: HttpRequest, wifi: WifiConfig, receive_buffer_threshold: usize) -> Self {
        Self {
            state: DownloadState::NOT_READY,
            tracker: TransferTracker::new(),
            request,
            wifi,
            receive_buffer_threshold,
        }
    }

    /// Current download flags.
    pub fn flags(&self) -> DownloadState {
        self.state
    }

    pub fn tracker(&self) -> &TransferTracker {
        &self.tracker
    }

    /// True once the attempt reached `COMPLETED` or `CANCELED`.
    pub fn is_terminal(&self) -> bool {
        self.state.is_set(DownloadState::COMPLETED) || self.state.is_set(DownloadState::CANCELED)
    }

    /// Periodic re-arm: wipe the flags and assume the link is still up. The
    /// supervisor follows this with a fresh [`start_download`](Self::start_download).
    pub fn rearm(&mut self) {
        self.state.reset();
        self.state.set(DownloadState::WIFI_CONNECTED);
    }

    /// Issue the GET unless a guard rejects it. Rejections are logged, never
    /// errors: link and response events race, and a duplicate start must not
    /// produce a second concurrent request.
    pub fn start_download(&mut self, http: &mut dyn HttpClient) {
        if !self.state.is_set(DownloadState::WIFI_CONNECTED) {
            tracing::warn!("start_download: link is not connected");
            return;
        }
        if self.state.is_set(DownloadState::GET_REQUESTED) {
            tracing::warn!("start_download: request is sent already");
            return;
        }
        if self.state.is_set(DownloadState::DOWNLOADING) {
            tracing::warn!("start_download: download already running");
            return;
        }

        tracing::info!(url = %self.request.url, "sending HTTP request");
        if let Err(e) = http.send_request(&self.request) {
            tracing::warn!("start_download: transport rejected the request: {}", e);
        }
    }

    /// Feed one event through the transition table.
    pub fn handle(
        &mut self,
        event: Event,
        link: &mut dyn LinkDriver,
        http: &mut dyn HttpClient,
        sink: &mut dyn PacketSink,
    ) {
        match event {
            Event::Link(ev) => self.on_link(ev, link, http),
            Event::DnsResolved { host, addr } => {
                tracing::info!(%host, %addr, "resolved server address");
            }
            Event::Http(ev) => self.on_http(ev, http, sink),
        }
    }

    fn on_link(&mut self, event: LinkEvent, link: &mut dyn LinkDriver, http: &mut dyn HttpClient) {
        match event {
            LinkEvent::Connected => {
                tracing::info!("link connected; requesting address");
                if let Err(e) = link.request_address() {
                    tracing::warn!("address request failed: {}", e);
                }
            }
            LinkEvent::Disconnected => {
                tracing::warn!("link disconnected; reconnecting");
                self.state.clear(
                    DownloadState::WIFI_CONNECTED
                        | DownloadState::DOWNLOADING
                        | DownloadState::GET_REQUESTED,
                );
                if let Err(e) = link.connect(&self.wifi) {
                    tracing::warn!("link reconnect failed: {}", e);
                }
            }
            LinkEvent::IpAcquired(addr) => {
                tracing::info!(%addr, "address acquired");
                self.state.set(DownloadState::WIFI_CONNECTED);
                self.start_download(http);
            }
        }
    }

    fn on_http(&mut self, event: HttpEvent, http: &mut dyn HttpClient, sink: &mut dyn PacketSink) {
        match event {
            HttpEvent::SocketConnected => {
                tracing::debug!("HTTP client socket connected");
            }
            HttpEvent::Requested => {
                tracing::info!("request acknowledged");
                self.state.set(DownloadState::GET_REQUESTED);
            }
            HttpEvent::Response(head) => self.on_response(head, http, sink),
            HttpEvent::Chunk(chunk) => {
                if self.is_terminal() {
                    tracing::warn!(len = chunk.data.len(), "chunk after terminal state ignored");
                    return;
                }
                let complete = self.store_packet(&chunk.data, sink);
                if complete || chunk.is_final {
                    tracing::info!("download completed; closing connection");
                    self.finish(http, sink);
                }
            }
            HttpEvent::Disconnected(reason) => self.on_disconnect(reason, http),
        }
    }

    fn on_response(
        &mut self,
        head: ResponseHead,
        http: &mut dyn HttpClient,
        sink: &mut dyn PacketSink,
    ) {
        tracing::info!(code = head.code, size = head.content_length, "received response");
        if self.is_terminal() {
            tracing::warn!("response after terminal state ignored");
            return;
        }
        if head.code != 200 {
            self.state.set(DownloadState::CANCELED);
            return;
        }

        self.tracker.set_expected(head.content_length);
        if let Err(e) = sink.reset() {
            tracing::error!("sink reset failed: {}", e);
        }

        // Single-shot path: the whole body fit in the receive buffer, so no
        // chunk events will follow.
        if head.content_length <= self.receive_buffer_threshold as u64 {
            match head.body.as_deref() {
                Some(body) => {
                    self.store_packet(body, sink);
                }
                None => tracing::warn!("response body missing from single-shot response"),
            }
            tracing::info!("download completed in the initial response; closing connection");
            self.finish(http, sink);
        }
    }

    fn on_disconnect(&mut self, reason: DisconnectReason, http: &mut dyn HttpClient) {
        match reason {
            DisconnectReason::IdleClosed => {
                // Server closed the connection after the exchange. Normal.
                tracing::debug!("server closed the connection");
            }
            DisconnectReason::NoResponse => {
                tracing::warn!("server has not responded; retrying now");
                self.state
                    .clear(DownloadState::DOWNLOADING | DownloadState::GET_REQUESTED);
                self.start_download(http);
            }
            DisconnectReason::Other(code) => {
                tracing::warn!(code, "disconnected; waiting for the redownload timer");
            }
        }
    }

    /// Append one packet to the sink and account it. Returns true iff the
    /// tracker's byte count caught up with the expected size.
    fn store_packet(&mut self, data: &[u8], sink: &mut dyn PacketSink) -> bool {
        if data.is_empty() {
            tracing::warn!("store_packet: empty data");
            return false;
        }

        if !self.state.is_set(DownloadState::DOWNLOADING) {
            self.tracker.begin_attempt();
            self.state.set(DownloadState::DOWNLOADING);
        }

        if let Err(e) = sink.store(data) {
            tracing::error!("sink write failed: {}", e);
        }
        self.tracker.record(data.len() as u64)
    }

    fn finish(&mut self, http: &mut dyn HttpClient, sink: &mut dyn PacketSink) {
        self.state.set(DownloadState::COMPLETED);
        if let Err(e) = sink.commit() {
            tracing::error!("sink commit failed: {}", e);
        }
        http.close();
    }
}
