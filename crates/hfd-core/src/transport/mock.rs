//! Test doubles for the collaborator traits, shared by dispatcher and
//! supervisor tests.

use crate::config::WifiConfig;
use crate::event::HttpRequest;
use crate::transport::{HttpClient, LinkDriver, PacketSink, TransportError};

#[derive(Default)]
pub(crate) struct MockHttp {
    pub sent: Vec<HttpRequest>,
    pub closes: usize,
}

impl HttpClient for MockHttp {
    fn send_request(&mut self, request: &HttpRequest) -> Result<(), TransportError> {
        self.sent.push(request.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

#[derive(Default)]
pub(crate) struct MockLink {
    pub connects: usize,
    pub address_requests: usize,
}

impl LinkDriver for MockLink {
    fn connect(&mut self, _wifi: &WifiConfig) -> Result<(), TransportError> {
        self.connects += 1;
        Ok(())
    }

    fn request_address(&mut self) -> Result<(), TransportError> {
        self.address_requests += 1;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct MockSink {
    pub resets: usize,
    pub commits: usize,
    pub data: Vec<u8>,
}

impl PacketSink for MockSink {
    fn reset(&mut self) -> anyhow::Result<()> {
        self.resets += 1;
        self.data.clear();
        Ok(())
    }

    fn store(&mut self, data: &[u8]) -> anyhow::Result<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> anyhow::Result<()> {
        self.commits += 1;
        Ok(())
    }
}
