//! Link driver for hosts whose network is already provisioned.
//!
//! Stands in for the Wi-Fi module: `connect` reports association immediately
//! and `request_address` reports the loopback address in place of a DHCP
//! lease. Events still flow through the channel so the state machine runs the
//! same transitions it would against real link hardware.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::mpsc::Sender;

use crate::config::WifiConfig;
use crate::event::{Event, LinkEvent};
use crate::transport::{LinkDriver, TransportError};

pub struct HostLink {
    events: Sender<Event>,
}

impl HostLink {
    pub fn new(events: Sender<Event>) -> Self {
        Self { events }
    }

    fn emit(&self, event: LinkEvent) -> Result<(), TransportError> {
        self.events
            .send(Event::Link(event))
            .map_err(|_| TransportError::Link("event channel closed".to_string()))
    }
}

impl LinkDriver for HostLink {
    fn connect(&mut self, wifi: &WifiConfig) -> Result<(), TransportError> {
        tracing::info!(ssid = %wifi.ssid, auth = ?wifi.auth, "joining network");
        self.emit(LinkEvent::Connected)
    }

    fn request_address(&mut self) -> Result<(), TransportError> {
        self.emit(LinkEvent::IpAcquired(IpAddr::V4(Ipv4Addr::LOCALHOST)))
    }
}
