//! Retry supervisor: the cooperative poll loop driving the state machine.
//!
//! Each iteration pumps pending collaborator events into the dispatcher, then
//! services two software timers: a heartbeat (progress reporting) and the
//! stall/redownload timer, which is the sole periodic recovery path after a
//! completed or canceled attempt.

use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::TimerConfig;
use crate::dispatcher::Dispatcher;
use crate::event::Event;
use crate::state::DownloadState;
use crate::timer::Countdown;
use crate::transport::{HttpClient, LinkDriver, PacketSink};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Visual liveness indicator, toggled on every heartbeat; a stand-in for a
/// status LED.
pub trait Indicator {
    fn toggle(&mut self);
}

/// Indicator that does nothing.
#[derive(Debug, Default)]
pub struct NullIndicator;

impl Indicator for NullIndicator {
    fn toggle(&mut self) {}
}

pub struct Supervisor<C: Clock> {
    clock: C,
    dispatcher: Dispatcher,
    timers: TimerConfig,
    stall: Countdown,
    heartbeat: Countdown,
}

impl<C: Clock> Supervisor<C> {
    /// Build the supervisor and arm both timers. The stall timer's first
    /// deadline uses the initial (shorter) duration; every re-arm after a
    /// fire uses the recurring one.
    pub fn new(dispatcher: Dispatcher, clock: C, timers: TimerConfig) -> Self {
        let mut stall = Countdown::new();
        stall.arm_secs(&clock, timers.initial_stall_secs);
        let mut heartbeat = Countdown::new();
        heartbeat.arm_secs(&clock, timers.heartbeat_secs);
        Self {
            clock,
            dispatcher,
            timers,
            stall,
            heartbeat,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// One loop iteration: pump events, service timers. Deterministic given a
    /// manual clock, so tests drive it tick by tick.
    pub fn poll(
        &mut self,
        events: &Receiver<Event>,
        link: &mut dyn LinkDriver,
        http: &mut dyn HttpClient,
        sink: &mut dyn PacketSink,
        indicator: &mut dyn Indicator,
    ) {
        while let Ok(event) = events.try_recv() {
            self.dispatcher.handle(event, link, http, sink);
        }

        if self.heartbeat.is_expired(&self.clock) {
            indicator.toggle();
            tracing::debug!(
                stall_remaining_secs = self.stall.remaining_ms(&self.clock) / 1000,
                state = ?self.dispatcher.flags(),
                "heartbeat"
            );
            self.heartbeat.arm_secs(&self.clock, self.timers.heartbeat_secs);
        }

        if self.stall.is_expired(&self.clock) {
            self.stall
                .arm_secs(&self.clock, self.timers.recurring_stall_secs);
            tracing::info!("redownload timer expired");
            if self.dispatcher.is_terminal() {
                self.dispatcher.rearm();
                self.dispatcher.start_download(http);
            }
        }
    }

    /// Poll until the attempt reaches `COMPLETED` or `CANCELED`; returns the
    /// final flags. Used for one-shot downloads.
    pub fn run_until_terminal(
        &mut self,
        events: &Receiver<Event>,
        link: &mut dyn LinkDriver,
        http: &mut dyn HttpClient,
        sink: &mut dyn PacketSink,
        indicator: &mut dyn Indicator,
    ) -> DownloadState {
        loop {
            self.poll(events, link, http, sink, indicator);
            if self.dispatcher.is_terminal() {
                return self.dispatcher.flags();
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Poll forever, re-arming the download after each terminal state. This
    /// is the embedded deployment mode; it never returns.
    pub fn run(
        &mut self,
        events: &Receiver<Event>,
        link: &mut dyn LinkDriver,
        http: &mut dyn HttpClient,
        sink: &mut dyn PacketSink,
        indicator: &mut dyn Indicator,
    ) -> ! {
        loop {
            self.poll(events, link, http, sink, indicator);
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TickClock;
    use crate::config::WifiConfig;
    use crate::event::{HttpEvent, HttpRequest, LinkEvent, ResponseHead};
    use crate::transport::mock::{MockHttp, MockLink, MockSink};
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::mpsc::{self, Sender};

    #[derive(Default)]
    struct CountingIndicator {
        toggles: usize,
    }

    impl Indicator for CountingIndicator {
        fn toggle(&mut self) {
            self.toggles += 1;
        }
    }

    fn supervisor(clock: TickClock) -> Supervisor<TickClock> {
        let dispatcher = Dispatcher::new(
            HttpRequest::get("http://files.example.org/fw/image.bin"),
            WifiConfig::default(),
            4096,
        );
        Supervisor::new(dispatcher, clock, TimerConfig::default())
    }

    fn send_link_up(tx: &Sender<Event>) {
        tx.send(Event::Link(LinkEvent::IpAcquired(IpAddr::V4(
            Ipv4Addr::LOCALHOST,
        ))))
        .unwrap();
    }

    fn send_response(tx: &Sender<Event>, code: u32, content_length: u64, body: Option<Vec<u8>>) {
        tx.send(Event::Http(HttpEvent::Response(ResponseHead {
            code,
            content_length,
            body,
        })))
        .unwrap();
    }

    #[test]
    fn heartbeat_fires_every_second() {
        let clock = TickClock::new();
        let mut sup = supervisor(clock.clone());
        let (_tx, rx) = mpsc::channel();
        let (mut link, mut http, mut sink) = (
            MockLink::default(),
            MockHttp::default(),
            MockSink::default(),
        );
        let mut indicator = CountingIndicator::default();

        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(indicator.toggles, 0);

        clock.set(1000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(indicator.toggles, 1);

        clock.set(1500);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(indicator.toggles, 1);

        clock.set(2000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(indicator.toggles, 2);
    }

    #[test]
    fn stall_timer_initial_40s_then_recurring_60s() {
        let clock = TickClock::new();
        let mut sup = supervisor(clock.clone());
        let (tx, rx) = mpsc::channel();
        let (mut link, mut http, mut sink) = (
            MockLink::default(),
            MockHttp::default(),
            MockSink::default(),
        );
        let mut indicator = NullIndicator;

        send_link_up(&tx);
        send_response(&tx, 404, 0, None);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 1);
        assert!(sup.dispatcher().flags().is_set(DownloadState::CANCELED));

        // Not yet: the first grace period is 40s.
        clock.set(39_999);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 1);

        clock.set(40_000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 2);
        assert!(!sup.dispatcher().is_terminal());

        // The canceled state returns; the next re-arm happens 60s later.
        send_response(&tx, 404, 0, None);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        clock.set(99_999);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 2);

        clock.set(100_000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 3);
    }

    #[test]
    fn stall_expiry_mid_download_rearms_timer_but_not_the_attempt() {
        let clock = TickClock::new();
        let mut sup = supervisor(clock.clone());
        let (tx, rx) = mpsc::channel();
        let (mut link, mut http, mut sink) = (
            MockLink::default(),
            MockHttp::default(),
            MockSink::default(),
        );
        let mut indicator = NullIndicator;

        send_link_up(&tx);
        send_response(&tx, 200, 1_000_000, None);
        tx.send(Event::Http(HttpEvent::Chunk(crate::event::BodyChunk {
            data: vec![0u8; 4096],
            is_final: false,
        })))
        .unwrap();
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert!(sup.dispatcher().flags().is_set(DownloadState::DOWNLOADING));

        clock.set(40_000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        // No re-arm while the attempt is still live.
        assert_eq!(http.sent.len(), 1);
        assert!(sup.dispatcher().flags().is_set(DownloadState::DOWNLOADING));
    }

    #[test]
    fn completed_attempt_is_rearmed_on_the_next_cycle() {
        let clock = TickClock::new();
        let mut sup = supervisor(clock.clone());
        let (tx, rx) = mpsc::channel();
        let (mut link, mut http, mut sink) = (
            MockLink::default(),
            MockHttp::default(),
            MockSink::default(),
        );
        let mut indicator = NullIndicator;

        send_link_up(&tx);
        send_response(&tx, 200, 64, Some(vec![5u8; 64]));
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert!(sup.dispatcher().flags().is_set(DownloadState::COMPLETED));
        assert_eq!(sink.commits, 1);

        clock.set(40_000);
        sup.poll(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert_eq!(http.sent.len(), 2);
        assert!(!sup.dispatcher().is_terminal());
        assert!(sup
            .dispatcher()
            .flags()
            .is_set(DownloadState::WIFI_CONNECTED));
    }

    #[test]
    fn run_until_terminal_returns_final_flags() {
        let clock = TickClock::new();
        let mut sup = supervisor(clock);
        let (tx, rx) = mpsc::channel();
        let (mut link, mut http, mut sink) = (
            MockLink::default(),
            MockHttp::default(),
            MockSink::default(),
        );
        let mut indicator = NullIndicator;

        send_link_up(&tx);
        tx.send(Event::Http(HttpEvent::Requested)).unwrap();
        send_response(&tx, 200, 32, Some(vec![1u8; 32]));

        let flags = sup.run_until_terminal(&rx, &mut link, &mut http, &mut sink, &mut indicator);
        assert!(flags.is_set(DownloadState::COMPLETED));
        assert!(!flags.is_set(DownloadState::CANCELED));
    }
}
