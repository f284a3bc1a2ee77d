//! Received-vs-expected byte accounting for one transfer attempt.

/// Tracks how much of the announced content length has arrived.
///
/// The dispatcher owns the attempt lifecycle: it calls [`set_expected`] when
/// response headers parse, [`begin_attempt`] when the first body byte of an
/// attempt arrives, and [`record`] per packet. The tracker itself never
/// touches state flags.
///
/// [`set_expected`]: Self::set_expected
/// [`begin_attempt`]: Self::begin_attempt
/// [`record`]: Self::record
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferTracker {
    expected: u64,
    received: u64,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content length announced by the response headers. 0 until known.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Bytes received so far in the current attempt.
    pub fn received(&self) -> u64 {
        self.received
    }

    /// Record the announced content length; zeroes the received count so a
    /// stale count from an aborted attempt cannot satisfy completion.
    pub fn set_expected(&mut self, size: u64) {
        self.expected = size;
        self.received = 0;
    }

    /// Start a new attempt: zero the received count.
    pub fn begin_attempt(&mut self) {
        self.received = 0;
    }

    /// Account `len` received bytes. Returns true iff the attempt is now
    /// complete (received caught up with a known, nonzero content length).
    pub fn record(&mut self, len: u64) -> bool {
        self.received = self.received.saturating_add(len);
        tracing::info!(
            packet = len,
            received = self.received,
            expected = self.expected,
            "stored body data"
        );
        self.expected > 0 && self.received >= self.expected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completes_exactly_when_received_reaches_expected() {
        let mut t = TransferTracker::new();
        t.set_expected(100);
        t.begin_attempt();
        assert!(!t.record(40));
        assert!(!t.record(59));
        assert!(t.record(1));
        assert_eq!(t.received(), 100);
    }

    #[test]
    fn overshoot_still_completes() {
        let mut t = TransferTracker::new();
        t.set_expected(10);
        assert!(t.record(32));
    }

    #[test]
    fn unknown_expected_never_completes() {
        let mut t = TransferTracker::new();
        assert!(!t.record(4096));
        assert!(!t.record(4096));
        assert_eq!(t.received(), 8192);
    }

    #[test]
    fn set_expected_zeroes_received() {
        let mut t = TransferTracker::new();
        t.set_expected(50);
        t.record(30);
        t.set_expected(50);
        assert_eq!(t.received(), 0);
        assert!(!t.record(20));
        assert!(t.record(30));
    }

    #[test]
    fn begin_attempt_restarts_the_count() {
        let mut t = TransferTracker::new();
        t.set_expected(100);
        t.record(60);
        t.begin_attempt();
        assert_eq!(t.received(), 0);
        assert_eq!(t.expected(), 100);
    }
}
