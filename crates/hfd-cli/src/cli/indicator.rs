//! Console stand-in for the heartbeat LED.

use hfd_core::supervisor::Indicator;
use std::io::Write;

/// Alternates a marker on stderr each heartbeat so a watching operator can
/// see the loop is alive even when nothing is downloading.
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    lit: bool,
}

impl Indicator for ConsoleIndicator {
    fn toggle(&mut self) {
        self.lit = !self.lit;
        let mut err = std::io::stderr().lock();
        let _ = write!(err, "\r{} ", if self.lit { '*' } else { '.' });
        let _ = err.flush();
    }
}
