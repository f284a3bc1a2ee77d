//! Download progress flags.

use std::fmt;
use std::ops::BitOr;

/// Transfer progress as a set of independent flags (union-combined).
///
/// `COMPLETED` and `CANCELED` are terminal markers for one attempt and are
/// mutually exclusive; only an explicit [`reset`](Self::reset) clears them.
/// `GET_REQUESTED` and `DOWNLOADING` are intermediate and are cleared on
/// disconnect-and-retry.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadState(u8);

impl DownloadState {
    /// Empty set; initial and post-reset value.
    pub const NOT_READY: DownloadState = DownloadState(0);
    /// Link layer has an address.
    pub const WIFI_CONNECTED: DownloadState = DownloadState(1 << 0);
    /// GET sent and acknowledged by the transport.
    pub const GET_REQUESTED: DownloadState = DownloadState(1 << 1);
    /// At least one body byte received for the current attempt.
    pub const DOWNLOADING: DownloadState = DownloadState(1 << 2);
    /// Transfer finished.
    pub const COMPLETED: DownloadState = DownloadState(1 << 3);
    /// Non-success response or unrecoverable condition.
    pub const CANCELED: DownloadState = DownloadState(1 << 4);

    /// Clear every flag.
    pub fn reset(&mut self) {
        self.0 = 0;
    }

    /// Union `flags` in.
    pub fn set(&mut self, flags: DownloadState) {
        self.0 |= flags.0;
    }

    /// Remove `flags`.
    pub fn clear(&mut self, flags: DownloadState) {
        self.0 &= !flags.0;
    }

    /// True iff every flag in `flags` is present.
    pub fn is_set(&self, flags: DownloadState) -> bool {
        self.0 & flags.0 == flags.0
    }

    /// True iff no flag is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for DownloadState {
    type Output = DownloadState;

    fn bitor(self, rhs: DownloadState) -> DownloadState {
        DownloadState(self.0 | rhs.0)
    }
}

impl fmt::Debug for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "NOT_READY");
        }
        let names = [
            (DownloadState::WIFI_CONNECTED, "WIFI_CONNECTED"),
            (DownloadState::GET_REQUESTED, "GET_REQUESTED"),
            (DownloadState::DOWNLOADING, "DOWNLOADING"),
            (DownloadState::COMPLETED, "COMPLETED"),
            (DownloadState::CANCELED, "CANCELED"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.is_set(flag) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        Ok(())
    }
}
