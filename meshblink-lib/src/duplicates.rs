//! Duplicate packet alerts from router statistics
//!
//! The router counts duplicate receptions and relays it canceled because a
//! neighbor already rebroadcast the packet. Both counters only grow. The
//! watcher samples them once per tick and turns an increase of the
//! duplicate counter into a single alert, however many duplicates arrived
//! since the last sample.

use log::debug;

use crate::color::AlertColor;

/// One sample of the router's duplicate counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouterCounters {
    pub rx_duplicate_count: u32,
    pub tx_relay_canceled_count: u32,
}

/// High-water marks of the router counters seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DuplicateCounters {
    pub last_seen_rx_dupe: u32,
    pub last_seen_tx_canceled: u32,
}

#[derive(Debug, Clone)]
pub struct DuplicateWatcher {
    alerts_enabled: bool,
    counters: DuplicateCounters,
}

impl DuplicateWatcher {
    /// Marks start at zero, so duplicates counted before the first poll
    /// produce one alert on that poll.
    #[must_use]
    pub fn new(alerts_enabled: bool) -> Self {
        Self {
            alerts_enabled,
            counters: DuplicateCounters::default(),
        }
    }

    #[must_use]
    pub const fn counters(&self) -> DuplicateCounters {
        self.counters
    }

    /// Compare a sample against the marks and advance them.
    ///
    /// Returns the duplicate alert color when the duplicate counter grew and
    /// alerts are enabled. A counter lower than its mark is ignored; marks
    /// never move backwards.
    pub fn poll(&mut self, sample: RouterCounters) -> Option<AlertColor> {
        let mut alert = None;

        if sample.rx_duplicate_count > self.counters.last_seen_rx_dupe {
            let new_dupes = sample.rx_duplicate_count - self.counters.last_seen_rx_dupe;
            debug!(
                "{new_dupes} new duplicate packet(s) detected (total: {})",
                sample.rx_duplicate_count
            );
            self.counters.last_seen_rx_dupe = sample.rx_duplicate_count;
            if self.alerts_enabled {
                alert = Some(AlertColor::AMBER);
            }
        }

        if sample.tx_relay_canceled_count > self.counters.last_seen_tx_canceled {
            let new_canceled = sample.tx_relay_canceled_count - self.counters.last_seen_tx_canceled;
            debug!(
                "{new_canceled} new relay cancellation(s) due to duplicates (total: {})",
                sample.tx_relay_canceled_count
            );
            self.counters.last_seen_tx_canceled = sample.tx_relay_canceled_count;
        }

        alert
    }
}
