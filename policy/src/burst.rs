//! Per-sender burst tracking.
//!
//! Counts a sender's accepted transactions inside a trailing 60-second
//! window, keyed entirely by transaction timestamps. Replaying the chain
//! rebuilds the identical window, so burst-affected decisions are
//! reproducible offline.

use aegis_types::{Address, Timestamp};
use std::collections::{HashMap, VecDeque};

/// Sliding-window counter of accepted transactions per sender.
#[derive(Clone, Debug)]
pub struct BurstWindow {
    window_secs: u64,
    by_sender: HashMap<Address, VecDeque<u64>>,
}

impl Default for BurstWindow {
    fn default() -> Self {
        Self::new(60)
    }
}

impl BurstWindow {
    pub fn new(window_secs: u64) -> Self {
        Self {
            window_secs,
            by_sender: HashMap::new(),
        }
    }

    /// Record an accepted transaction from `sender` at `ts`.
    pub fn record(&mut self, sender: &Address, ts: Timestamp) {
        let queue = self.by_sender.entry(sender.clone()).or_default();
        queue.push_back(ts.as_secs());
        Self::prune(queue, ts.as_secs(), self.window_secs);
    }

    /// How many of `sender`'s recorded transactions fall within the window
    /// ending at `at`.
    pub fn recent_count(&self, sender: &Address, at: Timestamp) -> u32 {
        let Some(queue) = self.by_sender.get(sender) else {
            return 0;
        };
        let cutoff = at.as_secs().saturating_sub(self.window_secs);
        queue
            .iter()
            .filter(|&&ts| ts >= cutoff && ts <= at.as_secs())
            .count() as u32
    }

    fn prune(queue: &mut VecDeque<u64>, now: u64, window_secs: u64) {
        let cutoff = now.saturating_sub(window_secs);
        while queue.front().is_some_and(|&ts| ts < cutoff) {
            queue.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Address {
        Address::new("alice")
    }

    #[test]
    fn counts_only_inside_the_window() {
        let mut w = BurstWindow::new(60);
        w.record(&alice(), Timestamp::new(1_000));
        w.record(&alice(), Timestamp::new(1_030));
        w.record(&alice(), Timestamp::new(1_059));

        assert_eq!(w.recent_count(&alice(), Timestamp::new(1_059)), 3);
        // 1_000 falls out of the window ending at 1_061.
        assert_eq!(w.recent_count(&alice(), Timestamp::new(1_061)), 2);
        assert_eq!(w.recent_count(&alice(), Timestamp::new(2_000)), 0);
    }

    #[test]
    fn senders_are_independent() {
        let mut w = BurstWindow::new(60);
        let bob = Address::new("bob");
        w.record(&alice(), Timestamp::new(1_000));
        w.record(&alice(), Timestamp::new(1_001));
        w.record(&bob, Timestamp::new(1_002));

        assert_eq!(w.recent_count(&alice(), Timestamp::new(1_002)), 2);
        assert_eq!(w.recent_count(&bob, Timestamp::new(1_002)), 1);
    }

    #[test]
    fn future_entries_do_not_count_backwards() {
        let mut w = BurstWindow::new(60);
        w.record(&alice(), Timestamp::new(2_000));
        // Asking about an earlier moment ignores later activity.
        assert_eq!(w.recent_count(&alice(), Timestamp::new(1_500)), 0);
    }

    #[test]
    fn unknown_sender_is_zero() {
        let w = BurstWindow::new(60);
        assert_eq!(w.recent_count(&alice(), Timestamp::new(1_000)), 0);
    }
}
