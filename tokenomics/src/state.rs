//! Persistent emission state (`token_state.json`).

use aegis_types::Timestamp;
use serde::{Deserialize, Serialize};

use crate::allocation::EMISSION_POOL_TOTAL;

/// Emission bookkeeping, mirrored to disk after every applied block.
///
/// Invariants: `minted_total <= emission pool where possible` and
/// `remaining_pool = emission_pool_total - minted_total` (saturating; the
/// consensus supply cap is the chain's `total_supply`, which test fixtures
/// may preload beyond the pool).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionState {
    pub emission_pool_total: u64,
    pub remaining_pool: u64,
    pub minted_total: u64,
    pub epoch_length_sec: u64,
    pub genesis_ts: Timestamp,
    pub last_emission_ts: Timestamp,
    pub last_reward: u64,
}

impl EmissionState {
    /// Fresh state anchored at the genesis timestamp.
    pub fn genesis(genesis_ts: Timestamp) -> Self {
        Self {
            emission_pool_total: EMISSION_POOL_TOTAL,
            remaining_pool: EMISSION_POOL_TOTAL,
            minted_total: 0,
            epoch_length_sec: 86_400,
            genesis_ts,
            last_emission_ts: genesis_ts,
            last_reward: 0,
        }
    }

    /// Record one applied block's minted subsidy.
    pub fn record(&mut self, minted: u64, block_ts: Timestamp) {
        self.minted_total = self.minted_total.saturating_add(minted);
        self.remaining_pool = self.emission_pool_total.saturating_sub(self.minted_total);
        self.last_reward = minted;
        self.last_emission_ts = block_ts;
    }

    /// Whole epochs elapsed since genesis at `now`.
    pub fn epochs_elapsed(&self, now: Timestamp) -> u64 {
        self.genesis_ts.elapsed_since(now) / self.epoch_length_sec.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_state_is_full_pool() {
        let st = EmissionState::genesis(Timestamp::new(1_000));
        assert_eq!(st.emission_pool_total, 55_000_000);
        assert_eq!(st.remaining_pool, 55_000_000);
        assert_eq!(st.minted_total, 0);
        assert_eq!(st.epoch_length_sec, 86_400);
    }

    #[test]
    fn record_keeps_pool_identity() {
        let mut st = EmissionState::genesis(Timestamp::new(1_000));
        st.record(19, Timestamp::new(1_060));
        assert_eq!(st.minted_total, 19);
        assert_eq!(st.remaining_pool, 55_000_000 - 19);
        assert_eq!(st.last_reward, 19);
        assert_eq!(st.last_emission_ts, Timestamp::new(1_060));

        st.record(10, Timestamp::new(1_120));
        assert_eq!(st.minted_total, 29);
        assert_eq!(st.remaining_pool, 55_000_000 - 29);
    }

    #[test]
    fn remaining_pool_saturates_past_the_pool() {
        let mut st = EmissionState::genesis(Timestamp::new(0));
        st.record(60_000_000, Timestamp::new(60));
        assert_eq!(st.remaining_pool, 0);
        assert_eq!(st.minted_total, 60_000_000);
    }

    #[test]
    fn epochs_elapsed_counts_whole_days() {
        let st = EmissionState::genesis(Timestamp::new(1_000));
        assert_eq!(st.epochs_elapsed(Timestamp::new(1_000)), 0);
        assert_eq!(st.epochs_elapsed(Timestamp::new(1_000 + 86_399)), 0);
        assert_eq!(st.epochs_elapsed(Timestamp::new(1_000 + 86_400)), 1);
        assert_eq!(st.epochs_elapsed(Timestamp::new(1_000 + 3 * 86_400 + 5)), 3);
    }

    #[test]
    fn json_field_names_are_stable() {
        let st = EmissionState::genesis(Timestamp::new(7));
        let json = serde_json::to_value(&st).unwrap();
        for key in [
            "emission_pool_total",
            "remaining_pool",
            "minted_total",
            "epoch_length_sec",
            "genesis_ts",
            "last_emission_ts",
            "last_reward",
        ] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
    }
}
