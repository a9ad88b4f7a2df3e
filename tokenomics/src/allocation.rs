//! Allocation buckets and vesting.
//!
//! The 100M total splits at genesis: Community 45M, Team 15M, Treasury 15M,
//! Founder 10M, Market 10M, Liquidity 5M. Community and Market form the
//! emission pool and are paid out through block subsidies; the other
//! buckets vest by cliff + linear schedule (Liquidity immediately).

use aegis_types::Timestamp;
use serde::{Deserialize, Serialize};

const MONTH_SECS: u64 = 30 * 24 * 3600;
const YEAR_SECS: u64 = 365 * 24 * 3600;

/// Sum of all bucket totals.
pub const TOTAL_ALLOCATION: u64 = 100_000_000;

/// Community + Market: issued algorithmically via block subsidies.
pub const EMISSION_POOL_TOTAL: u64 = 55_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Community,
    Team,
    Treasury,
    Founder,
    Market,
    Liquidity,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Bucket::Community,
        Bucket::Team,
        Bucket::Treasury,
        Bucket::Founder,
        Bucket::Market,
        Bucket::Liquidity,
    ];

    /// Genesis-fixed total for this bucket.
    pub fn total(&self) -> u64 {
        match self {
            Bucket::Community => 45_000_000,
            Bucket::Team => 15_000_000,
            Bucket::Treasury => 15_000_000,
            Bucket::Founder => 10_000_000,
            Bucket::Market => 10_000_000,
            Bucket::Liquidity => 5_000_000,
        }
    }

    /// Whether this bucket is paid from the emission pool rather than a
    /// vesting schedule.
    pub fn is_emission(&self) -> bool {
        matches!(self, Bucket::Community | Bucket::Market)
    }

    /// `(cliff_secs, linear_duration_secs)` for vesting buckets.
    fn schedule(&self) -> Option<(u64, u64)> {
        match self {
            Bucket::Team => Some((YEAR_SECS, 48 * MONTH_SECS)),
            Bucket::Treasury => Some((YEAR_SECS, 36 * MONTH_SECS)),
            Bucket::Founder => Some((YEAR_SECS, 48 * MONTH_SECS)),
            Bucket::Liquidity => None,
            Bucket::Community | Bucket::Market => None,
        }
    }
}

/// Amount of a bucket unlocked at `now`, with vesting anchored at
/// `start_ts` (normally the genesis timestamp).
///
/// Liquidity unlocks fully at genesis. Community and Market report zero
/// here: their release is the emission engine's `apply`, not vesting math.
pub fn vested(bucket: Bucket, start_ts: Timestamp, now: Timestamp) -> u64 {
    if bucket.is_emission() {
        return 0;
    }
    let total = bucket.total();
    let Some((cliff, duration)) = bucket.schedule() else {
        return total; // immediate (Liquidity)
    };

    let now = now.as_secs();
    let start = start_ts.as_secs();
    if now <= start.saturating_add(cliff) {
        return 0;
    }
    if duration == 0 {
        return total;
    }
    let elapsed = (now - start - cliff).min(duration);
    // floor(total * elapsed / duration), widened to avoid overflow.
    ((total as u128 * elapsed as u128) / duration as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_sum_to_total_supply() {
        let sum: u64 = Bucket::ALL.iter().map(|b| b.total()).sum();
        assert_eq!(sum, TOTAL_ALLOCATION);
    }

    #[test]
    fn emission_pool_is_community_plus_market() {
        assert_eq!(
            Bucket::Community.total() + Bucket::Market.total(),
            EMISSION_POOL_TOTAL
        );
    }

    #[test]
    fn liquidity_unlocks_at_genesis() {
        let genesis = Timestamp::new(1_700_000_000);
        assert_eq!(vested(Bucket::Liquidity, genesis, genesis), 5_000_000);
    }

    #[test]
    fn emission_buckets_never_vest() {
        let genesis = Timestamp::new(0);
        let far = Timestamp::new(u64::MAX / 2);
        assert_eq!(vested(Bucket::Community, genesis, far), 0);
        assert_eq!(vested(Bucket::Market, genesis, far), 0);
    }

    #[test]
    fn nothing_unlocks_before_the_cliff() {
        let genesis = Timestamp::new(1_700_000_000);
        let just_before = genesis.saturating_add(YEAR_SECS);
        assert_eq!(vested(Bucket::Team, genesis, just_before), 0);
        assert_eq!(vested(Bucket::Founder, genesis, just_before), 0);
    }

    #[test]
    fn linear_release_after_cliff() {
        let genesis = Timestamp::new(1_700_000_000);
        let half = genesis.saturating_add(YEAR_SECS + 18 * MONTH_SECS);
        // Treasury: 36-month linear; 18 months in = exactly half.
        assert_eq!(vested(Bucket::Treasury, genesis, half), 7_500_000);
    }

    #[test]
    fn fully_vested_at_schedule_end() {
        let genesis = Timestamp::new(1_700_000_000);
        let done = genesis.saturating_add(YEAR_SECS + 48 * MONTH_SECS);
        assert_eq!(vested(Bucket::Team, genesis, done), 15_000_000);
        assert_eq!(
            vested(Bucket::Team, genesis, done.saturating_add(1)),
            15_000_000
        );
    }

    #[test]
    fn vesting_is_monotone_in_time() {
        let genesis = Timestamp::new(1_000);
        let mut last = 0;
        for months in 0..=60 {
            let now = genesis.saturating_add(months * MONTH_SECS);
            let v = vested(Bucket::Founder, genesis, now);
            assert!(v >= last);
            last = v;
        }
        assert_eq!(last, 10_000_000);
    }
}
