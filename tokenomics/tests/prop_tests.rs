use proptest::prelude::*;

use aegis_signals::SignalSnapshot;
use aegis_tokenomics::subsidy;
use aegis_types::{ChainParams, Timestamp};

fn snapshot(fee_fast: u64, mempool_txs: u64) -> SignalSnapshot {
    SignalSnapshot {
        fee_fast,
        mempool_txs,
        ..SignalSnapshot::zero(Timestamp::new(1_000))
    }
}

proptest! {
    /// Subsidy never exceeds the remaining supply.
    #[test]
    fn never_exceeds_remaining(
        height in 0u64..6_000_000,
        minted in 0u64..=100_000_000,
        fee_fast in 0u64..1_000,
        mempool_txs in 0u64..1_000_000,
    ) {
        let params = ChainParams::default();
        let s = subsidy(&params, height, minted, &snapshot(fee_fast, mempool_txs));
        prop_assert!(s <= params.total_supply - minted.min(params.total_supply));
    }

    /// Monotonically non-increasing in minted supply for a fixed snapshot.
    #[test]
    fn non_increasing_in_minted(
        height in 0u64..5_000_000,
        minted in 0u64..100_000_000,
        step in 1u64..1_000_000,
        fee_fast in 0u64..500,
    ) {
        let params = ChainParams::default();
        let signals = snapshot(fee_fast, 0);
        let lo = subsidy(&params, height, minted, &signals);
        let hi = subsidy(&params, height, minted.saturating_add(step).min(100_000_000), &signals);
        prop_assert!(hi <= lo);
    }

    /// Monotonically non-decreasing in congestion pressure.
    #[test]
    fn non_decreasing_in_pressure(
        height in 0u64..5_000_000,
        minted in 0u64..90_000_000,
        fee_a in 0u64..500,
        bump in 0u64..500,
    ) {
        let params = ChainParams::default();
        let calm = subsidy(&params, height, minted, &snapshot(fee_a, 0));
        let busy = subsidy(&params, height, minted, &snapshot(fee_a + bump, 0));
        prop_assert!(busy >= calm);
    }

    /// Emitting block by block never overshoots the cap and conserves
    /// minted + remaining.
    #[test]
    fn emission_conserves_supply(seed_minted in 99_990_000u64..100_000_000) {
        let params = ChainParams::default();
        let signals = snapshot(0, 0);
        let mut minted = seed_minted;
        for round in 0..5_000u64 {
            let height = params.target_blocks().saturating_sub(100) + round;
            let s = subsidy(&params, height, minted, &signals);
            minted += s;
            prop_assert!(minted <= params.total_supply);
            if s == 0 {
                break;
            }
        }
        prop_assert!(minted <= params.total_supply);
    }
}
