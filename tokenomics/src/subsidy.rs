//! Supply-capped dynamic subsidy.
//!
//! Integer arithmetic only: the baseline and result are plain u64 and the
//! congestion multiplier is computed in parts-per-million, so every node
//! floors to the identical value. There is no smoothing here and no clock
//! read; the result is a pure function of `(height, minted, snapshot)`.

use aegis_signals::SignalSnapshot;
use aegis_types::ChainParams;

const PPM: u128 = 1_000_000;

/// Pressure saturates at 3.0 (3,000,000 ppm).
const MAX_PRESSURE_PPM: u128 = 3_000_000;

/// The multiplier bonus saturates at +0.75.
const MAX_BONUS_PPM: u128 = 750_000;

/// A fee_fast of 50 sat/vB maps to pressure 1.0.
const FEE_PRESSURE_SCALE: u128 = 50;

/// A reference mempool of 50,000 txs maps to pressure 1.0.
const MEMPOOL_PRESSURE_SCALE: u128 = 50_000;

/// Compute the block subsidy for a block at `height` given the units
/// already minted and the bound congestion snapshot.
pub fn subsidy(
    params: &ChainParams,
    height: u64,
    minted_total: u64,
    signals: &SignalSnapshot,
) -> u64 {
    let remaining = match params.total_supply.checked_sub(minted_total) {
        Some(0) | None => return if params.tail_emission { 1 } else { 0 },
        Some(r) => r,
    };

    let target_blocks = params.target_blocks();
    let remaining_blocks = target_blocks.saturating_sub(height).max(1);
    let baseline = (remaining / remaining_blocks).max(1);

    let fee_pressure = (signals.fee_fast as u128 * PPM / FEE_PRESSURE_SCALE).min(MAX_PRESSURE_PPM);
    let mempool_pressure =
        (signals.mempool_txs as u128 * PPM / MEMPOOL_PRESSURE_SCALE).min(MAX_PRESSURE_PPM);
    let pressure = fee_pressure.max(mempool_pressure);

    // multiplier = 1.0 + min(0.75, 0.25 * pressure)
    let multiplier_ppm = PPM + (pressure / 4).min(MAX_BONUS_PPM);

    let scaled = (baseline as u128 * multiplier_ppm / PPM) as u64;
    scaled
        .clamp(params.min_subsidy, params.max_subsidy)
        .min(remaining)
}
