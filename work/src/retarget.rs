//! Difficulty retargeting.
//!
//! Every `retarget_interval` blocks the median of the recent inter-block
//! gaps is compared against the target block time. Each `bits` step is an
//! exact 2x difficulty change, so clamping the step to +/-2 enforces the
//! [1/4, 4] adjustment-ratio bound.

/// Compute the next difficulty from the recent block timestamps.
///
/// `timestamps` are the last `retarget_interval + 1` block timestamps in
/// chain order (older first); fewer than two leave `bits` unchanged. The
/// result is clamped to `[min_bits, max_bits]`.
pub fn next_bits(
    bits: u32,
    timestamps: &[u64],
    target_secs: u64,
    min_bits: u32,
    max_bits: u32,
) -> u32 {
    if timestamps.len() < 2 || target_secs == 0 {
        return bits;
    }

    let mut gaps: Vec<u64> = timestamps
        .windows(2)
        .map(|w| w[1].saturating_sub(w[0]))
        .collect();
    gaps.sort_unstable();
    let median = gaps[gaps.len() / 2].max(1);

    // Blocks arriving fast -> raise difficulty; slow -> lower it.
    let step: i32 = if median * 4 <= target_secs {
        2
    } else if median * 2 <= target_secs {
        1
    } else if median >= target_secs * 4 {
        -2
    } else if median >= target_secs * 2 {
        -1
    } else {
        0
    };

    bits.saturating_add_signed(step).clamp(min_bits, max_bits)
}
