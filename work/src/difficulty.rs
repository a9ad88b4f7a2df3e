//! Compact difficulty target.
//!
//! `bits` counts required leading zero bits. The target is the largest
//! 256-bit value with that many leading zeros; a header hash is valid when
//! `hash <= target`. `bits = 0` accepts every hash (devnet convenience).

/// Upper bound on `bits`. Beyond this the target is so small that no
/// realistic search terminates; treat larger values as invalid input.
pub const MAX_BITS: u32 = 240;

/// Compute the 32-byte target for a given leading-zero-bits difficulty.
pub fn target_from_bits(bits: u32) -> [u8; 32] {
    let bits = bits.min(256);
    let mut target = [0xFFu8; 32];
    let full_bytes = (bits / 8) as usize;
    for byte in target.iter_mut().take(full_bytes) {
        *byte = 0;
    }
    if full_bytes < 32 {
        let rem = bits % 8;
        target[full_bytes] = 0xFFu8 >> rem;
    }
    target
}

/// Whether a hash satisfies the difficulty: `hash <= target(bits)`.
pub fn hash_meets_target(hash: &[u8; 32], bits: u32) -> bool {
    hash <= &target_from_bits(bits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_bits_accepts_everything() {
        assert!(hash_meets_target(&[0xFF; 32], 0));
        assert!(hash_meets_target(&[0x00; 32], 0));
    }

    #[test]
    fn target_masks_leading_bits() {
        let t = target_from_bits(8);
        assert_eq!(t[0], 0x00);
        assert_eq!(t[1], 0xFF);

        let t = target_from_bits(12);
        assert_eq!(t[0], 0x00);
        assert_eq!(t[1], 0x0F);
        assert_eq!(t[2], 0xFF);
    }

    #[test]
    fn boundary_hash_is_accepted() {
        let target = target_from_bits(12);
        assert!(hash_meets_target(&target, 12));

        // One above the target must fail.
        let mut above = target;
        above[1] = 0x10;
        above[2] = 0x00;
        assert!(!hash_meets_target(&above, 12));
    }

    #[test]
    fn more_bits_means_harder() {
        // A hash with exactly 8 leading zero bits passes at 8, fails at 9.
        let mut hash = [0u8; 32];
        hash[1] = 0x80;
        assert!(hash_meets_target(&hash, 8));
        assert!(!hash_meets_target(&hash, 9));
    }

    #[test]
    fn saturates_at_256_bits() {
        let t = target_from_bits(400);
        assert_eq!(t, [0u8; 32]);
        assert!(hash_meets_target(&[0u8; 32], 400));
    }
}
