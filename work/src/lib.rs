//! Proof-of-work: compact difficulty targets, nonce search, retargeting.
//!
//! Difficulty is expressed as the number of leading zero bits the header
//! hash must carry (`bits`). Miners and verifiers apply the identical
//! comparison: `hash <= target(bits)` byte-lexicographically.

pub mod difficulty;
pub mod error;
pub mod miner;
pub mod retarget;

pub use difficulty::{hash_meets_target, target_from_bits, MAX_BITS};
pub use error::WorkError;
pub use miner::{CancelToken, Miner, Solution};
pub use retarget::next_bits;
