//! Nonce search with cooperative cancellation.

use crate::difficulty::{hash_meets_target, MAX_BITS};
use crate::error::WorkError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The cancellation flag is checked once per this many nonces, so a cancel
/// takes effect at the next stride boundary.
pub const CANCEL_STRIDE: u64 = 1 << 16;

/// Shared flag that stops an in-flight search.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A found proof of work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    /// The header timestamp the solution was found under. Equal to the
    /// starting timestamp unless the 64-bit nonce space was exhausted.
    pub timestamp: u64,
}

/// CPU nonce search.
pub struct Miner;

impl Miner {
    /// Search for a nonce such that `header_hash(timestamp, nonce)` meets
    /// the target. On nonce-space exhaustion the timestamp is bumped by one
    /// second and the search restarts from nonce zero.
    ///
    /// The closure must hash the full candidate header for the given
    /// `(timestamp, nonce)` pair; the miner imposes no header layout.
    pub fn solve<F>(
        &self,
        mut timestamp: u64,
        bits: u32,
        cancel: &CancelToken,
        header_hash: F,
    ) -> Result<Solution, WorkError>
    where
        F: Fn(u64, u64) -> [u8; 32],
    {
        if bits > MAX_BITS {
            return Err(WorkError::InvalidBits(bits));
        }
        loop {
            let mut nonce: u64 = 0;
            loop {
                if nonce % CANCEL_STRIDE == 0 && cancel.is_cancelled() {
                    return Err(WorkError::Cancelled);
                }
                let hash = header_hash(timestamp, nonce);
                if hash_meets_target(&hash, bits) {
                    return Ok(Solution { nonce, timestamp });
                }
                match nonce.checked_add(1) {
                    Some(next) => nonce = next,
                    None => break,
                }
            }
            timestamp = timestamp.saturating_add(1);
        }
    }
}
