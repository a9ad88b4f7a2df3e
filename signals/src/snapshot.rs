//! Congestion snapshot bound to a single block.

use aegis_types::{Digest, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// A captured set of congestion metrics. Immutable once bound to a block;
/// its digest is written into the rewards ledger so issuance is auditable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Pending transactions observed on the reference network.
    pub mempool_txs: u64,
    /// Pending bytes observed on the reference network.
    pub mempool_bytes: u64,
    /// Fast-confirmation fee rate (sat/vB-style units).
    pub fee_fast: u64,
    /// One-hour fee rate.
    pub fee_hour: u64,
    /// Economy fee rate.
    pub fee_econ: u64,
    /// Which collector produced this snapshot ("none" for the fallback).
    pub source_tag: String,
    /// When the snapshot was captured.
    pub captured_at: Timestamp,
}

impl SignalSnapshot {
    /// The zero-pressure fallback used when no fetch ever succeeded.
    pub fn zero(captured_at: Timestamp) -> Self {
        Self {
            mempool_txs: 0,
            mempool_bytes: 0,
            fee_fast: 0,
            fee_hour: 0,
            fee_econ: 0,
            source_tag: "none".to_string(),
            captured_at,
        }
    }

    /// Canonical byte form: big-endian integers in field order, then the
    /// length-prefixed source tag. No floating point anywhere.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let tag = self.source_tag.as_bytes();
        let mut buf = Vec::with_capacity(48 + 8 + tag.len());
        buf.extend_from_slice(&self.mempool_txs.to_be_bytes());
        buf.extend_from_slice(&self.mempool_bytes.to_be_bytes());
        buf.extend_from_slice(&self.fee_fast.to_be_bytes());
        buf.extend_from_slice(&self.fee_hour.to_be_bytes());
        buf.extend_from_slice(&self.fee_econ.to_be_bytes());
        buf.extend_from_slice(&(tag.len() as u64).to_be_bytes());
        buf.extend_from_slice(tag);
        buf.extend_from_slice(&self.captured_at.as_secs().to_be_bytes());
        buf
    }

    /// SHA-256 digest of the canonical form.
    pub fn digest(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical_bytes());
        Digest::new(hasher.finalize().into())
    }

    /// Whether this snapshot is still fresh at `now` for the given TTL.
    pub fn is_fresh(&self, now: Timestamp, ttl_secs: u64) -> bool {
        self.captured_at.elapsed_since(now) <= ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SignalSnapshot {
        SignalSnapshot {
            mempool_txs: 40_000,
            mempool_bytes: 12_000_000,
            fee_fast: 100,
            fee_hour: 60,
            fee_econ: 20,
            source_tag: "mempool.space".to_string(),
            captured_at: Timestamp::new(1_700_000_000),
        }
    }

    #[test]
    fn digest_is_deterministic_and_content_addressed() {
        assert_eq!(sample().digest(), sample().digest());

        let mut other = sample();
        other.fee_fast = 101;
        assert_ne!(other.digest(), sample().digest());
    }

    #[test]
    fn zero_snapshot_tags_none() {
        let z = SignalSnapshot::zero(Timestamp::new(5));
        assert_eq!(z.source_tag, "none");
        assert_eq!(z.fee_fast, 0);
        assert_eq!(z.mempool_txs, 0);
    }

    #[test]
    fn freshness_respects_ttl() {
        let snap = sample();
        let at = snap.captured_at;
        assert!(snap.is_fresh(at.saturating_add(30), 30));
        assert!(!snap.is_fresh(at.saturating_add(31), 30));
    }
}
