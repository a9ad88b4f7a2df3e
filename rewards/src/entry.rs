//! Ledger entries and their canonical hash input.

use aegis_types::{Address, Digest, Timestamp};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// The caller-supplied portion of an entry. The ledger fills in `seq`,
/// `prev_hash`, and `entry_hash` on append.
#[derive(Clone, Debug)]
pub struct RewardDraft {
    pub block_height: u64,
    pub miner: Address,
    pub subsidy: u64,
    pub fees_total: u64,
    pub signals_digest: Digest,
    pub policy_decisions_digest: Digest,
    pub timestamp: Timestamp,
}

/// One line of the rewards ledger. Field order here is the canonical JSON
/// order; all hash fields serialize as lowercase hex.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardEntry {
    pub seq: u64,
    pub block_height: u64,
    pub miner: Address,
    pub subsidy: u64,
    pub fees_total: u64,
    pub signals_digest: Digest,
    pub policy_decisions_digest: Digest,
    pub timestamp: Timestamp,
    pub prev_hash: Digest,
    pub entry_hash: Digest,
}

impl RewardEntry {
    /// Canonical byte form of everything except `prev_hash`/`entry_hash`:
    /// fixed field order, big-endian integers, length-prefixed UTF-8, raw
    /// digest bytes. No floating point anywhere near this.
    pub fn canonical_fields(&self) -> Vec<u8> {
        let miner = self.miner.as_str().as_bytes();
        let mut buf = Vec::with_capacity(32 + 32 + 8 * 5 + miner.len());
        buf.extend_from_slice(&self.seq.to_be_bytes());
        buf.extend_from_slice(&self.block_height.to_be_bytes());
        buf.extend_from_slice(&(miner.len() as u64).to_be_bytes());
        buf.extend_from_slice(miner);
        buf.extend_from_slice(&self.subsidy.to_be_bytes());
        buf.extend_from_slice(&self.fees_total.to_be_bytes());
        buf.extend_from_slice(self.signals_digest.as_bytes());
        buf.extend_from_slice(self.policy_decisions_digest.as_bytes());
        buf.extend_from_slice(&self.timestamp.as_secs().to_be_bytes());
        buf
    }

    /// `SHA-256(prev_hash || canonical_fields)`.
    pub fn compute_hash(&self) -> Digest {
        let mut hasher = Sha256::new();
        hasher.update(self.prev_hash.as_bytes());
        hasher.update(self.canonical_fields());
        Digest::new(hasher.finalize().into())
    }

    /// Build a complete entry from a draft, chaining from `prev_hash`.
    pub fn seal(draft: RewardDraft, seq: u64, prev_hash: Digest) -> Self {
        let mut entry = Self {
            seq,
            block_height: draft.block_height,
            miner: draft.miner,
            subsidy: draft.subsidy,
            fees_total: draft.fees_total,
            signals_digest: draft.signals_digest,
            policy_decisions_digest: draft.policy_decisions_digest,
            timestamp: draft.timestamp,
            prev_hash,
            entry_hash: Digest::ZERO,
        };
        entry.entry_hash = entry.compute_hash();
        entry
    }
}
