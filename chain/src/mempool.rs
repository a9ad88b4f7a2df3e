//! Pending-transaction pool.
//!
//! Keyed by `(sender, nonce)` so duplicates are structurally impossible.
//! Iteration follows insertion order; when the pool is full the entry with
//! the worst effective-fee density is evicted, oldest first on ties.

use aegis_policy::PolicyDecision;
use aegis_transactions::TransferTx;
use aegis_types::{Address, AegisError, TxHash};
use std::collections::BTreeMap;

/// A pending transfer with its admission-time policy decision. The decision
/// is part of the entry so fee adjustments are fixed at admission and the
/// block builder never rescopes them.
#[derive(Clone, Debug)]
pub struct MempoolEntry {
    pub tx: TransferTx,
    pub txid: TxHash,
    pub decision: PolicyDecision,
    pub encoded_size: u64,
    seq: u64,
}

impl MempoolEntry {
    pub fn effective_fee(&self) -> u64 {
        self.decision.effective_fee(self.tx.fee)
    }

    /// Admission insertion order (lower = older).
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug)]
pub struct Mempool {
    entries: BTreeMap<(Address, u64), MempoolEntry>,
    capacity: usize,
    next_seq: u64,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity: capacity.max(1),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, sender: &Address, nonce: u64) -> bool {
        self.entries.contains_key(&(sender.clone(), nonce))
    }

    /// Insert a scored transfer. When full, the lowest effective-fee-per-
    /// byte entry is evicted (oldest on ties); if the newcomer itself is
    /// the worst it is rejected instead.
    pub fn insert(
        &mut self,
        tx: TransferTx,
        txid: TxHash,
        decision: PolicyDecision,
    ) -> Result<(), AegisError> {
        let key = (tx.sender.clone(), tx.nonce);
        if self.entries.contains_key(&key) {
            return Err(AegisError::Conflict(format!(
                "transaction ({}, nonce {}) already pending",
                tx.sender, tx.nonce
            )));
        }

        let entry = MempoolEntry {
            encoded_size: tx.encoded_size().max(1),
            txid,
            decision,
            tx,
            seq: self.next_seq,
        };

        if self.entries.len() >= self.capacity {
            let worst_key = self
                .worst_entry()
                .map(|(k, _)| k.clone())
                .expect("full mempool has a worst entry");
            let worst = &self.entries[&worst_key];
            if !denser(&entry, worst) {
                return Err(AegisError::Conflict(format!(
                    "mempool full and fee density {} is not above the floor",
                    fee_density_display(&entry)
                )));
            }
            tracing::debug!(
                evicted = %worst.txid,
                "mempool full, evicting lowest fee-density entry"
            );
            self.entries.remove(&worst_key);
        }

        self.next_seq += 1;
        self.entries.insert(key, entry);
        Ok(())
    }

    pub fn remove(&mut self, sender: &Address, nonce: u64) -> Option<MempoolEntry> {
        self.entries.remove(&(sender.clone(), nonce))
    }

    /// Entries in insertion order.
    pub fn iter_insertion_order(&self) -> Vec<&MempoolEntry> {
        let mut entries: Vec<&MempoolEntry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries
    }

    /// Sum of `amount + declared fee` across a sender's pending transfers.
    pub fn pending_debit(&self, sender: &Address) -> u64 {
        self.entries
            .range((sender.clone(), 0)..=(sender.clone(), u64::MAX))
            .map(|(_, e)| e.tx.spend().unwrap_or(u64::MAX))
            .fold(0u64, |acc, s| acc.saturating_add(s))
    }

    /// All pending transfers (for the best-effort snapshot file).
    pub fn pending_txs(&self) -> Vec<TransferTx> {
        self.iter_insertion_order()
            .into_iter()
            .map(|e| e.tx.clone())
            .collect()
    }

    fn worst_entry(&self) -> Option<(&(Address, u64), &MempoolEntry)> {
        self.entries.iter().min_by(|(_, a), (_, b)| {
            density_cmp(a, b).then(a.seq.cmp(&b.seq))
        })
    }
}

/// Compare fee densities without floats: `a.fee/a.size ? b.fee/b.size`
/// via cross-multiplication.
fn density_cmp(a: &MempoolEntry, b: &MempoolEntry) -> std::cmp::Ordering {
    let lhs = a.effective_fee() as u128 * b.encoded_size as u128;
    let rhs = b.effective_fee() as u128 * a.encoded_size as u128;
    lhs.cmp(&rhs)
}

fn denser(a: &MempoolEntry, b: &MempoolEntry) -> bool {
    density_cmp(a, b) == std::cmp::Ordering::Greater
}

fn fee_density_display(e: &MempoolEntry) -> String {
    format!("{}/{}B", e.effective_fee(), e.encoded_size)
}
