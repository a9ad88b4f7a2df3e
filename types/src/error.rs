//! Shared error taxonomy.
//!
//! Every public engine operation surfaces one of these kinds. Signal-fetch
//! failures never appear here; the collector falls back to its cache or a
//! zero-pressure snapshot internally.

use thiserror::Error;

/// Common error type for node operations.
#[derive(Debug, Error)]
pub enum AegisError {
    /// Malformed caller input. Never mutates state.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Transaction blocked by the guardian policy.
    #[error("transaction denied by policy (suspicion {suspicion_bps} bps): {reasons:?}")]
    PolicyDenied {
        suspicion_bps: u32,
        reasons: Vec<String>,
        suggestions: Vec<String>,
    },

    /// Sender cannot cover amount plus fee.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Duplicate nonce, stale nonce, or mempool full with a worse fee.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Invalid proof-of-work, merkle mismatch, supply overflow, coinbase
    /// over-pay. Fatal for the offending block, rejected atomically.
    #[error("consensus violation: {0}")]
    Consensus(String),

    /// I/O failure. The writer rolls back in-memory changes before
    /// surfacing this.
    #[error("storage error: {0}")]
    Storage(String),

    /// The rewards ledger failed verification. Mining halts until an
    /// operator intervenes.
    #[error("ledger corruption at seq {seq} (byte offset {offset}): {detail}")]
    LedgerCorruption {
        seq: u64,
        offset: u64,
        detail: String,
    },
}

impl AegisError {
    /// Stable machine-readable kind tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AegisError::Validation(_) => "validation",
            AegisError::PolicyDenied { .. } => "policy_denied",
            AegisError::InsufficientFunds { .. } => "insufficient_funds",
            AegisError::Conflict(_) => "conflict",
            AegisError::Consensus(_) => "consensus",
            AegisError::Storage(_) => "storage",
            AegisError::LedgerCorruption { .. } => "ledger_corruption",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let err = AegisError::InsufficientFunds {
            needed: 10,
            available: 3,
        };
        assert_eq!(err.kind(), "insufficient_funds");
        assert_eq!(err.to_string(), "insufficient funds: need 10, have 3");
    }

    #[test]
    fn policy_denied_lists_reasons() {
        let err = AegisError::PolicyDenied {
            suspicion_bps: 9500,
            reasons: vec!["tx_denied_extreme_spam".into(), "zero_fee".into()],
            suggestions: vec![],
        };
        let msg = err.to_string();
        assert!(msg.contains("tx_denied_extreme_spam"));
        assert!(msg.contains("9500"));
    }
}
