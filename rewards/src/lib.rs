//! Append-only, hash-chained rewards ledger.
//!
//! One JSON object per line in `rewards_ledger.jsonl`. Each entry commits
//! to its predecessor's hash, so any insertion, deletion, or edit is
//! detectable offline with nothing but the file.

pub mod entry;
pub mod error;
pub mod ledger;

pub use entry::{RewardDraft, RewardEntry};
pub use error::LedgerError;
pub use ledger::{verify_file, Divergence, RewardsLedger, VerifyReport};
