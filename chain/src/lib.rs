//! The chain engine: blocks, proof-of-work production, validation,
//! account-balance state, and mempool admission.
//!
//! One `ChainEngine` owns the block list, balances, nonces, and mempool.
//! Callers serialize mutation through a single writer (see the node crate);
//! the engine itself is synchronous and deterministic.

pub mod block;
pub mod engine;
pub mod mempool;

pub use block::{merkle_root, Block, BlockHeader, BlockSummary, BLOCK_VERSION};
pub use engine::{AdmissionResult, BlockTemplate, ChainEngine, MineOutcome};
pub use mempool::{Mempool, MempoolEntry};
