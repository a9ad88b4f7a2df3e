//! Datadir layout.
//!
//! ```text
//! <datadir>/
//!   blocks/NNNNNN.blk      one block per file, canonical binary encoding
//!   state.json             mirrored balances + tip (rebuildable from blocks/)
//!   token_state.json       emission state
//!   rewards_ledger.jsonl   hash-chained audit trail
//!   mempool.json           best-effort pending-tx snapshot
//! ```

use crate::error::StoreError;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug)]
pub struct Datadir {
    root: PathBuf,
}

impl Datadir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the directory tree if it does not exist yet.
    pub fn ensure(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(self.blocks_dir())?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.root.join("blocks")
    }

    pub fn block_file(&self, height: u64) -> PathBuf {
        self.blocks_dir().join(format!("{height:06}.blk"))
    }

    pub fn state_file(&self) -> PathBuf {
        self.root.join("state.json")
    }

    pub fn token_state_file(&self) -> PathBuf {
        self.root.join("token_state.json")
    }

    pub fn ledger_file(&self) -> PathBuf {
        self.root.join("rewards_ledger.jsonl")
    }

    pub fn mempool_file(&self) -> PathBuf {
        self.root.join("mempool.json")
    }
}
