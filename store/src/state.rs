//! Mirrored chain state and mempool snapshots.
//!
//! `state.json` is a cache: it speeds up restarts but the chain engine can
//! always rebuild it by replaying `blocks/`. `mempool.json` is best-effort
//! and is rebuilt empty when it cannot be read.

use crate::atomic::write_atomic;
use crate::error::StoreError;
use aegis_types::BlockHash;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Account balances, per-sender nonces, and the tip, mirrored to disk after
/// every accepted block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub height: u64,
    pub tip_hash: BlockHash,
    pub bits: u32,
    pub balances: BTreeMap<String, u64>,
    pub nonces: BTreeMap<String, u64>,
}

impl StateSnapshot {
    pub fn load(path: &Path) -> Result<Option<Self>, StoreError> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }
}

/// Pending transactions serialized opportunistically. A failed load is not
/// an error; the mempool simply restarts empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MempoolSnapshot<T> {
    pub pending: Vec<T>,
}

impl<T: Serialize + DeserializeOwned> MempoolSnapshot<T> {
    pub fn load_best_effort(path: &Path) -> Self {
        match load_json::<Self>(path) {
            Ok(Some(snap)) => snap,
            Ok(None) => Self { pending: Vec::new() },
            Err(err) => {
                tracing::debug!(%err, "mempool snapshot unreadable, starting empty");
                Self { pending: Vec::new() }
            }
        }
    }

    pub fn save_best_effort(&self, path: &Path) {
        if let Err(err) = save_json(path, self) {
            tracing::debug!(%err, "failed to persist mempool snapshot");
        }
    }
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| StoreError::Serde(e.to_string()))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let mut bytes =
        serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serde(e.to_string()))?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)
}
