//! The tokenomics engine — owns the emission state file.

use aegis_signals::SignalSnapshot;
use aegis_store::{write_atomic, Datadir};
use aegis_types::{ChainParams, Timestamp};
use std::path::PathBuf;

use crate::allocation::{vested, Bucket};
use crate::error::TokenomicsError;
use crate::state::EmissionState;
use crate::subsidy;

/// Single owner of `token_state.json`. The chain engine holds exactly one
/// of these and calls `apply` after each accepted block; tests create
/// isolated engines per case.
pub struct TokenomicsEngine {
    params: ChainParams,
    state: EmissionState,
    path: PathBuf,
}

impl TokenomicsEngine {
    /// Load the persisted state, or initialize it at `genesis_ts` and write
    /// the first state file.
    pub fn open(
        datadir: &Datadir,
        params: ChainParams,
        genesis_ts: Timestamp,
    ) -> Result<Self, TokenomicsError> {
        let path = datadir.token_state_file();
        let state = if path.is_file() {
            let bytes =
                std::fs::read(&path).map_err(|e| TokenomicsError::Storage(e.to_string()))?;
            serde_json::from_slice(&bytes).map_err(|e| TokenomicsError::Storage(e.to_string()))?
        } else {
            let state = EmissionState::genesis(genesis_ts);
            persist(&path, &state)?;
            state
        };
        Ok(Self {
            params,
            state,
            path,
        })
    }

    /// The subsidy a block at `height` may mint, given the bound snapshot.
    /// Pure with respect to this engine's persisted `minted_total`.
    pub fn subsidy(&self, height: u64, signals: &SignalSnapshot) -> u64 {
        subsidy::subsidy(&self.params, height, self.state.minted_total, signals)
    }

    /// Advance the emission state after a block is appended. Rejects any
    /// mint that would break the hard supply cap, then persists atomically.
    pub fn apply(&mut self, minted: u64, block_ts: Timestamp) -> Result<(), TokenomicsError> {
        let after = self.state.minted_total.saturating_add(minted);
        if after > self.params.total_supply {
            return Err(TokenomicsError::SupplyExceeded {
                minted: self.state.minted_total,
                delta: minted,
            });
        }

        let rollback = self.state.clone();
        self.state.record(minted, block_ts);
        if let Err(err) = persist(&self.path, &self.state) {
            self.state = rollback;
            return Err(err);
        }
        tracing::debug!(
            minted,
            minted_total = self.state.minted_total,
            remaining_pool = self.state.remaining_pool,
            "emission state advanced"
        );
        Ok(())
    }

    /// Units of `bucket` unlocked at `now`.
    pub fn vested(&self, bucket: Bucket, now: Timestamp) -> u64 {
        vested(bucket, self.state.genesis_ts, now)
    }

    pub fn state(&self) -> &EmissionState {
        &self.state
    }

    /// Restore a previously captured state (unwind path for a failed
    /// multi-file commit), persisting it before adopting it.
    pub fn restore(&mut self, state: EmissionState) -> Result<(), TokenomicsError> {
        persist(&self.path, &state)?;
        self.state = state;
        Ok(())
    }

    /// Test hook: preload an already-minted total (e.g. near the cap).
    pub fn preload_minted(&mut self, minted_total: u64) -> Result<(), TokenomicsError> {
        self.state.minted_total = minted_total;
        self.state.remaining_pool = self
            .state
            .emission_pool_total
            .saturating_sub(minted_total);
        persist(&self.path, &self.state)
    }
}

fn persist(path: &PathBuf, state: &EmissionState) -> Result<(), TokenomicsError> {
    let mut bytes =
        serde_json::to_vec_pretty(state).map_err(|e| TokenomicsError::Storage(e.to_string()))?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)?;
    Ok(())
}
