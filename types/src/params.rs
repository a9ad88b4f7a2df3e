//! Chain parameters: consensus constants plus operational knobs.
//!
//! Defaults describe the dev network; tests build custom instances per case.

use serde::{Deserialize, Serialize};

/// Seconds in the emission model's year (365 days, matching the 10-year /
/// 60-second schedule that yields 5,256,000 target blocks).
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// All parameters a node needs to run one chain.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainParams {
    /// Hard cap on total issuance (atomic units).
    #[serde(default = "default_total_supply")]
    pub total_supply: u64,

    /// Emission horizon in years; with `target_block_time_secs` this fixes
    /// the target block count.
    #[serde(default = "default_target_years")]
    pub target_years: u64,

    /// Desired inter-block time in seconds.
    #[serde(default = "default_target_block_time")]
    pub target_block_time_secs: u64,

    /// Difficulty is re-evaluated every this many blocks.
    #[serde(default = "default_retarget_interval")]
    pub retarget_interval: u64,

    /// Lower bound on the per-block subsidy (before the remaining-supply cap).
    #[serde(default = "default_min_subsidy")]
    pub min_subsidy: u64,

    /// Upper bound on the per-block subsidy.
    #[serde(default = "default_max_subsidy")]
    pub max_subsidy: u64,

    /// When the cap is reached: emit 1 unit per block instead of 0.
    #[serde(default)]
    pub tail_emission: bool,

    /// Maximum total encoded size of a block's transactions, in bytes.
    #[serde(default = "default_max_block_weight")]
    pub max_block_weight: u64,

    /// Mempool capacity in transactions; beyond it the worst entry is evicted.
    #[serde(default = "default_max_mempool_txs")]
    pub max_mempool_txs: usize,

    /// Maximum memo length in bytes.
    #[serde(default = "default_max_memo_bytes")]
    pub max_memo_bytes: usize,

    /// Initial difficulty: required leading zero bits of the header hash.
    #[serde(default = "default_initial_bits")]
    pub initial_bits: u32,

    /// Difficulty floor/ceiling in leading-zero bits.
    #[serde(default = "default_min_bits")]
    pub min_bits: u32,
    #[serde(default = "default_max_bits")]
    pub max_bits: u32,

    /// How long a fetched congestion snapshot stays fresh.
    #[serde(default = "default_signal_ttl")]
    pub signal_ttl_secs: u64,

    /// Hard timeout for a signal fetch; on exceed the cached/zero snapshot
    /// is used instead.
    #[serde(default = "default_signal_timeout")]
    pub signal_timeout_secs: u64,

    /// Identity credited by the height-0 coinbase (which mints zero).
    #[serde(default = "default_genesis_tag")]
    pub genesis_tag: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_total_supply() -> u64 {
    100_000_000
}

fn default_target_years() -> u64 {
    10
}

fn default_target_block_time() -> u64 {
    60
}

fn default_retarget_interval() -> u64 {
    10
}

fn default_min_subsidy() -> u64 {
    1
}

fn default_max_subsidy() -> u64 {
    5000
}

fn default_max_block_weight() -> u64 {
    100_000
}

fn default_max_mempool_txs() -> usize {
    10_000
}

fn default_max_memo_bytes() -> usize {
    256
}

fn default_initial_bits() -> u32 {
    8
}

fn default_min_bits() -> u32 {
    1
}

fn default_max_bits() -> u32 {
    240
}

fn default_signal_ttl() -> u64 {
    30
}

fn default_signal_timeout() -> u64 {
    10
}

fn default_genesis_tag() -> String {
    "genesis".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ChainParams {
    /// Total number of blocks in the emission horizon.
    pub fn target_blocks(&self) -> u64 {
        let secs = self.target_years.saturating_mul(SECONDS_PER_YEAR);
        (secs / self.target_block_time_secs.max(1)).max(1)
    }
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            total_supply: default_total_supply(),
            target_years: default_target_years(),
            target_block_time_secs: default_target_block_time(),
            retarget_interval: default_retarget_interval(),
            min_subsidy: default_min_subsidy(),
            max_subsidy: default_max_subsidy(),
            tail_emission: false,
            max_block_weight: default_max_block_weight(),
            max_mempool_txs: default_max_mempool_txs(),
            max_memo_bytes: default_max_memo_bytes(),
            initial_bits: default_initial_bits(),
            min_bits: default_min_bits(),
            max_bits: default_max_bits(),
            signal_ttl_secs: default_signal_ttl(),
            signal_timeout_secs: default_signal_timeout(),
            genesis_tag: default_genesis_tag(),
        }
    }
}
