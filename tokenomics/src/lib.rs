//! Fixed-supply tokenomics: allocation buckets, vesting, and the
//! supply-capped dynamic block subsidy.
//!
//! All consensus-relevant arithmetic is integer (pressure and multiplier in
//! parts-per-million); the emission state is persisted atomically after
//! every applied block.

pub mod allocation;
pub mod engine;
pub mod error;
pub mod state;
pub mod subsidy;

pub use allocation::{vested, Bucket, EMISSION_POOL_TOTAL, TOTAL_ALLOCATION};
pub use engine::TokenomicsEngine;
pub use error::TokenomicsError;
pub use state::EmissionState;
pub use subsidy::subsidy;
