//! Fundamental types for the AEGIS node.
//!
//! This crate defines the core types shared across every other crate in the
//! workspace: identities, hashes, timestamps, chain parameters, and the
//! common error taxonomy.

pub mod address;
pub mod error;
pub mod hash;
pub mod params;
pub mod time;

pub use address::Address;
pub use error::AegisError;
pub use hash::{BlockHash, Digest, TxHash};
pub use params::ChainParams;
pub use time::Timestamp;

/// Token amount in the smallest (atomic) unit.
pub type Amount = u64;
