//! Datadir persistence.
//!
//! Everything on disk is either a whole-file JSON artifact written with the
//! temp-write/fsync/rename pattern, or the append-only rewards ledger (owned
//! by its own crate). Block files use the canonical binary encoding and the
//! same atomic rename.

pub mod atomic;
pub mod blocks;
pub mod error;
pub mod layout;
pub mod state;

pub use atomic::write_atomic;
pub use blocks::BlockFileStore;
pub use error::StoreError;
pub use layout::Datadir;
pub use state::{MempoolSnapshot, StateSnapshot};
