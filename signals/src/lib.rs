//! External congestion signals.
//!
//! The node consumes an abstract [`SignalSource`] capability. Transport,
//! timeouts, and retries belong to the implementation; the core only sees
//! immutable snapshots and never fails on a fetch error: it falls back to
//! the last cached snapshot, then to zero pressure.

pub mod snapshot;
pub mod source;

pub use snapshot::SignalSnapshot;
pub use source::{CachedSource, SignalError, SignalSource, StaticSource};
