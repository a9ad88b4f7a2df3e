//! Account identity strings.
//!
//! The prototype uses free-form identity strings ("alice", "miner_a") rather
//! than key-derived addresses. Signature binding to an identity is the
//! injected verifier's concern.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted identity length in bytes.
pub const MAX_ADDRESS_LEN: usize = 64;

/// An account identity.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the identity is usable: non-empty, bounded, and free of
    /// whitespace/control characters.
    pub fn is_well_formed(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_ADDRESS_LEN
            && self
                .0
                .chars()
                .all(|c| !c.is_whitespace() && !c.is_control())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
