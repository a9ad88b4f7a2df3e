//! 32-byte hash newtypes.
//!
//! All three wrap a SHA-256 output. They serialize as lowercase hex in every
//! JSON artifact (state file, rewards ledger, RPC-ish envelopes) and as raw
//! bytes only inside the hand-rolled consensus encodings.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! hash32 {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn from_hex(s: &str) -> Option<Self> {
                let bytes = hex::decode(s).ok()?;
                let arr: [u8; 32] = bytes.try_into().ok()?;
                Some(Self(arr))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::ZERO
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "("))?;
                for b in &self.0[..4] {
                    write!(f, "{:02x}", b)?;
                }
                write!(f, "\u{2026})")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                for b in &self.0 {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s)
                    .ok_or_else(|| D::Error::custom(format!("invalid 32-byte hex: {s:?}")))
            }
        }
    };
}

hash32! {
    /// Identifies a transaction (SHA-256 of its canonical encoding).
    TxHash
}

hash32! {
    /// Identifies a block (SHA-256 of its 88-byte header encoding).
    BlockHash
}

hash32! {
    /// A generic content digest (signal snapshots, policy decision sets,
    /// rewards-ledger entries).
    Digest
}
