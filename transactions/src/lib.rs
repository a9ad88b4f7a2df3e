//! Transaction model, canonical encoding, and stateless validation.
//!
//! Two shapes exist: the coinbase (no sender, single output to the miner,
//! exactly one per block, always first) and the regular transfer. Signatures
//! are opaque bytes; an injected [`SignatureVerifier`] decides whether they
//! hold.

pub mod codec;
pub mod error;
pub mod tx;
pub mod validation;
pub mod verifier;

pub use error::TransactionError;
pub use tx::{CoinbaseTx, Transaction, TransferTx, TxOut};
pub use validation::validate_transfer;
pub use verifier::{AcceptAllVerifier, NonEmptySignatureVerifier, SignatureVerifier};
