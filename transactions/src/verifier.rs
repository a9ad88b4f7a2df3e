//! Injected signature verification capability.
//!
//! The core never interprets signature bytes itself. Deployments plug in a
//! real scheme; the dev default only insists a signature is present.

use crate::tx::TransferTx;

/// Decides whether a transfer's opaque signature bytes are acceptable.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, tx: &TransferTx) -> bool;
}

/// Dev-network verifier: the signature must be non-empty and not all zeros.
#[derive(Clone, Copy, Debug, Default)]
pub struct NonEmptySignatureVerifier;

impl SignatureVerifier for NonEmptySignatureVerifier {
    fn verify(&self, tx: &TransferTx) -> bool {
        !tx.signature.is_empty() && tx.signature.iter().any(|&b| b != 0)
    }
}

/// Test verifier that accepts everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AcceptAllVerifier;

impl SignatureVerifier for AcceptAllVerifier {
    fn verify(&self, _tx: &TransferTx) -> bool {
        true
    }
}
