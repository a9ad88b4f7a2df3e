//! Stateless transaction validation.
//!
//! Stateful checks (balance sufficiency, nonce ordering, policy) are the
//! chain engine's job.

use crate::error::TransactionError;
use crate::tx::TransferTx;

/// Validate a transfer's structure: identities, outputs, memo size.
pub fn validate_transfer(tx: &TransferTx, max_memo_bytes: usize) -> Result<(), TransactionError> {
    if !tx.sender.is_well_formed() {
        return Err(TransactionError::BadAddress(tx.sender.as_str().into()));
    }
    if tx.outputs.is_empty() {
        return Err(TransactionError::EmptyOutputs);
    }
    for out in &tx.outputs {
        if !out.recipient.is_well_formed() {
            return Err(TransactionError::BadAddress(out.recipient.as_str().into()));
        }
        if out.amount == 0 {
            return Err(TransactionError::ZeroAmountOutput);
        }
    }
    if let Some(memo) = &tx.memo {
        if memo.len() > max_memo_bytes {
            return Err(TransactionError::MemoTooLong {
                len: memo.len(),
                max: max_memo_bytes,
            });
        }
    }
    // Overflow-proof total: amount + fee must fit u64.
    tx.spend().ok_or(TransactionError::Overflow)?;
    Ok(())
}
