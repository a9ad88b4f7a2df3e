use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("transaction has no outputs")]
    EmptyOutputs,

    #[error("output amount must be positive")]
    ZeroAmountOutput,

    #[error("invalid identity: {0}")]
    BadAddress(String),

    #[error("memo is {len} bytes, maximum is {max}")]
    MemoTooLong { len: usize, max: usize },

    #[error("amount overflow")]
    Overflow,

    #[error("decode error: {0}")]
    Decode(String),
}
