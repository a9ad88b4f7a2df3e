use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkError {
    #[error("mining cancelled")]
    Cancelled,

    #[error("difficulty bits {0} exceed the supported maximum")]
    InvalidBits(u32),
}
