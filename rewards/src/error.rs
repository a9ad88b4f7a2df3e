use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("i/o error: {0}")]
    Io(String),

    #[error("ledger corruption at seq {seq} (byte offset {offset}): {detail}")]
    Corrupt {
        seq: u64,
        offset: u64,
        detail: String,
    },
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Io(err.to_string())
    }
}
