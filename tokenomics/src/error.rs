use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenomicsError {
    #[error("emission would exceed the supply cap: minted {minted} + {delta}")]
    SupplyExceeded { minted: u64, delta: u64 },

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<aegis_store::StoreError> for TokenomicsError {
    fn from(err: aegis_store::StoreError) -> Self {
        TokenomicsError::Storage(err.to_string())
    }
}
