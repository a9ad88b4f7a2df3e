//! Transaction shapes.

use crate::codec;
use aegis_types::{Address, Amount, Timestamp, TxHash};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

/// One payment output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOut {
    pub recipient: Address,
    pub amount: Amount,
}

/// A regular value transfer. `nonce` is strictly increasing per sender in
/// accepted order; `signature` is opaque to the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferTx {
    pub sender: Address,
    pub outputs: Vec<TxOut>,
    pub fee: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    pub timestamp: Timestamp,
    pub nonce: u64,
    #[serde(with = "codec::serde_sig")]
    pub signature: Vec<u8>,
}

/// The block's first transaction: pays the miner subsidy plus aggregated
/// effective fees. Binds the block height so its txid is unique per block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinbaseTx {
    pub recipient: Address,
    pub amount: Amount,
    pub height: u64,
    pub timestamp: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transaction {
    Coinbase(CoinbaseTx),
    Transfer(TransferTx),
}

impl TransferTx {
    /// Total value leaving the sender, excluding the fee.
    pub fn amount(&self) -> Amount {
        self.outputs.iter().map(|o| o.amount).sum()
    }

    /// Total value leaving the sender, including the declared fee.
    pub fn spend(&self) -> Option<Amount> {
        self.amount().checked_add(self.fee)
    }

    pub fn txid(&self) -> TxHash {
        Transaction::Transfer(self.clone()).txid()
    }

    pub fn encoded_size(&self) -> u64 {
        codec::encode_transfer(self).len() as u64
    }
}

impl CoinbaseTx {
    pub fn txid(&self) -> TxHash {
        Transaction::Coinbase(self.clone()).txid()
    }
}

impl Transaction {
    pub fn is_coinbase(&self) -> bool {
        matches!(self, Transaction::Coinbase(_))
    }

    /// Canonical encoding (varint field map, big-endian integers).
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Transaction::Coinbase(cb) => codec::encode_coinbase(cb),
            Transaction::Transfer(tx) => codec::encode_transfer(tx),
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<(Self, usize), crate::TransactionError> {
        codec::decode_transaction(bytes)
    }

    /// SHA-256 of the canonical encoding.
    pub fn txid(&self) -> TxHash {
        let mut hasher = Sha256::new();
        hasher.update(self.encode());
        TxHash::new(hasher.finalize().into())
    }

    pub fn encoded_size(&self) -> u64 {
        self.encode().len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_transfer() -> TransferTx {
        TransferTx {
            sender: Address::new("alice"),
            outputs: vec![TxOut {
                recipient: Address::new("bob"),
                amount: 250,
            }],
            fee: 100,
            memo: Some("coffee".to_string()),
            timestamp: Timestamp::new(1_700_000_000),
            nonce: 1,
            signature: vec![0xAA; 64],
        }
    }

    #[test]
    fn txid_is_stable_and_content_addressed() {
        let tx = sample_transfer();
        let id1 = tx.txid();
        let id2 = tx.txid();
        assert_eq!(id1, id2);

        let mut other = sample_transfer();
        other.fee = 101;
        assert_ne!(other.txid(), id1);
    }

    #[test]
    fn coinbase_txid_varies_with_height() {
        let cb = |height| CoinbaseTx {
            recipient: Address::new("miner_a"),
            amount: 19,
            height,
            timestamp: Timestamp::new(1_700_000_000),
        };
        assert_ne!(cb(1).txid(), cb(2).txid());
    }

    #[test]
    fn spend_adds_fee_checked() {
        let tx = sample_transfer();
        assert_eq!(tx.amount(), 250);
        assert_eq!(tx.spend(), Some(350));

        let mut huge = sample_transfer();
        huge.outputs[0].amount = u64::MAX;
        assert_eq!(huge.spend(), None);
    }
}
