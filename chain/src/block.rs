//! Blocks, headers, and the canonical binary encoding.

use aegis_transactions::{Transaction, TransactionError};
use aegis_transactions::codec::{read_varint, write_varint};
use aegis_types::BlockHash;
use serde::Serialize;
use sha2::{Digest as _, Sha256};

pub const BLOCK_VERSION: u32 = 1;

/// Encoded header length: 4 version + 32 prev + 32 merkle + 8 timestamp +
/// 4 bits + 8 nonce.
pub const HEADER_LEN: usize = 88;

/// Block header. The block hash is SHA-256 over the 88-byte encoding; all
/// multi-byte integers are big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_hash: BlockHash,
    pub merkle_root: BlockHash,
    pub timestamp: u64,
    /// Required leading zero bits of the header hash.
    pub bits: u32,
    pub nonce: u64,
}

impl BlockHeader {
    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..4].copy_from_slice(&self.version.to_be_bytes());
        buf[4..36].copy_from_slice(self.prev_hash.as_bytes());
        buf[36..68].copy_from_slice(self.merkle_root.as_bytes());
        buf[68..76].copy_from_slice(&self.timestamp.to_be_bytes());
        buf[76..80].copy_from_slice(&self.bits.to_be_bytes());
        buf[80..88].copy_from_slice(&self.nonce.to_be_bytes());
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        if bytes.len() < HEADER_LEN {
            return Err(TransactionError::Decode(format!(
                "header needs {HEADER_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let arr = |range: std::ops::Range<usize>| -> [u8; 32] {
            bytes[range].try_into().expect("fixed slice")
        };
        Ok(Self {
            version: u32::from_be_bytes(bytes[0..4].try_into().expect("fixed slice")),
            prev_hash: BlockHash::new(arr(4..36)),
            merkle_root: BlockHash::new(arr(36..68)),
            timestamp: u64::from_be_bytes(bytes[68..76].try_into().expect("fixed slice")),
            bits: u32::from_be_bytes(bytes[76..80].try_into().expect("fixed slice")),
            nonce: u64::from_be_bytes(bytes[80..88].try_into().expect("fixed slice")),
        })
    }

    /// SHA-256 over the canonical 88 bytes.
    pub fn hash(&self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.encode());
        BlockHash::new(hasher.finalize().into())
    }
}

/// A block: header plus ordered transactions, coinbase first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// The height carried by the coinbase, if the block is well-formed.
    pub fn height(&self) -> Option<u64> {
        match self.txs.first() {
            Some(Transaction::Coinbase(cb)) => Some(cb.height),
            _ => None,
        }
    }

    /// Canonical encoding: 88-byte header, varint tx count, transactions in
    /// order (each self-delimiting).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + 64 * self.txs.len());
        buf.extend_from_slice(&self.header.encode());
        write_varint(&mut buf, self.txs.len() as u64);
        for tx in &self.txs {
            buf.extend_from_slice(&tx.encode());
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let header = BlockHeader::decode(bytes)?;
        let mut pos = HEADER_LEN;
        let (count, used) = read_varint(&bytes[pos..])?;
        pos += used;

        let mut txs = Vec::with_capacity(count.min(10_000) as usize);
        for _ in 0..count {
            let (tx, consumed) = Transaction::decode(&bytes[pos..])?;
            pos += consumed;
            txs.push(tx);
        }
        if pos != bytes.len() {
            return Err(TransactionError::Decode(
                "trailing bytes after block body".into(),
            ));
        }
        Ok(Self { header, txs })
    }

    /// Sum of encoded transaction sizes (block weight).
    pub fn weight(&self) -> u64 {
        self.txs.iter().map(|tx| tx.encoded_size()).sum()
    }
}

/// Merkle root over transaction ids: pair-wise SHA-256, odd layers
/// duplicate their last element.
pub fn merkle_root(txids: &[aegis_types::TxHash]) -> BlockHash {
    if txids.is_empty() {
        let mut hasher = Sha256::new();
        hasher.update(b"");
        return BlockHash::new(hasher.finalize().into());
    }
    let mut layer: Vec<[u8; 32]> = txids.iter().map(|t| *t.as_bytes()).collect();
    while layer.len() > 1 {
        if layer.len() % 2 == 1 {
            layer.push(*layer.last().expect("non-empty layer"));
        }
        layer = layer
            .chunks(2)
            .map(|pair| {
                let mut hasher = Sha256::new();
                hasher.update(pair[0]);
                hasher.update(pair[1]);
                hasher.finalize().into()
            })
            .collect();
    }
    BlockHash::new(layer[0])
}

/// Listing row for `tip`/`range` operations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    pub height: u64,
    pub hash: BlockHash,
    pub timestamp: u64,
    pub tx_count: usize,
    pub bits: u32,
}
