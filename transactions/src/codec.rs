//! Canonical transaction encoding.
//!
//! Layout: one kind byte, a varint field count, then fields in ascending tag
//! order. Each field is `varint tag, varint length, payload`. Multi-byte
//! integers inside payloads are fixed 8-byte big-endian; varints carry only
//! the framing (tags, counts, lengths). Absent optional fields are omitted
//! entirely, so the encoding of a transaction is unique.

use crate::error::TransactionError;
use crate::tx::{CoinbaseTx, Transaction, TransferTx, TxOut};
use aegis_types::{Address, Timestamp};

const KIND_COINBASE: u8 = 0x00;
const KIND_TRANSFER: u8 = 0x01;

// Coinbase field tags.
const CB_RECIPIENT: u64 = 1;
const CB_AMOUNT: u64 = 2;
const CB_HEIGHT: u64 = 3;
const CB_TIMESTAMP: u64 = 4;

// Transfer field tags.
const TX_SENDER: u64 = 1;
const TX_OUTPUTS: u64 = 2;
const TX_FEE: u64 = 3;
const TX_MEMO: u64 = 4;
const TX_TIMESTAMP: u64 = 5;
const TX_NONCE: u64 = 6;
const TX_SIGNATURE: u64 = 7;

// ── Varint primitives ──────────────────────────────────────────────────

/// Append `value` as a base-128 varint (7 data bits per byte, continuation
/// bit in the high bit).
pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Read a varint, returning `(value, bytes_consumed)`.
pub fn read_varint(bytes: &[u8]) -> Result<(u64, usize), TransactionError> {
    let mut value: u64 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(10) {
        value |= u64::from(byte & 0x7F)
            .checked_shl((i * 7) as u32)
            .ok_or_else(|| TransactionError::Decode("varint overflow".into()))?;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }
    Err(TransactionError::Decode("unterminated varint".into()))
}

fn write_field(buf: &mut Vec<u8>, tag: u64, payload: &[u8]) {
    write_varint(buf, tag);
    write_varint(buf, payload.len() as u64);
    buf.extend_from_slice(payload);
}

// ── Encoding ───────────────────────────────────────────────────────────

pub fn encode_coinbase(cb: &CoinbaseTx) -> Vec<u8> {
    let mut buf = vec![KIND_COINBASE];
    write_varint(&mut buf, 4);
    write_field(&mut buf, CB_RECIPIENT, cb.recipient.as_str().as_bytes());
    write_field(&mut buf, CB_AMOUNT, &cb.amount.to_be_bytes());
    write_field(&mut buf, CB_HEIGHT, &cb.height.to_be_bytes());
    write_field(&mut buf, CB_TIMESTAMP, &cb.timestamp.as_secs().to_be_bytes());
    buf
}

pub fn encode_transfer(tx: &TransferTx) -> Vec<u8> {
    let mut outputs = Vec::new();
    write_varint(&mut outputs, tx.outputs.len() as u64);
    for out in &tx.outputs {
        let addr = out.recipient.as_str().as_bytes();
        write_varint(&mut outputs, addr.len() as u64);
        outputs.extend_from_slice(addr);
        outputs.extend_from_slice(&out.amount.to_be_bytes());
    }

    let field_count = if tx.memo.is_some() { 7 } else { 6 };
    let mut buf = vec![KIND_TRANSFER];
    write_varint(&mut buf, field_count);
    write_field(&mut buf, TX_SENDER, tx.sender.as_str().as_bytes());
    write_field(&mut buf, TX_OUTPUTS, &outputs);
    write_field(&mut buf, TX_FEE, &tx.fee.to_be_bytes());
    if let Some(memo) = &tx.memo {
        write_field(&mut buf, TX_MEMO, memo.as_bytes());
    }
    write_field(&mut buf, TX_TIMESTAMP, &tx.timestamp.as_secs().to_be_bytes());
    write_field(&mut buf, TX_NONCE, &tx.nonce.to_be_bytes());
    write_field(&mut buf, TX_SIGNATURE, &tx.signature);
    buf
}

// ── Decoding ───────────────────────────────────────────────────────────

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn varint(&mut self) -> Result<u64, TransactionError> {
        let (value, used) = read_varint(&self.bytes[self.pos..])?;
        self.pos += used;
        Ok(value)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], TransactionError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&e| e <= self.bytes.len())
            .ok_or_else(|| TransactionError::Decode("truncated payload".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }
}

fn payload_u64(payload: &[u8]) -> Result<u64, TransactionError> {
    let arr: [u8; 8] = payload
        .try_into()
        .map_err(|_| TransactionError::Decode("integer field must be 8 bytes".into()))?;
    Ok(u64::from_be_bytes(arr))
}

fn payload_str(payload: &[u8]) -> Result<String, TransactionError> {
    String::from_utf8(payload.to_vec())
        .map_err(|_| TransactionError::Decode("string field is not UTF-8".into()))
}

fn decode_outputs(payload: &[u8]) -> Result<Vec<TxOut>, TransactionError> {
    let mut cur = Cursor {
        bytes: payload,
        pos: 0,
    };
    let count = cur.varint()?;
    let mut outputs = Vec::with_capacity(count.min(1024) as usize);
    for _ in 0..count {
        let addr_len = cur.varint()? as usize;
        let addr = payload_str(cur.take(addr_len)?)?;
        let amount = payload_u64(cur.take(8)?)?;
        outputs.push(TxOut {
            recipient: Address::new(addr),
            amount,
        });
    }
    if cur.pos != payload.len() {
        return Err(TransactionError::Decode("trailing bytes in outputs".into()));
    }
    Ok(outputs)
}

/// Decode one transaction, returning it and the number of bytes consumed.
pub fn decode_transaction(bytes: &[u8]) -> Result<(Transaction, usize), TransactionError> {
    if bytes.is_empty() {
        return Err(TransactionError::Decode("empty input".into()));
    }
    let kind = bytes[0];
    let mut cur = Cursor { bytes, pos: 1 };
    let field_count = cur.varint()?;

    let mut fields: Vec<(u64, &[u8])> = Vec::with_capacity(field_count.min(16) as usize);
    let mut last_tag = 0u64;
    for _ in 0..field_count {
        let tag = cur.varint()?;
        if tag <= last_tag {
            return Err(TransactionError::Decode(format!(
                "field tags must be strictly ascending (saw {tag} after {last_tag})"
            )));
        }
        last_tag = tag;
        let len = cur.varint()? as usize;
        fields.push((tag, cur.take(len)?));
    }
    let consumed = cur.pos;

    let get = |tag: u64| fields.iter().find(|(t, _)| *t == tag).map(|(_, p)| *p);
    let require = |tag: u64| {
        get(tag).ok_or_else(|| TransactionError::Decode(format!("missing field tag {tag}")))
    };

    let tx = match kind {
        KIND_COINBASE => Transaction::Coinbase(CoinbaseTx {
            recipient: Address::new(payload_str(require(CB_RECIPIENT)?)?),
            amount: payload_u64(require(CB_AMOUNT)?)?,
            height: payload_u64(require(CB_HEIGHT)?)?,
            timestamp: Timestamp::new(payload_u64(require(CB_TIMESTAMP)?)?),
        }),
        KIND_TRANSFER => Transaction::Transfer(TransferTx {
            sender: Address::new(payload_str(require(TX_SENDER)?)?),
            outputs: decode_outputs(require(TX_OUTPUTS)?)?,
            fee: payload_u64(require(TX_FEE)?)?,
            memo: get(TX_MEMO).map(payload_str).transpose()?,
            timestamp: Timestamp::new(payload_u64(require(TX_TIMESTAMP)?)?),
            nonce: payload_u64(require(TX_NONCE)?)?,
            signature: require(TX_SIGNATURE)?.to_vec(),
        }),
        other => {
            return Err(TransactionError::Decode(format!(
                "unknown transaction kind {other:#04x}"
            )))
        }
    };
    Ok((tx, consumed))
}

/// Serialize opaque signature bytes as lowercase hex in JSON artifacts.
pub mod serde_sig {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(sig: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(sig))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(|_| D::Error::custom("invalid hex signature"))
    }
}
