//! The ledger file: append, verify, tail.

use crate::entry::{RewardDraft, RewardEntry};
use crate::error::LedgerError;
use aegis_types::Digest;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Where verification first diverged from the recorded chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Divergence {
    pub seq: u64,
    pub byte_offset: u64,
    pub reason: String,
}

/// Result of an offline verification pass.
#[derive(Clone, Debug)]
pub struct VerifyReport {
    pub ok: bool,
    /// Length of the valid prefix.
    pub entries: u64,
    pub head_hash: Option<Digest>,
    /// Every detected divergence, in file order. After a hash mismatch the
    /// scan keeps walking with recomputed hashes, so downstream stale
    /// `prev_hash` links are reported too.
    pub divergences: Vec<Divergence>,
    /// A final line that does not parse. The chain up to it may still be
    /// intact; it is truncated before the next append.
    pub trailing_corruption: bool,
}

impl VerifyReport {
    pub fn first_divergence(&self) -> Option<&Divergence> {
        self.divergences.first()
    }
}

/// Exclusive owner of `rewards_ledger.jsonl`.
///
/// Durability contract: each append writes one full line then fsyncs, so a
/// crash leaves either the complete entry or a trailing partial line that
/// the next open truncates. Rename is not used; the file is append-only.
pub struct RewardsLedger {
    path: PathBuf,
    entries: Vec<RewardEntry>,
}

impl RewardsLedger {
    /// Open (or create) the ledger, replaying existing entries. A corrupt
    /// interior line is a hard error; a corrupt final line is truncated.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let mut ledger = Self {
            path,
            entries: Vec::new(),
        };
        if !ledger.path.is_file() {
            return Ok(ledger);
        }

        let bytes = std::fs::read(&ledger.path)?;
        let scan = scan_entries(&bytes);

        if let Some(div) = scan.divergences.into_iter().next() {
            return Err(LedgerError::Corrupt {
                seq: div.seq,
                offset: div.byte_offset,
                detail: div.reason,
            });
        }
        if let Some(truncate_at) = scan.trailing_garbage_at {
            tracing::warn!(
                offset = truncate_at,
                "rewards ledger has a partial trailing line, truncating"
            );
            let file = OpenOptions::new().write(true).open(&ledger.path)?;
            file.set_len(truncate_at)?;
            file.sync_all()?;
        }
        ledger.entries = scan.entries;
        Ok(ledger)
    }

    /// Append an entry. The ledger assigns `seq`, chains `prev_hash`, and
    /// fsyncs before returning.
    pub fn append(&mut self, draft: RewardDraft) -> Result<RewardEntry, LedgerError> {
        let seq = self.entries.len() as u64;
        let prev_hash = self
            .entries
            .last()
            .map(|e| e.entry_hash)
            .unwrap_or(Digest::ZERO);
        let entry = RewardEntry::seal(draft, seq, prev_hash);

        let mut line = serde_json::to_string(&entry)
            .map_err(|e| LedgerError::Io(format!("serialize entry: {e}")))?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.sync_all()?;

        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Re-read the file from disk and check the whole chain.
    pub fn verify(&self) -> Result<VerifyReport, LedgerError> {
        verify_file(&self.path)
    }

    /// The last `n` entries in order.
    pub fn tail(&self, n: usize) -> &[RewardEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn head_hash(&self) -> Option<Digest> {
        self.entries.last().map(|e| e.entry_hash)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Verify any ledger file without holding a `RewardsLedger`.
pub fn verify_file(path: &Path) -> Result<VerifyReport, LedgerError> {
    if !path.is_file() {
        return Ok(VerifyReport {
            ok: true,
            entries: 0,
            head_hash: None,
            divergences: Vec::new(),
            trailing_corruption: false,
        });
    }
    let bytes = std::fs::read(path)?;
    let scan = scan_entries(&bytes);
    Ok(VerifyReport {
        ok: scan.divergences.is_empty(),
        entries: scan.entries.len() as u64,
        head_hash: scan.entries.last().map(|e| e.entry_hash),
        divergences: scan.divergences,
        trailing_corruption: scan.trailing_garbage_at.is_some(),
    })
}

struct Scan {
    /// The valid prefix.
    entries: Vec<RewardEntry>,
    divergences: Vec<Divergence>,
    /// Byte offset at which a partial final line starts.
    trailing_garbage_at: Option<u64>,
}

fn scan_entries(bytes: &[u8]) -> Scan {
    let mut entries = Vec::new();
    let mut divergences: Vec<Divergence> = Vec::new();
    let mut trailing_garbage_at = None;
    // The chain link is always the *recomputed* hash, so once an entry is
    // tampered every downstream recorded prev_hash shows up as stale.
    let mut prev_hash = Digest::ZERO;
    let mut expected_seq: u64 = 0;
    let mut offset: u64 = 0;

    let mut rest = bytes;
    while !rest.is_empty() {
        let (line, consumed, complete) = match rest.iter().position(|&b| b == b'\n') {
            Some(pos) => (&rest[..pos], pos + 1, true),
            None => (rest, rest.len(), false),
        };
        let line_offset = offset;
        offset += consumed as u64;
        rest = &rest[consumed..];

        if line.iter().all(|b| b.is_ascii_whitespace()) {
            continue;
        }

        let entry: RewardEntry = match serde_json::from_slice(line) {
            Ok(e) => e,
            Err(err) => {
                if complete && !rest.is_empty() {
                    // An unparseable line with entries after it is real
                    // corruption, not a torn append.
                    divergences.push(Divergence {
                        seq: expected_seq,
                        byte_offset: line_offset,
                        reason: format!("unparseable entry: {err}"),
                    });
                } else {
                    trailing_garbage_at = Some(line_offset);
                }
                break;
            }
        };

        let mut entry_ok = true;
        if entry.seq != expected_seq {
            divergences.push(Divergence {
                seq: entry.seq,
                byte_offset: line_offset,
                reason: format!("expected seq {}, found {}", expected_seq, entry.seq),
            });
            entry_ok = false;
        }
        if entry.prev_hash != prev_hash {
            divergences.push(Divergence {
                seq: entry.seq,
                byte_offset: line_offset,
                reason: format!(
                    "stale prev_hash: expected {}, found {}",
                    prev_hash, entry.prev_hash
                ),
            });
            entry_ok = false;
        }
        let recomputed = entry.compute_hash();
        if recomputed != entry.entry_hash {
            divergences.push(Divergence {
                seq: entry.seq,
                byte_offset: line_offset,
                reason: "entry_hash does not match canonical fields".to_string(),
            });
            entry_ok = false;
        }

        prev_hash = recomputed;
        expected_seq = entry.seq + 1;
        if entry_ok && divergences.is_empty() {
            entries.push(entry);
        }
    }

    Scan {
        entries,
        divergences,
        trailing_garbage_at,
    }
}
