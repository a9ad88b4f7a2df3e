//! The chain engine.
//!
//! Owns the block list, account balances, per-sender nonces, mempool, and
//! burst window. All mutation goes through a single writer (the node crate
//! serializes callers); every consensus computation here is a pure function
//! of chain data plus the signal snapshot bound at template time.

use crate::block::{merkle_root, Block, BlockHeader, BlockSummary, BLOCK_VERSION};
use crate::mempool::Mempool;
use aegis_policy::{decisions_digest, score_tx, BurstWindow, PolicyDecision};
use aegis_rewards::{RewardDraft, RewardsLedger, VerifyReport};
use aegis_signals::SignalSnapshot;
use aegis_store::{BlockFileStore, Datadir, MempoolSnapshot, StateSnapshot};
use aegis_tokenomics::{Bucket, EmissionState, TokenomicsEngine};
use aegis_transactions::{
    validate_transfer, CoinbaseTx, SignatureVerifier, Transaction, TransferTx,
};
use aegis_types::{
    Address, AegisError, BlockHash, ChainParams, Digest, Timestamp, TxHash,
};
use aegis_work::{hash_meets_target, next_bits, CancelToken, Miner, WorkError};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a successful mempool admission.
#[derive(Clone, Debug)]
pub struct AdmissionResult {
    pub txid: TxHash,
    pub decision: PolicyDecision,
}

/// A candidate block plus the context bound at build time: the signal
/// snapshot (fixed through PoW so retargeting cannot move the subsidy
/// mid-mine) and the per-transaction policy decisions.
#[derive(Clone, Debug)]
pub struct BlockTemplate {
    pub height: u64,
    pub header: BlockHeader,
    pub txs: Vec<Transaction>,
    pub subsidy: u64,
    /// Sum of effective fees of the included transfers.
    pub fees_total: u64,
    pub snapshot: SignalSnapshot,
    pub decisions_digest: Digest,
}

/// What a completed mine/append cycle produced.
#[derive(Clone, Debug)]
pub struct MineOutcome {
    pub summary: BlockSummary,
    pub coinbase_paid: u64,
    pub subsidy: u64,
    pub fees_total: u64,
}

/// Template context retained for validating the matching append.
struct PendingTemplate {
    merkle_root: BlockHash,
    prev_hash: BlockHash,
    subsidy: u64,
    fees_total: u64,
    snapshot_digest: Digest,
    decisions_digest: Digest,
}

pub struct ChainEngine {
    params: ChainParams,
    datadir: Datadir,
    block_files: BlockFileStore,
    verifier: Arc<dyn SignatureVerifier>,
    tokenomics: TokenomicsEngine,
    ledger: RewardsLedger,

    summaries: Vec<BlockSummary>,
    balances: HashMap<Address, u64>,
    nonces: HashMap<Address, u64>,
    mempool: Mempool,
    burst: BurstWindow,
    /// Difficulty the next block must carry.
    next_bits: u32,
    pending_template: Option<PendingTemplate>,
}

impl ChainEngine {
    /// Open a chain at `datadir`, creating and mining the genesis block if
    /// none exists. Replays `blocks/` to rebuild balances and nonces; the
    /// mempool always starts empty.
    pub fn open(
        datadir: Datadir,
        params: ChainParams,
        verifier: Arc<dyn SignatureVerifier>,
        now: Timestamp,
    ) -> Result<Self, AegisError> {
        datadir.ensure().map_err(storage)?;
        let block_files = BlockFileStore::new(datadir.clone());

        let heights = block_files.heights().map_err(storage)?;
        let genesis = if heights.is_empty() {
            let block = Self::make_genesis(&params, now)?;
            block_files.put(0, &block.encode()).map_err(storage)?;
            tracing::info!(hash = %block.hash(), "mined genesis block");
            block
        } else {
            let bytes = block_files.get(0).map_err(storage)?;
            Block::decode(&bytes).map_err(|e| {
                AegisError::Storage(format!("genesis block file is corrupt: {e}"))
            })?
        };
        let genesis_ts = Timestamp::new(genesis.header.timestamp);

        let tokenomics = TokenomicsEngine::open(&datadir, params.clone(), genesis_ts)
            .map_err(|e| AegisError::Storage(e.to_string()))?;
        let ledger = RewardsLedger::open(datadir.ledger_file()).map_err(ledger_error)?;

        let mut engine = Self {
            mempool: Mempool::new(params.max_mempool_txs),
            params,
            datadir,
            block_files,
            verifier,
            tokenomics,
            ledger,
            summaries: Vec::new(),
            balances: HashMap::new(),
            nonces: HashMap::new(),
            burst: BurstWindow::default(),
            next_bits: 0,
            pending_template: None,
        };
        engine.replay_all()?;
        engine.persist_state_mirror();
        Ok(engine)
    }

    // ── Reads ───────────────────────────────────────────────────────────

    pub fn balance(&self, addr: &Address) -> u64 {
        self.balances.get(addr).copied().unwrap_or(0)
    }

    pub fn height(&self) -> u64 {
        (self.summaries.len() as u64).saturating_sub(1)
    }

    pub fn tip(&self) -> BlockSummary {
        self.summaries.last().expect("chain has a genesis").clone()
    }

    /// Block summaries starting at `from`, at most `n`.
    pub fn range(&self, from: u64, n: usize) -> Vec<BlockSummary> {
        self.summaries
            .iter()
            .skip(from as usize)
            .take(n)
            .cloned()
            .collect()
    }

    /// The most recent `n` summaries.
    pub fn chain_tail(&self, n: usize) -> Vec<BlockSummary> {
        let start = self.summaries.len().saturating_sub(n);
        self.summaries[start..].to_vec()
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn next_bits(&self) -> u32 {
        self.next_bits
    }

    pub fn mempool_len(&self) -> usize {
        self.mempool.len()
    }

    pub fn emission_state(&self) -> &EmissionState {
        self.tokenomics.state()
    }

    pub fn vested(&self, bucket: Bucket, now: Timestamp) -> u64 {
        self.tokenomics.vested(bucket, now)
    }

    pub fn verify_ledger(&self) -> Result<VerifyReport, AegisError> {
        self.ledger.verify().map_err(ledger_error)
    }

    pub fn ledger_tail(&self, n: usize) -> Vec<aegis_rewards::RewardEntry> {
        self.ledger.tail(n).to_vec()
    }

    /// Test hook: preload an already-minted total (e.g. near the cap).
    pub fn preload_minted(&mut self, minted_total: u64) -> Result<(), AegisError> {
        self.tokenomics
            .preload_minted(minted_total)
            .map_err(|e| AegisError::Storage(e.to_string()))
    }

    // ── Admission ───────────────────────────────────────────────────────

    /// Admit a transfer into the mempool.
    ///
    /// Rejection order: malformed input, bad signature, duplicate or stale
    /// `(sender, nonce)`, insufficient balance net of pending debits,
    /// policy deny, then mempool capacity.
    pub fn submit_tx(&mut self, tx: TransferTx) -> Result<AdmissionResult, AegisError> {
        validate_transfer(&tx, self.params.max_memo_bytes)
            .map_err(|e| AegisError::Validation(e.to_string()))?;

        if !self.verifier.verify(&tx) {
            return Err(AegisError::Validation(
                "signature verification failed".into(),
            ));
        }

        let last_nonce = self.nonces.get(&tx.sender).copied().unwrap_or(0);
        if tx.nonce <= last_nonce {
            return Err(AegisError::Conflict(format!(
                "nonce {} for {} is not above the accepted nonce {}",
                tx.nonce, tx.sender, last_nonce
            )));
        }
        if self.mempool.contains(&tx.sender, tx.nonce) {
            return Err(AegisError::Conflict(format!(
                "transaction ({}, nonce {}) already pending",
                tx.sender, tx.nonce
            )));
        }

        let spend = tx.spend().ok_or_else(|| {
            AegisError::Validation("amount plus fee overflows".into())
        })?;
        let available = self
            .balance(&tx.sender)
            .saturating_sub(self.mempool.pending_debit(&tx.sender));
        if available < spend {
            return Err(AegisError::InsufficientFunds {
                needed: spend,
                available,
            });
        }

        let recent = self.burst.recent_count(&tx.sender, tx.timestamp);
        let decision = score_tx(&tx, recent);
        if !decision.allows() {
            return Err(AegisError::PolicyDenied {
                suspicion_bps: decision.suspicion_bps,
                reasons: decision.reasons,
                suggestions: decision.suggestions,
            });
        }

        let txid = tx.txid();
        self.mempool.insert(tx, txid, decision.clone())?;
        self.persist_mempool_mirror();
        Ok(AdmissionResult { txid, decision })
    }

    // ── Block production ────────────────────────────────────────────────

    /// Assemble a candidate block for `miner`. The caller captures the
    /// signal snapshot outside any lock and passes it in; it stays bound to
    /// the block through mining.
    pub fn build_block_template(
        &mut self,
        miner: &Address,
        snapshot: SignalSnapshot,
        now: Timestamp,
    ) -> Result<BlockTemplate, AegisError> {
        if !miner.is_well_formed() {
            return Err(AegisError::Validation(format!(
                "miner identity {miner:?} is malformed"
            )));
        }

        let tip = self.tip();
        let height = tip.height + 1;
        let timestamp = now.as_secs().max(tip.timestamp);

        let (transfers, decisions, fees_total) = self.select_transactions();
        let subsidy = self.tokenomics.subsidy(height, &snapshot);

        let coinbase = Transaction::Coinbase(CoinbaseTx {
            recipient: miner.clone(),
            amount: subsidy + fees_total,
            height,
            timestamp: Timestamp::new(timestamp),
        });

        let mut txs = Vec::with_capacity(1 + transfers.len());
        txs.push(coinbase);
        txs.extend(transfers.into_iter().map(Transaction::Transfer));
        let txids: Vec<TxHash> = txs.iter().map(|t| t.txid()).collect();

        let decision_refs: Vec<(TxHash, &PolicyDecision)> =
            decisions.iter().map(|(id, d)| (*id, d)).collect();
        let decisions_digest = decisions_digest(&decision_refs);

        let header = BlockHeader {
            version: BLOCK_VERSION,
            prev_hash: tip.hash,
            merkle_root: merkle_root(&txids),
            timestamp,
            bits: self.next_bits,
            nonce: 0,
        };

        self.pending_template = Some(PendingTemplate {
            merkle_root: header.merkle_root,
            prev_hash: header.prev_hash,
            subsidy,
            fees_total,
            snapshot_digest: snapshot.digest(),
            decisions_digest,
        });

        tracing::debug!(
            height,
            txs = txs.len(),
            subsidy,
            fees_total,
            signal = %snapshot.source_tag,
            "built block template"
        );
        Ok(BlockTemplate {
            height,
            header,
            txs,
            subsidy,
            fees_total,
            snapshot,
            decisions_digest,
        })
    }

    /// Run the PoW search for a template. An associated function on
    /// purpose: the search owns no engine state, so callers run it without
    /// holding any lock. The cancellation token stops it at the next nonce
    /// stride.
    pub fn mine(template: &BlockTemplate, cancel: &CancelToken) -> Result<Block, AegisError> {
        let base = template.header;
        let miner = Miner;
        let solution = miner
            .solve(base.timestamp, base.bits, cancel, |ts, nonce| {
                let header = BlockHeader {
                    timestamp: ts,
                    nonce,
                    ..base
                };
                *header.hash().as_bytes()
            })
            .map_err(|e| match e {
                WorkError::Cancelled => AegisError::Conflict("mining cancelled".into()),
                WorkError::InvalidBits(b) => {
                    AegisError::Consensus(format!("difficulty bits {b} out of range"))
                }
            })?;

        Ok(Block {
            header: BlockHeader {
                timestamp: solution.timestamp,
                nonce: solution.nonce,
                ..base
            },
            txs: template.txs.clone(),
        })
    }

    /// Validate and append a mined block, then advance tokenomics and the
    /// rewards ledger. All-or-nothing: on error nothing in memory changes
    /// and the staged block file is removed.
    pub fn append_block(&mut self, block: Block) -> Result<MineOutcome, AegisError> {
        let tip = self.tip();
        let height = tip.height + 1;

        let ctx = self.validate_block(&block, &tip, height)?;
        let block_ts = Timestamp::new(block.header.timestamp);

        // Stage the state transition.
        let mut balances = self.balances.clone();
        let mut nonces = self.nonces.clone();
        let (coinbase_paid, fees_effective) =
            apply_block_to_state(&block, &mut balances, &mut nonces, |tx| {
                let recent = self.burst.recent_count(&tx.sender, tx.timestamp);
                score_tx(tx, recent).effective_fee(tx.fee)
            })
            .map_err(AegisError::Consensus)?;
        debug_assert_eq!(fees_effective, ctx.fees_total);

        let subsidy_minted = coinbase_paid.saturating_sub(ctx.fees_total);

        // Durability order: block file, emission state, then the ledger
        // entry (audit trail last, never ahead of the truth). The state
        // and mempool mirrors are best-effort and written after commit.
        self.block_files
            .put(height, &block.encode())
            .map_err(storage)?;

        let emission_before = self.tokenomics.state().clone();
        if let Err(err) = self.tokenomics.apply(subsidy_minted, block_ts) {
            let _ = std::fs::remove_file(self.datadir.block_file(height));
            return Err(match err {
                e @ aegis_tokenomics::TokenomicsError::SupplyExceeded { .. } => {
                    AegisError::Consensus(e.to_string())
                }
                other => AegisError::Storage(other.to_string()),
            });
        }

        let miner = match &block.txs[0] {
            Transaction::Coinbase(cb) => cb.recipient.clone(),
            _ => unreachable!("validated: first tx is coinbase"),
        };
        let draft = RewardDraft {
            block_height: height,
            miner,
            subsidy: subsidy_minted,
            fees_total: ctx.fees_total,
            signals_digest: ctx.snapshot_digest,
            policy_decisions_digest: ctx.decisions_digest,
            timestamp: block_ts,
        };
        if let Err(err) = self.ledger.append(draft) {
            // Unwind the emission state and the staged block file.
            let _ = self.tokenomics.restore(emission_before);
            let _ = std::fs::remove_file(self.datadir.block_file(height));
            return Err(ledger_error(err));
        }

        // Commit.
        self.balances = balances;
        self.nonces = nonces;
        for tx in &block.txs {
            if let Transaction::Transfer(t) = tx {
                self.mempool.remove(&t.sender, t.nonce);
                self.burst.record(&t.sender, t.timestamp);
            }
        }
        let summary = BlockSummary {
            height,
            hash: block.hash(),
            timestamp: block.header.timestamp,
            tx_count: block.txs.len(),
            bits: block.header.bits,
        };
        self.summaries.push(summary.clone());
        self.next_bits = self.compute_next_bits();
        self.pending_template = None;

        self.persist_state_mirror();
        self.persist_mempool_mirror();

        tracing::info!(
            height,
            hash = %summary.hash,
            txs = summary.tx_count,
            coinbase_paid,
            subsidy = subsidy_minted,
            "block appended"
        );
        Ok(MineOutcome {
            summary,
            coinbase_paid,
            subsidy: subsidy_minted,
            fees_total: ctx.fees_total,
        })
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn make_genesis(params: &ChainParams, now: Timestamp) -> Result<Block, AegisError> {
        // Genesis mints nothing; the whole supply is emitted over time.
        let coinbase = Transaction::Coinbase(CoinbaseTx {
            recipient: Address::new(params.genesis_tag.clone()),
            amount: 0,
            height: 0,
            timestamp: now,
        });
        let txids = vec![coinbase.txid()];
        let base = BlockHeader {
            version: BLOCK_VERSION,
            prev_hash: BlockHash::ZERO,
            merkle_root: merkle_root(&txids),
            timestamp: now.as_secs(),
            bits: params.initial_bits,
            nonce: 0,
        };

        let miner = Miner;
        let solution = miner
            .solve(base.timestamp, base.bits, &CancelToken::new(), |ts, nonce| {
                let header = BlockHeader {
                    timestamp: ts,
                    nonce,
                    ..base
                };
                *header.hash().as_bytes()
            })
            .map_err(|e| AegisError::Consensus(format!("genesis mining failed: {e}")))?;

        Ok(Block {
            header: BlockHeader {
                timestamp: solution.timestamp,
                nonce: solution.nonce,
                ..base
            },
            txs: vec![coinbase],
        })
    }

    /// Greedy selection by effective-fee density, respecting per-sender
    /// nonce order, spendable balance, and the block weight limit.
    /// Effective fees come from rescoring against the pre-block burst
    /// window, which replay reproduces exactly.
    fn select_transactions(&self) -> (Vec<TransferTx>, Vec<(TxHash, PolicyDecision)>, u64) {
        struct Candidate {
            tx: TransferTx,
            txid: TxHash,
            decision: PolicyDecision,
            effective_fee: u64,
            size: u64,
            seq: u64,
        }

        let mut candidates: Vec<Candidate> = self
            .mempool
            .iter_insertion_order()
            .into_iter()
            .map(|entry| {
                let recent = self.burst.recent_count(&entry.tx.sender, entry.tx.timestamp);
                let decision = score_tx(&entry.tx, recent);
                Candidate {
                    effective_fee: decision.effective_fee(entry.tx.fee),
                    txid: entry.txid,
                    decision,
                    size: entry.encoded_size,
                    seq: entry.seq(),
                    tx: entry.tx.clone(),
                }
            })
            .filter(|c| c.decision.allows())
            .collect();

        // Density descending, insertion order ascending on ties.
        candidates.sort_by(|a, b| {
            let lhs = b.effective_fee as u128 * a.size as u128;
            let rhs = a.effective_fee as u128 * b.size as u128;
            lhs.cmp(&rhs).then(a.seq.cmp(&b.seq))
        });

        let mut selected: Vec<TransferTx> = Vec::new();
        let mut decisions: Vec<(TxHash, PolicyDecision)> = Vec::new();
        let mut fees_total: u64 = 0;
        let mut weight: u64 = 0;
        let mut staged_balances: HashMap<Address, u64> = HashMap::new();
        let mut staged_nonces: HashMap<Address, u64> = HashMap::new();
        let mut used = vec![false; candidates.len()];

        // Repeated passes: picking one transaction can unlock a same-sender
        // successor with a higher nonce.
        loop {
            let mut progressed = false;
            for (i, cand) in candidates.iter().enumerate() {
                if used[i] {
                    continue;
                }
                if weight + cand.size > self.params.max_block_weight {
                    continue;
                }
                let sender = &cand.tx.sender;
                let next_nonce = staged_nonces
                    .get(sender)
                    .copied()
                    .unwrap_or_else(|| self.nonces.get(sender).copied().unwrap_or(0))
                    + 1;
                if cand.tx.nonce != next_nonce {
                    continue;
                }
                let balance = staged_balances
                    .get(sender)
                    .copied()
                    .unwrap_or_else(|| self.balance(sender));
                let Some(spend) = cand.tx.amount().checked_add(cand.effective_fee) else {
                    continue;
                };
                if balance < spend {
                    continue;
                }

                staged_balances.insert(sender.clone(), balance - spend);
                staged_nonces.insert(sender.clone(), cand.tx.nonce);
                weight += cand.size;
                fees_total += cand.effective_fee;
                selected.push(cand.tx.clone());
                decisions.push((cand.txid, cand.decision.clone()));
                used[i] = true;
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        (selected, decisions, fees_total)
    }

    fn validate_block(
        &self,
        block: &Block,
        tip: &BlockSummary,
        height: u64,
    ) -> Result<PendingTemplate, AegisError> {
        let consensus = |msg: String| Err(AegisError::Consensus(msg));

        if block.txs.is_empty() {
            return consensus("block has no transactions".into());
        }
        if !block.txs[0].is_coinbase() {
            return consensus("first transaction must be the coinbase".into());
        }
        if block.txs.iter().skip(1).any(Transaction::is_coinbase) {
            return consensus("block carries more than one coinbase".into());
        }
        if block.height() != Some(height) {
            return consensus(format!(
                "coinbase height {:?} does not extend the tip at {}",
                block.height(),
                tip.height
            ));
        }
        if block.header.version != BLOCK_VERSION {
            return consensus(format!(
                "unsupported block version {}",
                block.header.version
            ));
        }
        if block.header.prev_hash != tip.hash {
            return consensus("prev_hash does not match the tip".into());
        }
        if block.header.timestamp < tip.timestamp {
            return consensus("block timestamp went backwards".into());
        }
        if block.header.bits != self.next_bits {
            return consensus(format!(
                "unexpected difficulty bits {} (want {})",
                block.header.bits, self.next_bits
            ));
        }
        if !hash_meets_target(block.hash().as_bytes(), block.header.bits) {
            return consensus("proof of work does not meet the target".into());
        }

        let txids: Vec<TxHash> = block.txs.iter().map(|t| t.txid()).collect();
        if merkle_root(&txids) != block.header.merkle_root {
            return consensus("merkle root mismatch".into());
        }
        if block.weight() > self.params.max_block_weight {
            return consensus(format!(
                "block weight {} exceeds the limit {}",
                block.weight(),
                self.params.max_block_weight
            ));
        }

        // Transfers must re-pass admission-grade checks.
        let mut fees_total: u64 = 0;
        for tx in block.txs.iter().skip(1) {
            let Transaction::Transfer(t) = tx else {
                unreachable!("coinbase positions checked above");
            };
            validate_transfer(t, self.params.max_memo_bytes)
                .map_err(|e| AegisError::Consensus(format!("invalid transaction: {e}")))?;
            if !self.verifier.verify(t) {
                return consensus(format!("transaction {} fails signature check", t.txid()));
            }
            let recent = self.burst.recent_count(&t.sender, t.timestamp);
            let decision = score_tx(t, recent);
            if !decision.allows() {
                return consensus(format!(
                    "transaction {} is policy-denied at block level",
                    t.txid()
                ));
            }
            fees_total += decision.effective_fee(t.fee);
        }

        let Transaction::Coinbase(cb) = &block.txs[0] else {
            unreachable!("checked above");
        };
        if !cb.recipient.is_well_formed() {
            return consensus("coinbase recipient is malformed".into());
        }

        let ctx = match self.pending_template.as_ref() {
            Some(ctx)
                if ctx.merkle_root == block.header.merkle_root
                    && ctx.prev_hash == block.header.prev_hash =>
            {
                PendingTemplate {
                    merkle_root: ctx.merkle_root,
                    prev_hash: ctx.prev_hash,
                    subsidy: ctx.subsidy,
                    fees_total,
                    snapshot_digest: ctx.snapshot_digest,
                    decisions_digest: ctx.decisions_digest,
                }
            }
            _ => {
                return consensus(
                    "no matching template context; build a template before appending".into(),
                )
            }
        };

        let max_coinbase = ctx.subsidy.saturating_add(fees_total);
        if cb.amount > max_coinbase {
            return consensus(format!(
                "coinbase pays {} but subsidy {} + fees {} allow only {}",
                cb.amount, ctx.subsidy, fees_total, max_coinbase
            ));
        }
        let subsidy_minted = cb.amount.saturating_sub(fees_total);
        let minted_after = self
            .tokenomics
            .state()
            .minted_total
            .saturating_add(subsidy_minted);
        if minted_after > self.params.total_supply {
            return consensus(format!(
                "supply cap exceeded: {} after this block",
                minted_after
            ));
        }

        Ok(ctx)
    }

    /// Replay every block file into memory. Re-checks PoW, linkage, and
    /// merkle roots (cheap corruption detection) but trusts coinbase
    /// amounts: the bound snapshot is not persisted, only its digest in
    /// the rewards ledger.
    fn replay_all(&mut self) -> Result<(), AegisError> {
        let heights = self.block_files.heights().map_err(storage)?;
        let mut prev_hash = BlockHash::ZERO;
        let mut prev_ts = 0u64;

        for (expected, height) in heights.iter().copied().enumerate() {
            if height != expected as u64 {
                return Err(AegisError::Storage(format!(
                    "block files are not contiguous: expected {expected}, found {height}"
                )));
            }
            let bytes = self.block_files.get(height).map_err(storage)?;
            let block = Block::decode(&bytes)
                .map_err(|e| AegisError::Storage(format!("block {height} corrupt: {e}")))?;

            if block.height() != Some(height) {
                return Err(AegisError::Consensus(format!(
                    "block file {height} carries coinbase height {:?}",
                    block.height()
                )));
            }
            if block.header.prev_hash != prev_hash {
                return Err(AegisError::Consensus(format!(
                    "block {height} does not chain from its parent"
                )));
            }
            if height > 0 && block.header.timestamp < prev_ts {
                return Err(AegisError::Consensus(format!(
                    "block {height} timestamp went backwards"
                )));
            }
            if !hash_meets_target(block.hash().as_bytes(), block.header.bits) {
                return Err(AegisError::Consensus(format!(
                    "block {height} fails its proof of work"
                )));
            }
            let txids: Vec<TxHash> = block.txs.iter().map(|t| t.txid()).collect();
            if merkle_root(&txids) != block.header.merkle_root {
                return Err(AegisError::Consensus(format!(
                    "block {height} merkle root mismatch"
                )));
            }

            apply_block_to_state(&block, &mut self.balances, &mut self.nonces, |tx| {
                let recent = self.burst.recent_count(&tx.sender, tx.timestamp);
                score_tx(tx, recent).effective_fee(tx.fee)
            })
            .map_err(AegisError::Consensus)?;

            for tx in &block.txs {
                if let Transaction::Transfer(t) = tx {
                    self.burst.record(&t.sender, t.timestamp);
                }
            }

            prev_hash = block.hash();
            prev_ts = block.header.timestamp;
            self.summaries.push(BlockSummary {
                height,
                hash: prev_hash,
                timestamp: block.header.timestamp,
                tx_count: block.txs.len(),
                bits: block.header.bits,
            });
        }

        self.next_bits = self.compute_next_bits();

        let total_balance: u64 = self.balances.values().sum();
        let minted = self.tokenomics.state().minted_total;
        if total_balance != minted {
            tracing::warn!(
                total_balance,
                minted,
                "replayed balances do not match the recorded emission total"
            );
        }
        Ok(())
    }

    /// Difficulty for the block after the current tip. Retargets on
    /// interval boundaries from the median of recent inter-block gaps.
    fn compute_next_bits(&self) -> u32 {
        let tip = self.summaries.last().expect("chain has a genesis");
        let next_height = tip.height + 1;
        let interval = self.params.retarget_interval.max(1);
        if next_height % interval != 0 {
            return tip.bits;
        }
        let window = (interval + 1) as usize;
        let start = self.summaries.len().saturating_sub(window);
        let timestamps: Vec<u64> = self.summaries[start..]
            .iter()
            .map(|s| s.timestamp)
            .collect();
        let adjusted = next_bits(
            tip.bits,
            &timestamps,
            self.params.target_block_time_secs,
            self.params.min_bits,
            self.params.max_bits,
        );
        if adjusted != tip.bits {
            tracing::info!(
                from = tip.bits,
                to = adjusted,
                height = next_height,
                "difficulty retarget"
            );
        }
        adjusted
    }

    /// Mirror balances/nonces/tip to `state.json`. Best-effort: the file
    /// is a restart cache, always rebuildable from `blocks/`.
    fn persist_state_mirror(&self) {
        let tip = self.tip();
        let snapshot = StateSnapshot {
            height: tip.height,
            tip_hash: tip.hash,
            bits: self.next_bits,
            balances: self
                .balances
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
            nonces: self
                .nonces
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), *v))
                .collect(),
        };
        if let Err(err) = snapshot.save(&self.datadir.state_file()) {
            tracing::warn!(%err, "failed to mirror state.json");
        }
    }

    fn persist_mempool_mirror(&self) {
        let snapshot = MempoolSnapshot {
            pending: self.mempool.pending_txs(),
        };
        snapshot.save_best_effort(&self.datadir.mempool_file());
    }
}

/// Apply a block to staged balances/nonces. Returns
/// `(coinbase_paid, effective_fees_total)` or a reason string.
fn apply_block_to_state(
    block: &Block,
    balances: &mut HashMap<Address, u64>,
    nonces: &mut HashMap<Address, u64>,
    effective_fee: impl Fn(&TransferTx) -> u64,
) -> Result<(u64, u64), String> {
    let mut coinbase_paid = 0u64;
    let mut fees_total = 0u64;

    for tx in &block.txs {
        match tx {
            Transaction::Coinbase(cb) => {
                coinbase_paid = cb.amount;
                *balances.entry(cb.recipient.clone()).or_insert(0) += cb.amount;
            }
            Transaction::Transfer(t) => {
                let eff = effective_fee(t);
                fees_total += eff;

                let spend = t
                    .amount()
                    .checked_add(eff)
                    .ok_or_else(|| format!("transaction {} spend overflows", t.txid()))?;
                let balance = balances.get(&t.sender).copied().unwrap_or(0);
                if balance < spend {
                    return Err(format!(
                        "sender {} has {} but spends {}",
                        t.sender, balance, spend
                    ));
                }
                let last_nonce = nonces.get(&t.sender).copied().unwrap_or(0);
                if t.nonce <= last_nonce {
                    return Err(format!(
                        "sender {} nonce {} does not increase past {}",
                        t.sender, t.nonce, last_nonce
                    ));
                }

                balances.insert(t.sender.clone(), balance - spend);
                nonces.insert(t.sender.clone(), t.nonce);
                for out in &t.outputs {
                    *balances.entry(out.recipient.clone()).or_insert(0) += out.amount;
                }
            }
        }
    }
    Ok((coinbase_paid, fees_total))
}

fn storage(err: aegis_store::StoreError) -> AegisError {
    AegisError::Storage(err.to_string())
}

fn ledger_error(err: aegis_rewards::LedgerError) -> AegisError {
    match err {
        aegis_rewards::LedgerError::Corrupt { seq, offset, detail } => {
            AegisError::LedgerCorruption {
                seq,
                offset,
                detail,
            }
        }
        other => AegisError::Storage(other.to_string()),
    }
}
