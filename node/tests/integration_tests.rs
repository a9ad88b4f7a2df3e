//! End-to-end scenarios exercising the full pipeline:
//! admission → policy → template → PoW → append → tokenomics → ledger.
//!
//! Difficulty is zero bits throughout so the searches return instantly;
//! every other parameter is the production default unless a scenario says
//! otherwise.

use aegis_chain::{ChainEngine, MineOutcome};
use aegis_node::{Node, NodeConfig};
use aegis_rewards::verify_file;
use aegis_signals::{SignalSnapshot, StaticSource};
use aegis_store::Datadir;
use aegis_transactions::{AcceptAllVerifier, NonEmptySignatureVerifier, TransferTx, TxOut};
use aegis_types::{Address, AegisError, ChainParams, Timestamp};
use aegis_work::CancelToken;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dev_params() -> ChainParams {
    ChainParams {
        initial_bits: 0,
        ..Default::default()
    }
}

fn node_with_signals(dir: &std::path::Path, snapshot: SignalSnapshot) -> Node {
    let config = NodeConfig {
        data_dir: dir.to_path_buf(),
        params: dev_params(),
        ..Default::default()
    };
    Node::open(
        config,
        Arc::new(NonEmptySignatureVerifier),
        Box::new(StaticSource(snapshot)),
    )
    .unwrap()
}

fn zero_pressure() -> SignalSnapshot {
    SignalSnapshot::zero(Timestamp::new(1_700_000_000))
}

fn transfer(sender: &str, to: &str, amount: u64, fee: u64, nonce: u64) -> TransferTx {
    TransferTx {
        sender: Address::new(sender),
        outputs: vec![TxOut {
            recipient: Address::new(to),
            amount,
        }],
        fee,
        memo: None,
        timestamp: Timestamp::now(),
        nonce,
        signature: vec![0x01; 64],
    }
}

fn mine(node: &Node, miner: &str) -> MineOutcome {
    node.mine(Some(miner), &CancelToken::new()).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Genesis + one empty block at zero pressure
// ---------------------------------------------------------------------------

#[test]
fn genesis_plus_one_empty_block_pays_the_baseline() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());

    // Genesis mints nothing.
    assert_eq!(node.tip().height, 0);
    assert_eq!(node.emission_status(Timestamp::now()).state.minted_total, 0);

    // floor(100_000_000 / 5_256_000) = 19 with default 10y/60s schedule.
    let outcome = mine(&node, "miner_a");
    assert_eq!(outcome.subsidy, 19);
    assert_eq!(outcome.coinbase_paid, 19);
    assert_eq!(node.balance(&Address::new("miner_a")), 19);
    assert_eq!(node.emission_status(Timestamp::now()).state.minted_total, 19);

    let tail = node.ledger_tail(1);
    assert_eq!(tail[0].seq, 0);
    assert_eq!(tail[0].subsidy, 19);
    assert_eq!(tail[0].prev_hash.to_hex(), "0".repeat(64));
}

// ---------------------------------------------------------------------------
// 2. Supply-cap clamp
// ---------------------------------------------------------------------------

#[test]
fn supply_cap_clamps_and_then_pays_zero() {
    let dir = tempfile::tempdir().unwrap();
    // A one-block horizon makes the baseline drain the remaining supply
    // immediately (the default horizon floors the baseline at 1 instead).
    let params = ChainParams {
        initial_bits: 0,
        target_years: 0,
        ..Default::default()
    };
    let mut engine = ChainEngine::open(
        Datadir::new(dir.path()),
        params,
        Arc::new(AcceptAllVerifier),
        Timestamp::new(1_700_000_000),
    )
    .unwrap();
    engine.preload_minted(99_999_990).unwrap();

    let mine_one = |engine: &mut ChainEngine, at: u64| {
        let template = engine
            .build_block_template(
                &Address::new("miner_a"),
                SignalSnapshot::zero(Timestamp::new(at)),
                Timestamp::new(at),
            )
            .unwrap();
        let block = ChainEngine::mine(&template, &CancelToken::new()).unwrap();
        engine.append_block(block).unwrap()
    };

    let outcome = mine_one(&mut engine, 1_700_000_060);
    assert_eq!(outcome.subsidy, 10, "payout clamps to the remaining supply");
    assert_eq!(engine.emission_state().minted_total, 100_000_000);

    let outcome = mine_one(&mut engine, 1_700_000_120);
    assert_eq!(outcome.subsidy, 0, "the cap is final");
    assert_eq!(engine.emission_state().minted_total, 100_000_000);
}

// ---------------------------------------------------------------------------
// 3. Pressure bump
// ---------------------------------------------------------------------------

#[test]
fn fee_pressure_bumps_the_subsidy() {
    let dir = tempfile::tempdir().unwrap();
    let busy = SignalSnapshot {
        fee_fast: 100,
        mempool_txs: 0,
        ..zero_pressure()
    };
    let node = node_with_signals(dir.path(), busy);

    // fee_pressure = 100/50 = 2.0; multiplier = 1 + min(0.75, 0.5) = 1.5;
    // coinbase = floor(19 * 1.5) = 28, well under MAX_SUBSIDY.
    let outcome = mine(&node, "miner_a");
    assert_eq!(outcome.subsidy, 28);
    assert_eq!(outcome.coinbase_paid, 28);
}

// ---------------------------------------------------------------------------
// 4. Policy deny
// ---------------------------------------------------------------------------

#[test]
fn extreme_spam_is_denied_at_admission() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());
    mine(&node, "alice");

    let mut spam = transfer("alice", "bob", 10, 0, 1);
    spam.memo = Some("FREE MONEY airdrop claim http://x".into());
    spam.outputs = (0..10)
        .map(|i| TxOut {
            recipient: Address::new(format!("out_{i}")),
            amount: 1,
        })
        .collect();

    let err = node.submit_tx(spam).unwrap_err();
    let aegis_node::NodeError::Core(AegisError::PolicyDenied {
        suspicion_bps,
        reasons,
        ..
    }) = err
    else {
        panic!("expected PolicyDenied");
    };
    assert!(suspicion_bps >= 9_000);
    assert!(reasons.iter().any(|r| r == "tx_denied_extreme_spam"));
}

// ---------------------------------------------------------------------------
// 5. Ledger tamper detection
// ---------------------------------------------------------------------------

#[test]
fn tampered_ledger_fails_verification_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());
    for _ in 0..3 {
        mine(&node, "miner_a");
    }
    assert!(node.verify_ledger().unwrap().ok);

    // Flip one byte inside entry 1's miner field, offline.
    let path = dir.path().join("rewards_ledger.jsonl");
    let mut bytes = std::fs::read(&path).unwrap();
    let text = String::from_utf8(bytes.clone()).unwrap();
    let line_start = text.find('\n').unwrap() + 1;
    let pos = text[line_start..].find("miner_a").unwrap() + line_start;
    bytes[pos + 6] = b'x';
    std::fs::write(&path, &bytes).unwrap();

    let report = verify_file(&path).unwrap();
    assert!(!report.ok);
    assert_eq!(report.first_divergence().unwrap().seq, 1);
    assert!(report
        .divergences
        .iter()
        .any(|d| d.seq == 2 && d.reason.contains("stale prev_hash")));
}

// ---------------------------------------------------------------------------
// 6. Mempool priority
// ---------------------------------------------------------------------------

#[test]
fn higher_fee_appears_first_in_the_block() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());
    // Default subsidy (19/block) is too small to fund fees quickly, so
    // accumulate a few blocks per sender.
    for _ in 0..40 {
        mine(&node, "sender_low");
    }
    for _ in 0..40 {
        mine(&node, "sender_high");
    }

    node.submit_tx(transfer("sender_low", "sink", 100, 110, 1))
        .unwrap();
    node.submit_tx(transfer("sender_high", "sink", 100, 550, 1))
        .unwrap();

    let outcome = mine(&node, "miner_z");
    assert_eq!(outcome.fees_total, 110 + 550);

    // Read the block body back from disk and check transfer order.
    let height = outcome.summary.height;
    let bytes = std::fs::read(dir.path().join(format!("blocks/{height:06}.blk"))).unwrap();
    let block = aegis_chain::Block::decode(&bytes).unwrap();
    let senders: Vec<String> = block
        .txs
        .iter()
        .filter_map(|tx| match tx {
            aegis_transactions::Transaction::Transfer(t) => {
                Some(t.sender.as_str().to_string())
            }
            _ => None,
        })
        .collect();
    assert_eq!(senders, vec!["sender_high", "sender_low"]);
}

// ---------------------------------------------------------------------------
// Conservation and crash-safety style checks
// ---------------------------------------------------------------------------

#[test]
fn balances_always_sum_to_the_minted_total() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());

    for _ in 0..5 {
        mine(&node, "alice");
    }
    node.submit_tx(transfer("alice", "bob", 40, 30, 1)).unwrap();
    mine(&node, "carol");

    let total: u64 = ["alice", "bob", "carol", "genesis"]
        .iter()
        .map(|a| node.balance(&Address::new(*a)))
        .sum();
    let minted = node.emission_status(Timestamp::now()).state.minted_total;
    assert_eq!(total, minted);
    assert!(minted <= 100_000_000);
}

#[test]
fn state_json_is_rebuilt_from_block_files() {
    let dir = tempfile::tempdir().unwrap();
    let alice_balance;
    {
        let node = node_with_signals(dir.path(), zero_pressure());
        for _ in 0..3 {
            mine(&node, "alice");
        }
        alice_balance = node.balance(&Address::new("alice"));
    }

    // Simulate losing the mirror between restarts.
    std::fs::remove_file(dir.path().join("state.json")).unwrap();

    let node = node_with_signals(dir.path(), zero_pressure());
    assert_eq!(node.tip().height, 3);
    assert_eq!(node.balance(&Address::new("alice")), alice_balance);
    assert!(node.verify_ledger().unwrap().ok);
    assert!(dir.path().join("state.json").is_file(), "mirror rewritten");
}

#[test]
fn admission_is_idempotent_per_sender_nonce() {
    let dir = tempfile::tempdir().unwrap();
    let node = node_with_signals(dir.path(), zero_pressure());
    for _ in 0..20 {
        mine(&node, "alice");
    }

    node.submit_tx(transfer("alice", "bob", 10, 100, 1)).unwrap();
    let err = node
        .submit_tx(transfer("alice", "bob", 10, 100, 1))
        .unwrap_err();
    let aegis_node::NodeError::Core(core) = err else {
        panic!("expected core error");
    };
    assert_eq!(core.kind(), "conflict");

    // One mempool entry, so the next block carries exactly one transfer.
    let outcome = mine(&node, "carol");
    assert_eq!(outcome.summary.tx_count, 2); // coinbase + one transfer
}
