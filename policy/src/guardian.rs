//! Feature extraction and the decision table.

use crate::decision::{PolicyDecision, Verdict};
use aegis_transactions::TransferTx;

/// Memo fragments that mark promotional / phishing spam. Matched against
/// the lowercased memo; the first hit contributes once.
const SPAM_PATTERNS: [&str; 10] = [
    "http://",
    "https://",
    "free money",
    "airdrop",
    "claim",
    "giveaway",
    "bonus",
    "promo",
    "wallet connect",
    "seed phrase",
];

/// Memos beyond this length are penalized (the hard 256-byte limit is a
/// validation concern, not a policy one).
const LONG_MEMO_BYTES: usize = 140;

/// Output counts at or above this look like spray spam.
const MANY_OUTPUTS: usize = 6;

/// Fees below this are cheap enough to spam with.
const LOW_FEE_THRESHOLD: u64 = 100;

// Feature weights in basis points.
const W_SPAM_MEMO: u32 = 3_500;
const W_LONG_MEMO: u32 = 1_500;
const W_MANY_OUTPUTS: u32 = 2_500;
const W_ZERO_FEE: u32 = 3_500;
const W_LOW_FEE: u32 = 1_500;
const W_DUST_FEE_RATIO: u32 = 1_000;
const W_BURST_PER_TX: u32 = 500;
const W_BURST_CAP: u32 = 2_500;

/// Burst counts above this free allowance start contributing.
const BURST_FREE_ALLOWANCE: u32 = 3;

const MAX_SUSPICION_BPS: u32 = 10_000;

/// Score a transfer. `recent_count` is the sender's accepted-transaction
/// count in the trailing 60-second window (see [`crate::BurstWindow`]).
///
/// Pure: identical `(tx, recent_count)` inputs always produce the
/// identical decision.
pub fn score_tx(tx: &TransferTx, recent_count: u32) -> PolicyDecision {
    let mut suspicion: u32 = 0;
    let mut reasons: Vec<String> = Vec::new();
    let mut suggestions: Vec<String> = Vec::new();

    if let Some(memo) = &tx.memo {
        let low = memo.to_lowercase();
        if let Some(pattern) = SPAM_PATTERNS.iter().find(|p| low.contains(*p)) {
            suspicion += W_SPAM_MEMO;
            reasons.push(format!("memo_matches:{pattern}"));
            suggestions.push("Remove links and promotional wording from the memo.".to_string());
        }
        if memo.len() > LONG_MEMO_BYTES {
            suspicion += W_LONG_MEMO;
            reasons.push("memo_too_long".to_string());
            suggestions.push(format!("Shorten the memo to {LONG_MEMO_BYTES} bytes or less."));
        }
    }

    let n_outputs = tx.outputs.len();
    if n_outputs >= MANY_OUTPUTS {
        suspicion += W_MANY_OUTPUTS;
        reasons.push(format!("many_outputs:{n_outputs}"));
        suggestions.push("Reduce the output count to avoid spray patterns.".to_string());
    }

    if tx.fee == 0 {
        suspicion += W_ZERO_FEE;
        reasons.push("zero_fee".to_string());
        suggestions.push("Attach a fee to pass the anti-spam policy.".to_string());
    } else if tx.fee < LOW_FEE_THRESHOLD {
        suspicion += W_LOW_FEE;
        reasons.push("low_fee".to_string());
        suggestions.push(format!(
            "Increase the fee (>= {LOW_FEE_THRESHOLD}) to avoid the spam penalty."
        ));
    }

    // fee / amount < 1e-5, in integers: fee * 100_000 < amount.
    let amount = tx.amount();
    if amount > 0 && (tx.fee as u128) * 100_000 < amount as u128 {
        suspicion += W_DUST_FEE_RATIO;
        reasons.push("dust_fee_ratio".to_string());
        suggestions.push("Raise the fee relative to the transferred amount.".to_string());
    }

    let excess = recent_count.saturating_sub(BURST_FREE_ALLOWANCE);
    if excess > 0 {
        suspicion += (excess * W_BURST_PER_TX).min(W_BURST_CAP);
        reasons.push(format!("sender_burst:{recent_count}"));
        suggestions.push("Space out submissions from this sender.".to_string());
    }

    let suspicion_bps = suspicion.min(MAX_SUSPICION_BPS);

    let (verdict, fee_multiplier_hundredths, mandatory) = match suspicion_bps {
        0..=3_999 => (Verdict::Allow, 100, None),
        4_000..=6_999 => (Verdict::Warn, 200, Some("suspicious_tx_warning")),
        7_000..=8_999 => (Verdict::Warn, 500, Some("high_risk_tx_warning")),
        _ => (Verdict::Deny, 500, Some("tx_denied_extreme_spam")),
    };
    if let Some(code) = mandatory {
        reasons.insert(0, code.to_string());
    }
    if verdict == Verdict::Deny {
        suggestions
            .push("Rewrite the transaction to avoid every spam indicator above.".to_string());
    }

    PolicyDecision {
        verdict,
        suspicion_bps,
        fee_multiplier_hundredths,
        reasons,
        suggestions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_transactions::{TransferTx, TxOut};
    use aegis_types::{Address, Timestamp};

    fn tx(fee: u64, memo: Option<&str>, n_outputs: usize) -> TransferTx {
        TransferTx {
            sender: Address::new("alice"),
            outputs: (0..n_outputs)
                .map(|i| TxOut {
                    recipient: Address::new(format!("out_{i}")),
                    amount: 100,
                })
                .collect(),
            fee,
            memo: memo.map(str::to_string),
            timestamp: Timestamp::new(1_000),
            nonce: 1,
            signature: vec![1; 64],
        }
    }

    #[test]
    fn clean_tx_is_allowed_at_full_fee() {
        let d = score_tx(&tx(100, Some("thanks for lunch"), 1), 0);
        assert_eq!(d.verdict, Verdict::Allow);
        assert_eq!(d.fee_multiplier_hundredths, 100);
        assert!(d.reasons.is_empty());
        assert_eq!(d.suspicion_bps, 0);
    }

    #[test]
    fn extreme_spam_is_denied() {
        // Pattern memo + 10 outputs + zero fee (+ dust ratio) >= 0.90.
        let d = score_tx(&tx(0, Some("FREE MONEY airdrop claim http://x"), 10), 0);
        assert_eq!(d.verdict, Verdict::Deny);
        assert!(d.suspicion_bps >= 9_000);
        assert_eq!(d.reasons[0], "tx_denied_extreme_spam");
        assert!(d.reasons.iter().any(|r| r.starts_with("memo_matches:")));
        assert!(d.reasons.iter().any(|r| r == "zero_fee"));
    }

    #[test]
    fn zero_fee_alone_warns_at_double_fee() {
        // zero_fee (3500) + dust ratio (1000) = 0.45 -> warn, x2.
        let d = score_tx(&tx(0, None, 1), 0);
        assert_eq!(d.verdict, Verdict::Warn);
        assert_eq!(d.fee_multiplier_hundredths, 200);
        assert_eq!(d.reasons[0], "suspicious_tx_warning");
    }

    #[test]
    fn high_risk_band_quintuples_the_fee() {
        // Pattern memo (3500) + many outputs (2500) + low fee (1500) = 0.75.
        let d = score_tx(&tx(50, Some("claim your bonus"), 6), 0);
        assert_eq!(d.verdict, Verdict::Warn);
        assert_eq!(d.fee_multiplier_hundredths, 500);
        assert_eq!(d.reasons[0], "high_risk_tx_warning");
    }

    #[test]
    fn pattern_list_matches_case_insensitively_once() {
        let d = score_tx(&tx(1_000, Some("AIRDROP giveaway PROMO"), 1), 0);
        let matches: Vec<_> = d
            .reasons
            .iter()
            .filter(|r| r.starts_with("memo_matches:"))
            .collect();
        assert_eq!(matches.len(), 1, "first pattern only");
    }

    #[test]
    fn dust_fee_ratio_triggers_on_big_amounts() {
        let mut t = tx(1, None, 1);
        t.outputs[0].amount = 10_000_000;
        let d = score_tx(&t, 0);
        assert!(d.reasons.iter().any(|r| r == "dust_fee_ratio"));

        // fee exactly at the 1e-5 boundary does not trigger.
        let mut t = tx(100, None, 1);
        t.outputs[0].amount = 10_000_000;
        let d = score_tx(&t, 0);
        assert!(!d.reasons.iter().any(|r| r == "dust_fee_ratio"));
    }

    #[test]
    fn burst_contribution_kicks_in_past_the_allowance() {
        let clean = tx(1_000, None, 1);
        assert_eq!(score_tx(&clean, 3).suspicion_bps, 0);

        let d = score_tx(&clean, 5);
        assert_eq!(d.suspicion_bps, 1_000);
        assert!(d.reasons.iter().any(|r| r == "sender_burst:5"));

        // Capped at 0.25 no matter how hot the sender runs.
        assert_eq!(score_tx(&clean, 100).suspicion_bps, 2_500);
    }

    #[test]
    fn decision_is_deterministic() {
        let t = tx(0, Some("claim http://x"), 7);
        assert_eq!(score_tx(&t, 2), score_tx(&t, 2));
    }
}
