//! Policy decisions and their wire envelope.

use aegis_types::{Digest, TxHash};
use serde::Serialize;
use sha2::{Digest as _, Sha256};

/// What the guardian decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Warn,
    Deny,
}

/// A scored transaction. Multipliers are integer hundredths (100 = x1.0)
/// and suspicion is basis points (10_000 = 1.0), so consensus-adjacent
/// arithmetic stays in integers end to end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyDecision {
    pub verdict: Verdict,
    pub suspicion_bps: u32,
    pub fee_multiplier_hundredths: u32,
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

impl PolicyDecision {
    pub fn allows(&self) -> bool {
        self.verdict != Verdict::Deny
    }

    /// Declared fee scaled by the multiplier, floored. The increment over
    /// the declared fee is burned from the sender's perspective.
    pub fn effective_fee(&self, declared_fee: u64) -> u64 {
        ((declared_fee as u128 * self.fee_multiplier_hundredths as u128) / 100) as u64
    }

    pub fn suspicion(&self) -> f64 {
        self.suspicion_bps as f64 / 10_000.0
    }

    pub fn fee_multiplier(&self) -> f64 {
        self.fee_multiplier_hundredths as f64 / 100.0
    }

    /// The caller-facing JSON envelope. Floats carry at most four decimals
    /// so the serialization is deterministic.
    pub fn envelope(&self) -> serde_json::Value {
        serde_json::json!({
            "ok": self.allows(),
            "suspicion": round4(self.suspicion()),
            "fee_multiplier": round4(self.fee_multiplier()),
            "reasons": self.reasons,
            "suggestions": self.suggestions,
        })
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Canonical digest of the admission decisions bound to one block: for each
/// included transaction, its txid, the verdict class, multiplier, and
/// suspicion. Written into the rewards ledger.
pub fn decisions_digest(decisions: &[(TxHash, &PolicyDecision)]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update((decisions.len() as u64).to_be_bytes());
    for (txid, decision) in decisions {
        hasher.update(txid.as_bytes());
        hasher.update([match decision.verdict {
            Verdict::Allow => 0u8,
            Verdict::Warn => 1,
            Verdict::Deny => 2,
        }]);
        hasher.update(decision.suspicion_bps.to_be_bytes());
        hasher.update(decision.fee_multiplier_hundredths.to_be_bytes());
    }
    Digest::new(hasher.finalize().into())
}

/// Serializable mirror used when a front-end wants the full decision.
#[derive(Clone, Debug, Serialize)]
pub struct DecisionReport {
    pub ok: bool,
    pub suspicion: f64,
    pub fee_multiplier: f64,
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

impl From<&PolicyDecision> for DecisionReport {
    fn from(d: &PolicyDecision) -> Self {
        Self {
            ok: d.allows(),
            suspicion: round4(d.suspicion()),
            fee_multiplier: round4(d.fee_multiplier()),
            reasons: d.reasons.clone(),
            suggestions: d.suggestions.clone(),
        }
    }
}
