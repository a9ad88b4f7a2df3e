//! The guardian — deterministic transaction risk scoring.
//!
//! Not a magical ML oracle: a fixed feature set summed into a suspicion
//! score in basis points, a fixed decision table mapping score to
//! allow/warn/deny plus a fee multiplier, and reason/suggestion strings a
//! human can act on. The same transaction with the same burst context
//! always yields the same decision; no clock is ever read here.

pub mod burst;
pub mod decision;
pub mod forecast;
pub mod guardian;

pub use burst::BurstWindow;
pub use decision::{decisions_digest, PolicyDecision, Verdict};
pub use forecast::{ForecastInputs, RewardForecaster};
pub use guardian::score_tx;
