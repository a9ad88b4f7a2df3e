//! Non-consensus reward forecasting.
//!
//! Operator-facing estimate of upcoming block rewards: an activity-driven
//! multiplier in [0.5, 1.5] with EWMA smoothing across calls. This variant
//! deliberately floats and smooths. It MUST stay out of the consensus
//! subsidy path, which is integer-only and memoryless.

use serde::Serialize;

const SMOOTHING_ALPHA: f64 = 0.15;
const MULT_MIN: f64 = 0.5;
const MULT_MAX: f64 = 1.5;

/// Activity metrics driving the forecast multiplier.
#[derive(Clone, Copy, Debug)]
pub struct ForecastInputs {
    /// Pending transactions in the local mempool.
    pub mempool_txs: u64,
    /// Risk score of the marginal traffic, 0..1.
    pub avg_suspicion: f64,
}

/// One forecast with its factor breakdown, for dashboards.
#[derive(Clone, Debug, Serialize)]
pub struct Forecast {
    pub reward: u64,
    pub multiplier: f64,
    pub activity: f64,
    pub demand: f64,
    pub risk_penalty: f64,
    pub smoothed: f64,
}

/// Stateful EWMA forecaster. One per node front-end; never consulted by
/// the chain engine.
#[derive(Clone, Debug, Default)]
pub struct RewardForecaster {
    prev: Option<f64>,
}

impl RewardForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forecast the next reward from the consensus baseline.
    pub fn forecast(&mut self, baseline: u64, inputs: &ForecastInputs) -> Forecast {
        let activity = (0.5 + inputs.mempool_txs as f64 / 20.0).min(2.0);
        let demand = (0.5 + inputs.mempool_txs as f64 / 40.0).min(2.0);

        let raw = 0.55 + 0.25 * activity + 0.10 * 1.0 + 0.10 * demand;
        let multiplier = raw.clamp(MULT_MIN, MULT_MAX);

        let risk = inputs.avg_suspicion.clamp(0.0, 1.0);
        let risk_penalty = (1.0 - risk * 0.5).max(0.0);

        let target = baseline as f64 * multiplier * risk_penalty;
        let prev = self.prev.unwrap_or(target);
        let smoothed = (1.0 - SMOOTHING_ALPHA) * prev + SMOOTHING_ALPHA * target;
        self.prev = Some(smoothed);

        Forecast {
            reward: smoothed.round().max(0.0) as u64,
            multiplier,
            activity,
            demand,
            risk_penalty,
            smoothed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> ForecastInputs {
        ForecastInputs {
            mempool_txs: 0,
            avg_suspicion: 0.0,
        }
    }

    #[test]
    fn multiplier_stays_in_band() {
        let mut f = RewardForecaster::new();
        let quiet = f.forecast(100, &calm());
        assert!(quiet.multiplier >= MULT_MIN && quiet.multiplier <= MULT_MAX);

        let mut f = RewardForecaster::new();
        let busy = f.forecast(
            100,
            &ForecastInputs {
                mempool_txs: 1_000_000,
                avg_suspicion: 0.0,
            },
        );
        assert_eq!(busy.multiplier, MULT_MAX);
    }

    #[test]
    fn risk_halves_at_full_suspicion() {
        let mut f = RewardForecaster::new();
        let fc = f.forecast(
            100,
            &ForecastInputs {
                mempool_txs: 0,
                avg_suspicion: 1.0,
            },
        );
        assert!((fc.risk_penalty - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn smoothing_damps_jumps() {
        let mut f = RewardForecaster::new();
        let first = f.forecast(100, &calm());

        // A sudden activity spike moves the forecast only partway.
        let spiked = f.forecast(
            100,
            &ForecastInputs {
                mempool_txs: 10_000,
                avg_suspicion: 0.0,
            },
        );
        let unsmoothed_target = 100.0 * MULT_MAX;
        assert!(spiked.smoothed < unsmoothed_target);
        assert!(spiked.smoothed > first.smoothed);
    }

    #[test]
    fn first_call_has_no_history_bias() {
        let mut a = RewardForecaster::new();
        let mut b = RewardForecaster::new();
        assert_eq!(
            a.forecast(100, &calm()).reward,
            b.forecast(100, &calm()).reward
        );
    }
}
