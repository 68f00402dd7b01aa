//! Model of netem's packet-loss decision.
//!
//! netem decides each packet independently unless a correlation is given, in
//! which case the random value is blended with the previous one:
//!
//! ```text
//! v = (1 - ρ)·U + ρ·v_prev      lost if v < p
//! ```
//!
//! The model lets scenarios check what correlated loss should look like (longer
//! loss runs, positive lag-1 autocorrelation) without a kernel, and gives
//! container probes a reference to compare against.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tc_types::Impairment;

/// Per-packet loss decisions for one netem loss configuration.
#[derive(Debug, Clone)]
pub struct LossModel {
    probability: f64,
    correlation: f64,
    last: f64,
    rng: StdRng,
}

impl LossModel {
    /// Model `percent` loss with `correlation_percent` correlation (0 = independent).
    pub fn new(percent: f64, correlation_percent: f64, seed: u64) -> Self {
        Self {
            probability: (percent / 100.0).clamp(0.0, 1.0),
            correlation: (correlation_percent / 100.0).clamp(0.0, 1.0),
            last: 0.0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Model the loss impairment in `impairment`, or no loss for anything else.
    pub fn for_impairment(impairment: &Impairment, seed: u64) -> Self {
        match impairment {
            Impairment::PacketLoss { percent } => Self::new(*percent, 0.0, seed),
            Impairment::CorrelatedPacketLoss {
                percent,
                correlation_percent,
            } => Self::new(*percent, *correlation_percent, seed),
            _ => Self::new(0.0, 0.0, seed),
        }
    }

    /// Decide whether the next packet is dropped.
    pub fn next_lost(&mut self) -> bool {
        let uniform: f64 = self.rng.gen();
        let value = if self.correlation > 0.0 {
            let blended = (1.0 - self.correlation) * uniform + self.correlation * self.last;
            self.last = blended;
            blended
        } else {
            uniform
        };
        value < self.probability
    }

    /// Decide `packets` packets; `true` marks a drop.
    pub fn simulate(&mut self, packets: usize) -> Vec<bool> {
        (0..packets).map(|_| self.next_lost()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn independent_loss_rate_matches() {
        let lost = LossModel::new(40.0, 0.0, 7).simulate(20_000);
        let rate = lost.iter().filter(|l| **l).count() as f64 / lost.len() as f64;
        assert!((rate - 0.40).abs() < 0.02, "rate {rate}");
    }

    #[test]
    fn extremes() {
        assert!(LossModel::new(0.0, 0.0, 1).simulate(1_000).iter().all(|l| !l));
        assert!(LossModel::new(100.0, 0.0, 1).simulate(1_000).iter().all(|l| *l));
    }

    #[test]
    fn same_seed_same_sequence() {
        let a = LossModel::new(40.0, 75.0, 42).simulate(500);
        let b = LossModel::new(40.0, 75.0, 42).simulate(500);
        assert_eq!(a, b);
    }

    #[test]
    fn non_loss_impairments_drop_nothing() {
        let mut model = LossModel::for_impairment(&Impairment::latency(500, None), 3);
        assert!(model.simulate(100).iter().all(|l| !l));
    }
}
