//! Run configuration

use super::constants::{DEFAULT_SHOTS, DEFAULT_TOLERANCE, MAX_QUBITS, MAX_SNAPSHOT_QUBITS};
use super::error::{QmddError, Result};
use std::time::{SystemTime, UNIX_EPOCH};

/// Configuration consumed by [`Simulator`](crate::Simulator).
///
/// Tolerance and seed are explicit values rather than process-wide state, so
/// independent runs with different settings can coexist in one process.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of qubits the instruction stream is declared over.
    pub num_qubits: usize,

    /// Number of independent shots.
    ///
    /// Default: 1
    pub shots: usize,

    /// Two complex values are treated as equal if both components differ by
    /// less than this value. Fixed for the whole run.
    ///
    /// Default: 1e-13
    pub tolerance: f64,

    /// Seed for the measurement sampler. `None` derives one from the wall clock.
    pub seed: Option<u64>,

    /// Attach the final amplitude vector to every shot.
    pub display_statevector: bool,

    /// Attach the basis-state probabilities to every shot.
    pub display_probabilities: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_qubits: 1,
            shots: DEFAULT_SHOTS,
            tolerance: DEFAULT_TOLERANCE,
            seed: None,
            display_statevector: false,
            display_probabilities: false,
        }
    }
}

impl SimulationConfig {
    /// Creates a configuration for `num_qubits` qubits with default settings.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            ..Default::default()
        }
    }

    /// Set the number of shots
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = shots;
        self
    }

    /// Set the numeric tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set a fixed seed for reproducible sampling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attach amplitude vectors to shot results
    pub fn with_statevector(mut self, enabled: bool) -> Self {
        self.display_statevector = enabled;
        self
    }

    /// Attach probability vectors to shot results
    pub fn with_probabilities(mut self, enabled: bool) -> Self {
        self.display_probabilities = enabled;
        self
    }

    /// Checks that every value is usable before the first diagram is built.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(QmddError::ToleranceConfiguration { tolerance: self.tolerance });
        }
        if self.num_qubits == 0 {
            return Err(QmddError::InvalidConfiguration {
                message: "circuit must declare at least one qubit".to_string(),
            });
        }
        if self.num_qubits > MAX_QUBITS {
            return Err(QmddError::InvalidConfiguration {
                message: format!("at most {} qubits are supported, got {}", MAX_QUBITS, self.num_qubits),
            });
        }
        if self.shots == 0 {
            return Err(QmddError::InvalidConfiguration {
                message: "shot count must be at least 1".to_string(),
            });
        }
        if (self.display_statevector || self.display_probabilities) && self.num_qubits > MAX_SNAPSHOT_QUBITS {
            return Err(QmddError::InvalidConfiguration {
                message: format!(
                    "dense snapshots are limited to {} qubits, circuit has {}",
                    MAX_SNAPSHOT_QUBITS, self.num_qubits
                ),
            });
        }
        Ok(())
    }

    /// The configured seed, or one derived from the wall clock.
    pub fn resolved_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() ^ u64::from(d.subsec_nanos()))
                .unwrap_or(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SimulationConfig::new(3);
        assert_eq!(config.num_qubits, 3);
        assert_eq!(config.shots, 1);
        assert_eq!(config.tolerance, DEFAULT_TOLERANCE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_tolerance() {
        for tolerance in [0.0, -1e-9, f64::NAN, f64::INFINITY] {
            let err = SimulationConfig::new(1).with_tolerance(tolerance).validate().unwrap_err();
            assert!(matches!(err, QmddError::ToleranceConfiguration { .. }));
        }
    }

    #[test]
    fn rejects_zero_qubits_and_shots() {
        assert!(SimulationConfig::new(0).validate().is_err());
        assert!(SimulationConfig::new(2).with_shots(0).validate().is_err());
        assert!(SimulationConfig::new(65).validate().is_err());
        assert!(SimulationConfig::new(64).validate().is_ok());
    }

    #[test]
    fn fixed_seed_is_kept() {
        assert_eq!(SimulationConfig::new(1).with_seed(7).resolved_seed(), 7);
    }
}
