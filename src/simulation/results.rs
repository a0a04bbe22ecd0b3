// src/simulation/results.rs
use super::statistics::SimulationStatistics;
use num_complex::Complex;
use std::collections::BTreeMap;
use std::fmt;

/// Outcome of one shot.
#[derive(Debug, Clone, PartialEq)]
pub struct ShotResult {
    /// Outcome bits, qubit `n-1` leftmost.
    pub bits: String,
    /// The same outcome as a basis index: bit `q` is qubit `q`.
    pub outcome: u64,
    /// Amplitudes of the final pre-measurement state, if requested.
    pub amplitudes: Option<Vec<Complex<f64>>>,
    /// Basis-state probabilities of the final pre-measurement state, if requested.
    pub probabilities: Option<Vec<f64>>,
}

impl ShotResult {
    pub(crate) fn new(outcome: u64, num_qubits: usize) -> Self {
        Self {
            bits: format_bits(outcome, num_qubits),
            outcome,
            amplitudes: None,
            probabilities: None,
        }
    }
}

/// Renders a basis index as an `num_qubits`-character bit string, qubit
/// `num_qubits - 1` first.
pub fn format_bits(outcome: u64, num_qubits: usize) -> String {
    (0..num_qubits)
        .rev()
        .map(|q| if q < 64 && (outcome >> q) & 1 == 1 { '1' } else { '0' })
        .collect()
}

/// Holds the per-shot outcomes and the run statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    num_qubits: usize,
    shots: Vec<ShotResult>,
    statistics: SimulationStatistics,
}

impl SimulationResult {
    /// Creates an empty result set. (Internal visibility)
    pub(crate) fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            shots: Vec::new(),
            statistics: SimulationStatistics::default(),
        }
    }

    pub(crate) fn record_shot(&mut self, shot: ShotResult) {
        self.shots.push(shot);
    }

    pub(crate) fn set_statistics(&mut self, statistics: SimulationStatistics) {
        self.statistics = statistics;
    }

    /// Qubit count of the simulated register.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Every shot in execution order.
    pub fn shots(&self) -> &[ShotResult] {
        &self.shots
    }

    /// Statistics of the run that produced these shots.
    pub fn statistics(&self) -> &SimulationStatistics {
        &self.statistics
    }

    /// Histogram of outcome bit strings.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for shot in &self.shots {
            *counts.entry(shot.bits.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Fraction of shots that produced `bits`.
    pub fn frequency(&self, bits: &str) -> f64 {
        if self.shots.is_empty() {
            return 0.0;
        }
        let hits = self.shots.iter().filter(|s| s.bits == bits).count();
        hits as f64 / self.shots.len() as f64
    }
}

impl fmt::Display for SimulationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Results ({} qubits, {} shots):", self.num_qubits, self.shots.len())?;
        if self.shots.is_empty() {
            writeln!(f, "  No shots were recorded.")?;
        } else {
            writeln!(f, "  Counts:")?;
            for (bits, count) in self.counts() {
                writeln!(f, "    {}: {}", bits, count)?;
            }
        }
        if let Some(amplitudes) = self.shots.last().and_then(|s| s.amplitudes.as_ref()) {
            writeln!(f, "  Final amplitudes:")?;
            for (index, amplitude) in amplitudes.iter().enumerate() {
                writeln!(f, "    |{}>: {:.6}", format_bits(index as u64, self.num_qubits), amplitude)?;
            }
        }
        if let Some(probabilities) = self.shots.last().and_then(|s| s.probabilities.as_ref()) {
            writeln!(f, "  Final probabilities:")?;
            for (index, p) in probabilities.iter().enumerate() {
                writeln!(f, "    |{}>: {:.6}", format_bits(index as u64, self.num_qubits), p)?;
            }
        }
        write!(f, "{}", self.statistics)
    }
}
