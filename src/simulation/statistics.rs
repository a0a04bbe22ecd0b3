//! Run statistics

use std::fmt;
use std::time::Duration;

/// Statistics accumulated across a whole run.
///
/// Updated incrementally while instructions execute, so the values collected
/// before a failing instruction remain available afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationStatistics {
    /// Unitary gate applications performed, across all shots.
    pub gate_count: usize,

    /// Largest live-node count observed after any gate application.
    pub max_active_nodes: usize,

    /// Distinct complex values in the amplitude store at the end of the run.
    pub complex_count: usize,

    /// Largest `|‖ψ‖² - 1|` seen before renormalizing.
    pub max_norm_drift: f64,

    /// Shots that ran to completion.
    pub shots_completed: usize,

    /// Wall time of the run.
    pub elapsed: Duration,
}

impl SimulationStatistics {
    /// Create an empty statistics record
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one gate application and samples the live-node count.
    pub(crate) fn record_gate(&mut self, active_nodes: usize) {
        self.gate_count += 1;
        self.max_active_nodes = self.max_active_nodes.max(active_nodes);
    }

    pub(crate) fn record_drift(&mut self, drift: f64) {
        if drift > self.max_norm_drift {
            self.max_norm_drift = drift;
        }
    }

    /// Gate applications per second of wall time.
    pub fn gates_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 { 0.0 } else { self.gate_count as f64 / secs }
    }
}

impl fmt::Display for SimulationStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Simulation Statistics:")?;
        writeln!(f, "  Elapsed: {:?}", self.elapsed)?;
        writeln!(f, "  Shots completed: {}", self.shots_completed)?;
        writeln!(f, "  Gates applied: {} ({:.0} gates/sec)", self.gate_count, self.gates_per_second())?;
        writeln!(f, "  Peak active nodes: {}", self.max_active_nodes)?;
        writeln!(f, "  Complex table entries: {}", self.complex_count)?;
        writeln!(f, "  Max norm drift: {:.3e}", self.max_norm_drift)?;
        Ok(())
    }
}
