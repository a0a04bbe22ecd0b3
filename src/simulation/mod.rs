// src/simulation/mod.rs

//! Replays instruction streams on a decision-diagram state.
//!
//! [`Simulator`] is the entry point. Each run owns a fresh
//! [`Package`](crate::dd::Package) and one seeded sampler, so equal seeds and
//! tolerances reproduce equal outcomes.

mod results;
mod statistics;
pub(crate) mod engine;

pub use results::{ShotResult, SimulationResult, format_bits};
pub use statistics::SimulationStatistics;

use crate::circuits::{Circuit, Instruction};
use crate::core::{QmddError, Result, SimulationConfig};
use engine::SimulationEngine;
use num_complex::Complex;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where a [`Simulator`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationPhase {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// Replaying instructions.
    Running,
    /// Sampling the outcome of a shot.
    Measuring,
    /// The last run completed.
    Done,
    /// The last run aborted on an invalid instruction.
    Failed,
}

impl fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimulationPhase::Idle => "idle",
            SimulationPhase::Running => "running",
            SimulationPhase::Measuring => "measuring",
            SimulationPhase::Done => "done",
            SimulationPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Runs circuits according to a [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulationConfig,
    statistics: SimulationStatistics,
    phase: SimulationPhase,
}

impl Simulator {
    /// Creates a simulator after validating `config`.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            statistics: SimulationStatistics::default(),
            phase: SimulationPhase::Idle,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// Statistics of the most recent run, including one that failed part way.
    pub fn statistics(&self) -> &SimulationStatistics {
        &self.statistics
    }

    /// Runs `circuit`, whose declared qubit count must match the configuration.
    pub fn run(&mut self, circuit: &Circuit) -> Result<SimulationResult> {
        if circuit.num_qubits() != self.config.num_qubits {
            return Err(QmddError::InvalidConfiguration {
                message: format!(
                    "circuit declares {} qubits but the simulator is configured for {}",
                    circuit.num_qubits(),
                    self.config.num_qubits
                ),
            });
        }
        self.run_instructions(circuit.instructions())
    }

    /// Runs an already-parsed instruction stream for the configured number
    /// of shots.
    ///
    /// # Returns
    /// * `Ok(SimulationResult)` with one [`ShotResult`] per shot.
    /// * `Err(QmddError)` naming the first invalid instruction. The run
    ///   aborts there; [`Simulator::statistics`] keeps what was gathered.
    pub fn run_instructions(&mut self, instructions: &[Instruction]) -> Result<SimulationResult> {
        self.statistics = SimulationStatistics::default();
        self.phase = SimulationPhase::Running;
        let started = Instant::now();
        info!(
            qubits = self.config.num_qubits,
            shots = self.config.shots,
            instructions = instructions.len(),
            "starting run"
        );

        let mut engine = SimulationEngine::init(&self.config)?;
        let outcome = self.run_shots(&mut engine, instructions);

        self.statistics.elapsed = started.elapsed();
        self.statistics.complex_count = engine.complex_count();
        match outcome {
            Ok(mut result) => {
                self.phase = SimulationPhase::Done;
                result.set_statistics(self.statistics.clone());
                info!(
                    gates = self.statistics.gate_count,
                    peak_nodes = self.statistics.max_active_nodes,
                    elapsed = ?self.statistics.elapsed,
                    "run finished"
                );
                Ok(result)
            }
            Err(err) => {
                self.phase = SimulationPhase::Failed;
                warn!(error = %err, gates = self.statistics.gate_count, "run aborted");
                Err(err)
            }
        }
    }

    fn run_shots(&mut self, engine: &mut SimulationEngine, instructions: &[Instruction]) -> Result<SimulationResult> {
        let num_qubits = self.config.num_qubits;
        let mut result = SimulationResult::new(num_qubits);

        // Without measurements, resets or classical conditions every shot
        // ends in the same state: evolve once and sample it repeatedly.
        let deterministic = instructions.iter().all(|i| {
            i.condition.is_none() && !i.is_measurement() && !i.gate_id.eq_ignore_ascii_case("reset")
        });
        if deterministic {
            self.replay(engine, instructions)?;
            self.phase = SimulationPhase::Measuring;
            let snapshot = self.snapshot(engine)?;
            for shot in 0..self.config.shots {
                let outcome = engine.sample_all();
                debug!(shot, outcome, "sampled");
                result.record_shot(snapshot.attach(ShotResult::new(outcome, num_qubits)));
                self.statistics.shots_completed += 1;
            }
            return Ok(result);
        }

        let explicit = instructions.iter().any(Instruction::is_measurement);
        for shot in 0..self.config.shots {
            self.phase = SimulationPhase::Running;
            if shot > 0 {
                engine.reset_state();
            }
            self.replay(engine, instructions)?;

            self.phase = SimulationPhase::Measuring;
            let snapshot = self.snapshot(engine)?;
            let outcome = if explicit { engine.register_value() } else { engine.measure_all()? };
            debug!(shot, outcome, "shot complete");
            result.record_shot(snapshot.attach(ShotResult::new(outcome, num_qubits)));
            self.statistics.shots_completed += 1;
        }
        Ok(result)
    }

    fn replay(&mut self, engine: &mut SimulationEngine, instructions: &[Instruction]) -> Result<()> {
        for (position, instruction) in instructions.iter().enumerate() {
            engine.execute(instruction, position, &mut self.statistics)?;
        }
        Ok(())
    }

    fn snapshot(&self, engine: &SimulationEngine) -> Result<Snapshot> {
        Ok(Snapshot {
            amplitudes: self.config.display_statevector.then(|| engine.amplitudes()).transpose()?,
            probabilities: self.config.display_probabilities.then(|| engine.probabilities()).transpose()?,
        })
    }
}

/// Dense views of the final pre-measurement state.
struct Snapshot {
    amplitudes: Option<Vec<Complex<f64>>>,
    probabilities: Option<Vec<f64>>,
}

impl Snapshot {
    fn attach(&self, mut shot: ShotResult) -> ShotResult {
        shot.amplitudes = self.amplitudes.clone();
        shot.probabilities = self.probabilities.clone();
        shot
    }
}
