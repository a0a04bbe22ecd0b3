// src/simulation/engine.rs
use crate::circuits::Instruction;
use crate::core::{QmddError, Result, SimulationConfig};
use crate::dd::{Edge, Matrix2, Package};
use crate::operations::Gate;
use crate::simulation::SimulationStatistics;
use crate::validation::validate_instruction;
use num_complex::Complex;
use rand::{RngExt, SeedableRng};
use rand::rngs::StdRng;
use tracing::trace;

/// Owns one decision-diagram package and the current state root, and
/// replays instructions against it.
/// (Internal visibility)
pub(crate) struct SimulationEngine {
    package: Package,
    /// Current state. Always registered with the package via `inc_ref`.
    state: Edge,
    num_qubits: usize,
    /// Classical bit `q` holds the last measured value of qubit `q`.
    register: Vec<bool>,
    rng: StdRng,
}

impl SimulationEngine {
    /// Builds a package with the configured tolerance, prepares |0…0⟩ and
    /// seeds the sampler once.
    pub(crate) fn init(config: &SimulationConfig) -> Result<Self> {
        let mut package = Package::new(config.tolerance)?;
        let state = package.basis_state(config.num_qubits);
        package.inc_ref(state);
        Ok(Self {
            package,
            state,
            num_qubits: config.num_qubits,
            register: vec![false; config.num_qubits],
            rng: StdRng::seed_from_u64(config.resolved_seed()),
        })
    }

    /// Returns to |0…0⟩ with a cleared classical register.
    pub(crate) fn reset_state(&mut self) {
        let initial = self.package.basis_state(self.num_qubits);
        self.replace_state(initial);
        self.package.collect_unreferenced();
        self.register.iter_mut().for_each(|bit| *bit = false);
    }

    /// Validates and executes one instruction.
    pub(crate) fn execute(
        &mut self,
        instruction: &Instruction,
        position: usize,
        stats: &mut SimulationStatistics,
    ) -> Result<()> {
        let parsed = validate_instruction(instruction, self.num_qubits, position)?;
        if let Some(condition) = &instruction.condition {
            if !condition.is_satisfied(&self.register) {
                trace!(position, %condition, "condition not met, skipping");
                return Ok(());
            }
        }

        match parsed.gate {
            Gate::Barrier => {}
            Gate::Measure => {
                for &qubit in &instruction.targets {
                    self.measure(qubit);
                }
            }
            Gate::Reset => {
                let flip = Gate::X.matrix().ok_or_else(|| missing_matrix(position, Gate::X))?;
                for &qubit in &instruction.targets {
                    if self.measure(qubit) {
                        self.apply_matrix(&flip, qubit, &[], stats);
                    }
                }
            }
            Gate::Swap => {
                // Three CNOTs; extra controls turn it into a Fredkin gate.
                let flip = Gate::X.matrix().ok_or_else(|| missing_matrix(position, Gate::X))?;
                let (a, b) = (instruction.targets[0], instruction.targets[1]);
                for (target, control) in [(b, a), (a, b), (b, a)] {
                    let mut controls = instruction.controls.clone();
                    controls.push(control);
                    self.apply_matrix(&flip, target, &controls, stats);
                }
            }
            gate => {
                let matrix = gate.matrix().ok_or_else(|| missing_matrix(position, gate))?;
                for &target in &instruction.targets {
                    self.apply_matrix(&matrix, target, &instruction.controls, stats);
                }
            }
        }
        Ok(())
    }

    /// Builds the gate diagram, applies it, swaps roots, frees intermediates
    /// and renormalizes.
    fn apply_matrix(&mut self, matrix: &Matrix2, target: usize, controls: &[usize], stats: &mut SimulationStatistics) {
        let gate = self.package.gate_diagram(matrix, target, controls, self.num_qubits);
        let next = self.package.apply(gate, self.state);
        self.replace_state(next);
        self.package.collect_unreferenced();
        self.renormalize(stats);
        stats.record_gate(self.package.active_nodes());
        trace!(
            target,
            ?controls,
            active_nodes = self.package.active_nodes(),
            "gate applied"
        );
    }

    fn renormalize(&mut self, stats: &mut SimulationStatistics) {
        let drift = (self.package.norm_sqr(self.state) - 1.0).abs();
        stats.record_drift(drift);
        if drift > 0.0 {
            // Only the root weight changes, so node references stay as they are.
            self.state = self.package.normalize(self.state);
        }
    }

    /// Samples `qubit`, collapses the state and records the bit.
    fn measure(&mut self, qubit: usize) -> bool {
        let rng = &mut self.rng;
        let mut draw = || -> f64 { rng.random::<f64>() };
        let (outcome, next) = self.package.measure_qubit(self.state, qubit, self.num_qubits, &mut draw);
        self.replace_state(next);
        self.package.collect_unreferenced();
        self.register[qubit] = outcome;
        trace!(qubit, outcome, "measured");
        outcome
    }

    /// Samples all qubits at once and collapses onto the sampled basis state.
    pub(crate) fn measure_all(&mut self) -> Result<u64> {
        let outcome = self.sample_all();
        let collapsed = self.package.computational_basis_state(self.num_qubits, outcome)?;
        self.replace_state(collapsed);
        self.package.collect_unreferenced();
        for (qubit, bit) in self.register.iter_mut().enumerate() {
            *bit = (outcome >> qubit) & 1 == 1;
        }
        Ok(outcome)
    }

    /// Samples all qubits without disturbing the state.
    pub(crate) fn sample_all(&mut self) -> u64 {
        let rng = &mut self.rng;
        let mut draw = || -> f64 { rng.random::<f64>() };
        self.package.sample_all(self.state, &mut draw)
    }

    /// Classical register packed into a basis index.
    pub(crate) fn register_value(&self) -> u64 {
        self.register
            .iter()
            .enumerate()
            .filter(|(_, bit)| **bit)
            .fold(0u64, |acc, (qubit, _)| acc | (1 << qubit))
    }

    pub(crate) fn amplitudes(&self) -> Result<Vec<Complex<f64>>> {
        self.package.state_vector(self.state, self.num_qubits)
    }

    pub(crate) fn probabilities(&self) -> Result<Vec<f64>> {
        self.package.probabilities(self.state, self.num_qubits)
    }

    pub(crate) fn complex_count(&self) -> usize {
        self.package.complex_count()
    }

    #[cfg(test)]
    pub(crate) fn active_nodes(&self) -> usize {
        self.package.active_nodes()
    }

    /// Registers `next` before releasing the old root so shared nodes survive.
    fn replace_state(&mut self, next: Edge) {
        self.package.inc_ref(next);
        self.package.dec_ref(self.state);
        self.state = next;
    }
}

fn missing_matrix(position: usize, gate: Gate) -> QmddError {
    QmddError::MalformedInstruction {
        position,
        message: format!("gate '{}' has no single-qubit matrix", gate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuits::Condition;

    const TEST_TOLERANCE: f64 = 1e-9;

    fn engine(num_qubits: usize) -> Result<SimulationEngine> {
        SimulationEngine::init(&SimulationConfig::new(num_qubits).with_seed(42))
    }

    #[test]
    fn swap_exchanges_qubits() -> Result<()> {
        let mut engine = engine(3)?;
        let mut stats = SimulationStatistics::new();
        engine.execute(&Instruction::single("x", 0), 0, &mut stats)?;
        engine.execute(&Instruction::new("swap", vec![0, 2]), 1, &mut stats)?;
        let probabilities = engine.probabilities()?;
        assert!((probabilities[0b100] - 1.0).abs() < TEST_TOLERANCE);
        assert_eq!(stats.gate_count, 4);
        Ok(())
    }

    #[test]
    fn controlled_swap_needs_its_control() -> Result<()> {
        let mut engine = engine(3)?;
        let mut stats = SimulationStatistics::new();
        engine.execute(&Instruction::single("x", 1), 0, &mut stats)?;
        let fredkin = Instruction::new("cswap", vec![1, 2]).with_controls(vec![0]);
        engine.execute(&fredkin, 1, &mut stats)?;
        assert!((engine.probabilities()?[0b010] - 1.0).abs() < TEST_TOLERANCE);

        engine.execute(&Instruction::single("x", 0), 2, &mut stats)?;
        engine.execute(&fredkin, 3, &mut stats)?;
        assert!((engine.probabilities()?[0b101] - 1.0).abs() < TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn reset_returns_qubit_to_zero() -> Result<()> {
        let mut engine = engine(2)?;
        let mut stats = SimulationStatistics::new();
        engine.execute(&Instruction::new("x", vec![0, 1]), 0, &mut stats)?;
        engine.execute(&Instruction::single("reset", 1), 1, &mut stats)?;
        assert!((engine.probabilities()?[0b01] - 1.0).abs() < TEST_TOLERANCE);
        Ok(())
    }

    #[test]
    fn conditions_gate_on_measured_bits() -> Result<()> {
        let mut engine = engine(2)?;
        let mut stats = SimulationStatistics::new();
        let guarded = Instruction::single("x", 1).with_condition(Condition::new(vec![0], 1));

        engine.execute(&guarded, 0, &mut stats)?;
        assert!((engine.probabilities()?[0b00] - 1.0).abs() < TEST_TOLERANCE);

        engine.execute(&Instruction::single("x", 0), 1, &mut stats)?;
        engine.execute(&Instruction::measure(vec![0]), 2, &mut stats)?;
        engine.execute(&guarded, 3, &mut stats)?;
        assert!((engine.probabilities()?[0b11] - 1.0).abs() < TEST_TOLERANCE);
        assert_eq!(engine.register_value(), 0b01);
        Ok(())
    }

    #[test]
    fn intermediate_nodes_do_not_accumulate() -> Result<()> {
        let mut engine = engine(4)?;
        let mut stats = SimulationStatistics::new();
        let baseline = engine.active_nodes();
        for position in 0..20 {
            engine.execute(&Instruction::new("h", vec![0, 1, 2, 3]), position, &mut stats)?;
        }
        // An even number of Hadamard layers is the identity.
        assert_eq!(engine.active_nodes(), baseline);
        assert!(stats.max_active_nodes >= baseline);
        Ok(())
    }

    #[test]
    fn measure_all_collapses_to_the_sample() -> Result<()> {
        let mut engine = engine(3)?;
        let mut stats = SimulationStatistics::new();
        engine.execute(&Instruction::new("h", vec![0, 1, 2]), 0, &mut stats)?;
        let outcome = engine.measure_all()?;
        assert!((engine.probabilities()?[outcome as usize] - 1.0).abs() < TEST_TOLERANCE);
        assert_eq!(engine.register_value(), outcome);
        Ok(())
    }

    #[test]
    fn invalid_instruction_leaves_state_untouched() -> Result<()> {
        let mut engine = engine(1)?;
        let mut stats = SimulationStatistics::new();
        let err = engine.execute(&Instruction::single("h", 1), 7, &mut stats).unwrap_err();
        assert_eq!(err.position(), Some(7));
        assert!((engine.probabilities()?[0] - 1.0).abs() < TEST_TOLERANCE);
        assert_eq!(stats.gate_count, 0);
        Ok(())
    }
}
