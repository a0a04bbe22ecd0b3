// src/circuits/mod.rs

//! Defines the already-parsed instruction stream consumed by the simulator.
//!
//! An [`Instruction`] names a gate from the catalogue in
//! [`operations`](crate::operations), the qubits it acts on and its
//! parameters. A [`Circuit`] is an ordered list of instructions over a
//! declared number of qubits; [`CircuitBuilder`] assembles one by chaining.

use std::fmt;

/// Classical guard on an instruction (OpenQASM `if(c==v)`).
///
/// The listed classical bits are read little-endian: `bits[0]` is the least
/// significant bit of the compared value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Classical register bits that form the compared value.
    pub bits: Vec<usize>,
    /// Value the bits must read for the instruction to run.
    pub value: u64,
}

impl Condition {
    /// Creates a condition over `bits` comparing against `value`.
    pub fn new(bits: Vec<usize>, value: u64) -> Self {
        Self { bits, value }
    }

    /// Evaluates the condition against a classical register. Bits outside
    /// the register read as 0. A condition wider than 64 bits never holds.
    pub fn is_satisfied(&self, register: &[bool]) -> bool {
        if self.bits.len() > u64::BITS as usize {
            return false;
        }
        let observed = self
            .bits
            .iter()
            .zip(0u32..)
            .filter(|(bit, _)| register.get(**bit).copied().unwrap_or(false))
            .fold(0u64, |acc, (_, i)| acc | 1u64.checked_shl(i).unwrap_or(0));
        observed == self.value
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits: Vec<String> = self.bits.iter().map(|b| format!("c{}", b)).collect();
        write!(f, "if([{}]=={})", bits.join(","), self.value)
    }
}

/// One already-parsed instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Gate identifier, e.g. `"h"`, `"cx"`, `"rz"`, `"measure"`.
    pub gate_id: String,
    /// Target qubits. Single-qubit gates broadcast over all of them.
    pub targets: Vec<usize>,
    /// Control qubits; the gate acts only when all of them are |1⟩.
    pub controls: Vec<usize>,
    /// Real gate parameters (angles in radians).
    pub params: Vec<f64>,
    /// Optional classical guard.
    pub condition: Option<Condition>,
}

impl Instruction {
    /// Creates an uncontrolled, parameterless instruction.
    pub fn new(gate_id: impl Into<String>, targets: Vec<usize>) -> Self {
        Self {
            gate_id: gate_id.into(),
            targets,
            controls: Vec::new(),
            params: Vec::new(),
            condition: None,
        }
    }

    /// Single-target shorthand.
    pub fn single(gate_id: impl Into<String>, target: usize) -> Self {
        Self::new(gate_id, vec![target])
    }

    /// Controlled single-target shorthand.
    pub fn controlled(gate_id: impl Into<String>, controls: Vec<usize>, target: usize) -> Self {
        Self::new(gate_id, vec![target]).with_controls(controls)
    }

    /// Measurement of every listed qubit.
    pub fn measure(targets: Vec<usize>) -> Self {
        Self::new("measure", targets)
    }

    /// Sets the control qubits.
    pub fn with_controls(mut self, controls: Vec<usize>) -> Self {
        self.controls = controls;
        self
    }

    /// Sets the gate parameters.
    pub fn with_params(mut self, params: Vec<f64>) -> Self {
        self.params = params;
        self
    }

    /// Guards the instruction with a classical condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Every qubit the instruction touches, controls first.
    pub fn involved_qubits(&self) -> impl Iterator<Item = usize> + '_ {
        self.controls.iter().chain(self.targets.iter()).copied()
    }

    /// Whether the instruction is a measurement.
    pub fn is_measurement(&self) -> bool {
        self.gate_id.eq_ignore_ascii_case("measure")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(condition) = &self.condition {
            write!(f, "{} ", condition)?;
        }
        write!(f, "{}", self.gate_id)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self.params.iter().map(|p| format!("{:.4}", p)).collect();
            write!(f, "({})", params.join(", "))?;
        }
        let qubits: Vec<String> = self.involved_qubits().map(|q| format!("q{}", q)).collect();
        write!(f, " {}", qubits.join(", "))
    }
}

/// An ordered instruction list over a declared number of qubits.
#[derive(Clone, PartialEq)]
pub struct Circuit {
    num_qubits: usize,
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Creates an empty circuit over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            instructions: Vec::new(),
        }
    }

    /// Appends one instruction.
    pub fn add_instruction(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    /// Appends instructions in order.
    pub fn add_instructions<I>(&mut self, instructions: I)
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.instructions.extend(instructions);
    }

    /// Declared qubit count.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// `true` if the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Whether any instruction measures explicitly. Circuits without one are
    /// measured in full at the end of every shot.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measurement)
    }
}

//-------------------------------------------------------------------------
// Circuit Builder
//-------------------------------------------------------------------------

/// Method-chaining helper for assembling a [`Circuit`].
pub struct CircuitBuilder {
    circuit: Circuit,
}

impl CircuitBuilder {
    /// Starts a circuit over `num_qubits` qubits.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
        }
    }

    /// Appends any instruction.
    pub fn add(mut self, instruction: Instruction) -> Self {
        self.circuit.add_instruction(instruction);
        self
    }

    /// Appends several instructions.
    pub fn add_all<I>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = Instruction>,
    {
        self.circuit.add_instructions(instructions);
        self
    }

    /// Appends a parameterless single-qubit gate.
    pub fn gate(self, gate_id: &str, target: usize) -> Self {
        self.add(Instruction::single(gate_id, target))
    }

    /// Appends a parameterized single-qubit gate.
    pub fn rotation(self, gate_id: &str, params: Vec<f64>, target: usize) -> Self {
        self.add(Instruction::single(gate_id, target).with_params(params))
    }

    /// Hadamard on `target`.
    pub fn h(self, target: usize) -> Self {
        self.gate("h", target)
    }

    /// Pauli X on `target`.
    pub fn x(self, target: usize) -> Self {
        self.gate("x", target)
    }

    /// CNOT.
    pub fn cx(self, control: usize, target: usize) -> Self {
        self.add(Instruction::controlled("cx", vec![control], target))
    }

    /// Measures the listed qubits.
    pub fn measure(self, targets: Vec<usize>) -> Self {
        self.add(Instruction::measure(targets))
    }

    /// Measures every declared qubit.
    pub fn measure_all(self) -> Self {
        let all = (0..self.circuit.num_qubits).collect();
        self.measure(all)
    }

    /// Finalizes the circuit.
    pub fn build(self) -> Circuit {
        self.circuit
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let num_qubits = self.num_qubits;
        let steps = self.instructions.len();
        writeln!(f, "qmdd::Circuit[{} instructions on {} qubits]", steps, num_qubits)?;
        if steps == 0 || num_qubits == 0 {
            return Ok(());
        }

        const GATE_WIDTH: usize = 7;
        const WIRE: &str = "───────";
        const V_WIRE: char = '│';
        const H_WIRE: char = '─';

        let label_width = format!("q{}", num_qubits - 1).len() + 2;
        let mut grid: Vec<Vec<String>> = vec![vec![WIRE.to_string(); steps]; num_qubits];
        // connectors[row][t] is drawn below `row` at step `t`.
        let mut connectors: Vec<Vec<char>> = vec![vec![' '; steps]; num_qubits];

        fn format_gate(symbol: &str) -> String {
            let len = symbol.chars().count();
            if len >= GATE_WIDTH {
                symbol.chars().take(GATE_WIDTH).collect()
            } else {
                let dashes = GATE_WIDTH - len;
                let pre = dashes / 2;
                format!(
                    "{}{}{}",
                    H_WIRE.to_string().repeat(pre),
                    symbol,
                    H_WIRE.to_string().repeat(dashes - pre)
                )
            }
        }

        for (t, instruction) in self.instructions.iter().enumerate() {
            let id = instruction.gate_id.to_ascii_lowercase();
            let symbol = match id.as_str() {
                "measure" => "M".to_string(),
                "reset" => "|0>".to_string(),
                "barrier" => "░".to_string(),
                "swap" | "cswap" | "fredkin" => "x".to_string(),
                "cx" | "cnot" | "ccx" | "toffoli" => "X".to_string(),
                "id" | "i" => continue,
                other => {
                    let base = if instruction.controls.is_empty() { other } else { other.trim_start_matches('c') };
                    base.to_ascii_uppercase()
                }
            };
            for &target in instruction.targets.iter().filter(|&&q| q < num_qubits) {
                grid[target][t] = format_gate(&symbol);
            }
            for &control in instruction.controls.iter().filter(|&&q| q < num_qubits) {
                grid[control][t] = format_gate("@");
            }

            let involved: Vec<usize> = instruction.involved_qubits().filter(|&q| q < num_qubits).collect();
            let linked = !instruction.controls.is_empty() || id.contains("swap") || id == "fredkin";
            if let (true, Some(&lo), Some(&hi)) = (linked, involved.iter().min(), involved.iter().max()) {
                for row in connectors.iter_mut().take(hi).skip(lo) {
                    row[t] = V_WIRE;
                }
            }
        }

        for q in 0..num_qubits {
            write!(f, "{:<width$}", format!("q{}: ", q), width = label_width)?;
            writeln!(f, "{}", grid[q].join(""))?;
            if q + 1 < num_qubits {
                write!(f, "{}", " ".repeat(label_width))?;
                for t in 0..steps {
                    let pad = GATE_WIDTH - 1;
                    write!(f, "{}{}{}", " ".repeat(pad / 2), connectors[q][t], " ".repeat(pad - pad / 2))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
