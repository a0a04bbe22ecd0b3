// src/lib.rs

//! `qmdd` - quantum circuit simulation on decision diagrams
//!
//! State vectors and gate operators are stored as quantum multiple-valued
//! decision diagrams: shared, edge-weighted graphs in which identical
//! sub-vectors and sub-matrices exist exactly once. Circuits with structure
//! (GHZ states, arithmetic, oracles) stay small where a dense 2^n vector
//! would not.
//!
//! * [`dd`] holds the diagram engine: the tolerance-aware complex table, the
//!   hash-consed node table with reference counting, composition and
//!   measurement.
//! * [`simulation`] replays an already-parsed instruction stream
//!   ([`circuits`]) and samples shots.
//! * [`operations`] is the gate catalogue; [`validation`] checks
//!   instructions and dense snapshots; [`core`] has errors and configuration.

pub mod circuits;
pub mod core;
pub mod dd;
pub mod operations;
pub mod simulation;
pub mod validation;

// Re-export the most common types for easier top-level use
pub use circuits::{Circuit, CircuitBuilder, Condition, Instruction};
pub use crate::core::{QmddError, Result, SimulationConfig};
pub use dd::{Edge, Package};
pub use operations::Gate;
pub use simulation::{ShotResult, SimulationPhase, SimulationResult, SimulationStatistics, Simulator};
pub use validation::{check_normalization, validate_instruction};

// Example 1: Bell pair
// Every shot of a Bell pair reads either 00 or 11.
/// ```
/// use qmdd::{CircuitBuilder, SimulationConfig, Simulator, QmddError};
///
/// let circuit = CircuitBuilder::new(2).h(0).cx(0, 1).build();
/// let mut simulator = Simulator::new(SimulationConfig::new(2).with_shots(100).with_seed(7))?;
/// let result = simulator.run(&circuit)?;
///
/// let counts = result.counts();
/// assert_eq!(counts.values().sum::<usize>(), 100);
/// assert!(counts.keys().all(|bits| bits == "00" || bits == "11"));
/// # Ok::<(), QmddError>(())
/// ```
#[doc(hidden)]
const _: () = ();

// Example 2: Working with diagrams directly
// A GHZ state over 16 qubits needs one node per level plus one extra branch
// per level, not 2^16 amplitudes.
/// ```
/// use qmdd::{Gate, Package, QmddError};
///
/// let n = 16;
/// let mut dd = Package::new(1e-13)?;
/// let h = Gate::H.matrix().ok_or(QmddError::InvalidConfiguration { message: "h".into() })?;
/// let x = Gate::X.matrix().ok_or(QmddError::InvalidConfiguration { message: "x".into() })?;
///
/// let mut state = dd.basis_state(n);
/// let gate = dd.gate_diagram(&h, 0, &[], n);
/// state = dd.apply(gate, state);
/// for q in 1..n {
///     let cnot = dd.gate_diagram(&x, q, &[q - 1], n);
///     state = dd.apply(cnot, state);
/// }
///
/// assert!((dd.probability(state, 0) - 0.5).abs() < 1e-9);
/// assert!((dd.probability(state, (1u64 << n) - 1) - 0.5).abs() < 1e-9);
/// # Ok::<(), QmddError>(())
/// ```
#[doc(hidden)]
const _: () = ();
