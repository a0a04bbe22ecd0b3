//! Numeric defaults shared by the engine.

/// Default tolerance ε: two complex values closer than this in both
/// components are the same entry of the amplitude store.
pub const DEFAULT_TOLERANCE: f64 = 1e-13;

/// Default number of shots per run.
pub const DEFAULT_SHOTS: usize = 1;

/// Largest qubit count for which dense amplitude/probability snapshots are
/// produced. A snapshot holds 2^n entries.
pub const MAX_SNAPSHOT_QUBITS: usize = 24;

/// Largest supported qubit count: basis indices and measurement outcomes are
/// packed into a `u64`.
pub const MAX_QUBITS: usize = 64;
