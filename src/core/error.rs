//! Error handling logic

use thiserror::Error;

/// Errors raised while configuring the engine or replaying an instruction stream.
///
/// Instruction-level variants carry the zero-based `position` of the offending
/// instruction so the caller can point at it. None of them are transient: the
/// engine performs no I/O, so a failed run is never retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QmddError {
    /// A target or control qubit lies outside `[0, num_qubits)`.
    #[error("Invalid qubit index {qubit} at instruction {position} (circuit declares {num_qubits} qubits)")]
    InvalidQubitIndex {
        /// Position of the instruction in the stream.
        position: usize,
        /// The offending qubit index.
        qubit: usize,
        /// Declared qubit count.
        num_qubits: usize,
    },

    /// The gate identifier is not part of the gate catalogue.
    #[error("Unknown gate '{gate}' at instruction {position}")]
    UnknownGate {
        /// Position of the instruction in the stream.
        position: usize,
        /// The unrecognized identifier.
        gate: String,
    },

    /// Wrong parameter arity, wrong target arity, or inconsistent controls.
    #[error("Malformed instruction {position}: {message}")]
    MalformedInstruction {
        /// Position of the instruction in the stream.
        position: usize,
        /// What is wrong with it.
        message: String,
    },

    /// The numeric tolerance was set to a non-positive (or non-finite) value.
    #[error("Tolerance must be a positive finite number, got {tolerance}")]
    ToleranceConfiguration {
        /// The rejected tolerance.
        tolerance: f64,
    },

    /// A state vector whose squared norm strays from 1 by more than the
    /// allowed deviation.
    #[error("State is not normalized: sum of |amplitude|^2 = {norm_sqr} (allowed deviation {tolerance})")]
    Normalization {
        /// Observed squared norm.
        norm_sqr: f64,
        /// Allowed deviation from 1.
        tolerance: f64,
    },

    /// Any other unusable configuration value (qubit count, shot count, ...).
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration {
        /// InvalidConfiguration failure message
        message: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, QmddError>;

impl QmddError {
    /// Position of the offending instruction, if the error came from one.
    pub fn position(&self) -> Option<usize> {
        match self {
            QmddError::InvalidQubitIndex { position, .. }
            | QmddError::UnknownGate { position, .. }
            | QmddError::MalformedInstruction { position, .. } => Some(*position),
            QmddError::ToleranceConfiguration { .. }
            | QmddError::Normalization { .. }
            | QmddError::InvalidConfiguration { .. } => None,
        }
    }
}
