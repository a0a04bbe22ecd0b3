// src/validation/mod.rs

//! Checks on instructions before they touch the state, and on dense state
//! snapshots after the fact.

use crate::circuits::Instruction;
use crate::core::{QmddError, Result};
use crate::operations::{Gate, ParsedGate};
use num_complex::Complex;
use std::collections::HashSet;

// Default tolerance for snapshot checks (can be overridden by caller)
const DEFAULT_NORM_TOLERANCE: f64 = 1e-9;

fn malformed(position: usize, message: String) -> QmddError {
    QmddError::MalformedInstruction { position, message }
}

/// Resolves the gate of `instruction` and checks its operands against a
/// register of `num_qubits` qubits.
///
/// # Errors
/// * `UnknownGate` for an identifier outside the catalogue.
/// * `InvalidQubitIndex` for a target or control `>= num_qubits`.
/// * `MalformedInstruction` for wrong parameter or target arity, missing
///   controls on a controlled alias, controls on a non-unitary directive,
///   repeated qubits, or a classical condition that cannot be evaluated.
pub fn validate_instruction(instruction: &Instruction, num_qubits: usize, position: usize) -> Result<ParsedGate> {
    let parsed = Gate::parse(&instruction.gate_id, &instruction.params, position)?;

    if let Some(qubit) = instruction.involved_qubits().find(|&q| q >= num_qubits) {
        return Err(QmddError::InvalidQubitIndex {
            position,
            qubit,
            num_qubits,
        });
    }

    if instruction.targets.is_empty() && parsed.gate != Gate::Barrier {
        return Err(malformed(position, format!("'{}' has no target qubit", instruction.gate_id)));
    }
    if let Some(expected) = parsed.gate.target_arity() {
        if instruction.targets.len() != expected {
            return Err(malformed(
                position,
                format!(
                    "'{}' takes exactly {} targets, got {}",
                    instruction.gate_id,
                    expected,
                    instruction.targets.len()
                ),
            ));
        }
    }

    if !parsed.gate.is_unitary() && !instruction.controls.is_empty() {
        return Err(malformed(position, format!("'{}' cannot be controlled", instruction.gate_id)));
    }
    if instruction.controls.len() < parsed.min_controls {
        return Err(malformed(
            position,
            format!(
                "'{}' requires at least {} control(s), got {}",
                instruction.gate_id,
                parsed.min_controls,
                instruction.controls.len()
            ),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(qubit) = instruction.involved_qubits().find(|q| !seen.insert(*q)) {
        let message = if instruction.controls.contains(&qubit) && instruction.targets.contains(&qubit) {
            format!("qubit {} is both control and target", qubit)
        } else {
            format!("qubit {} appears more than once", qubit)
        };
        return Err(malformed(position, message));
    }

    if let Some(condition) = &instruction.condition {
        if condition.bits.is_empty() {
            return Err(malformed(position, "condition lists no classical bits".to_string()));
        }
        if let Some(bit) = condition.bits.iter().find(|&&b| b >= num_qubits) {
            return Err(malformed(
                position,
                format!("condition reads classical bit {} of a {}-bit register", bit, num_qubits),
            ));
        }
        if condition.bits.len() > u64::BITS as usize {
            return Err(malformed(
                position,
                format!("condition reads {} bits, at most 64 fit the compared value", condition.bits.len()),
            ));
        }
        let mut read = HashSet::new();
        if let Some(bit) = condition.bits.iter().find(|b| !read.insert(**b)) {
            return Err(malformed(position, format!("condition reads classical bit {} more than once", bit)));
        }
        if condition.bits.len() < 64 && condition.value >> condition.bits.len() != 0 {
            return Err(malformed(
                position,
                format!("condition value {} does not fit in {} bits", condition.value, condition.bits.len()),
            ));
        }
    }

    Ok(parsed)
}

/// Checks that a dense amplitude vector has unit squared norm.
///
/// # Arguments
/// * `amplitudes` - The snapshot to check.
/// * `tolerance` - Allowed deviation from 1.0 (defaults to 1e-9).
///
/// # Returns
/// * `Ok(())` if normalized within tolerance.
/// * `Err(QmddError::Normalization)` otherwise.
pub fn check_normalization(amplitudes: &[Complex<f64>], tolerance: Option<f64>) -> Result<()> {
    let tolerance = tolerance.unwrap_or(DEFAULT_NORM_TOLERANCE);
    let norm_sqr: f64 = amplitudes.iter().map(|c| c.norm_sqr()).sum();
    if (norm_sqr - 1.0).abs() > tolerance {
        Err(QmddError::Normalization { norm_sqr, tolerance })
    } else {
        Ok(())
    }
}
