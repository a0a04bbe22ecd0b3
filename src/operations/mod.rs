// src/operations/mod.rs

//! The gate catalogue.
//!
//! Maps the textual gate identifiers of an already-parsed instruction to
//! [`Gate`] values and their 2x2 matrices. Controls are not part of a gate:
//! they are applied structurally when the gate diagram is built, so `cx` is
//! simply `x` with one or more controls.

use crate::core::{QmddError, Result};
use crate::dd::Matrix2;
use num_complex::Complex;
use num_traits::{One, Zero};
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};
use std::fmt;

/// A gate (or non-unitary directive) understood by the simulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gate {
    /// Identity.
    Identity,
    /// Pauli X (bit flip).
    X,
    /// Pauli Y.
    Y,
    /// Pauli Z (phase flip).
    Z,
    /// Hadamard.
    H,
    /// Phase π/2.
    S,
    /// Phase -π/2.
    Sdg,
    /// Phase π/4.
    T,
    /// Phase -π/4.
    Tdg,
    /// Square root of X.
    Sx,
    /// Inverse square root of X.
    Sxdg,
    /// Rotation about X by `theta`.
    Rx(f64),
    /// Rotation about Y by `theta`.
    Ry(f64),
    /// Rotation about Z by `theta`.
    Rz(f64),
    /// `diag(1, e^{iλ})`, also known as `u1`.
    Phase(f64),
    /// `u2(φ, λ) = u3(π/2, φ, λ)`.
    U2(f64, f64),
    /// The generic single-qubit rotation `u3(θ, φ, λ)`.
    U3(f64, f64, f64),
    /// Exchange of two qubits.
    Swap,
    /// Measurement in the computational basis.
    Measure,
    /// Measure and return the qubit to |0⟩.
    Reset,
    /// Scheduling hint with no effect on the state.
    Barrier,
}

/// A gate identifier resolved against the catalogue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedGate {
    /// The resolved gate.
    pub gate: Gate,
    /// Controls the identifier itself demands (`cx` needs 1, `ccx` needs 2).
    pub min_controls: usize,
}

impl Gate {
    /// Resolves `gate_id` and its parameters.
    ///
    /// # Errors
    /// * `UnknownGate` if the identifier is not in the catalogue.
    /// * `MalformedInstruction` if the parameter count does not match.
    pub fn parse(gate_id: &str, params: &[f64], position: usize) -> Result<ParsedGate> {
        let lower = gate_id.to_ascii_lowercase();
        let (name, min_controls) = match lower.as_str() {
            "cx" | "cnot" => ("x", 1),
            "ccx" | "toffoli" => ("x", 2),
            "cy" => ("y", 1),
            "cz" => ("z", 1),
            "ch" => ("h", 1),
            "crx" => ("rx", 1),
            "cry" => ("ry", 1),
            "crz" => ("rz", 1),
            "cp" | "cu1" | "cphase" => ("p", 1),
            "cu3" | "cu" => ("u3", 1),
            "cswap" | "fredkin" => ("swap", 1),
            other => (other, 0),
        };

        let expected = match name {
            "id" | "i" | "x" | "y" | "z" | "h" | "s" | "sdg" | "t" | "tdg" | "sx" | "sxdg" | "swap"
            | "measure" | "reset" | "barrier" => 0,
            "rx" | "ry" | "rz" | "p" | "u1" | "phase" => 1,
            "u2" => 2,
            "u3" | "u" => 3,
            _ => {
                return Err(QmddError::UnknownGate {
                    position,
                    gate: gate_id.to_string(),
                });
            }
        };
        if params.len() != expected {
            return Err(QmddError::MalformedInstruction {
                position,
                message: format!("gate '{}' takes {} parameter(s), got {}", gate_id, expected, params.len()),
            });
        }
        if let Some(bad) = params.iter().find(|p| !p.is_finite()) {
            return Err(QmddError::MalformedInstruction {
                position,
                message: format!("gate '{}' has non-finite parameter {}", gate_id, bad),
            });
        }

        let gate = match name {
            "id" | "i" => Gate::Identity,
            "x" => Gate::X,
            "y" => Gate::Y,
            "z" => Gate::Z,
            "h" => Gate::H,
            "s" => Gate::S,
            "sdg" => Gate::Sdg,
            "t" => Gate::T,
            "tdg" => Gate::Tdg,
            "sx" => Gate::Sx,
            "sxdg" => Gate::Sxdg,
            "rx" => Gate::Rx(params[0]),
            "ry" => Gate::Ry(params[0]),
            "rz" => Gate::Rz(params[0]),
            "p" | "u1" | "phase" => Gate::Phase(params[0]),
            "u2" => Gate::U2(params[0], params[1]),
            "u3" | "u" => Gate::U3(params[0], params[1], params[2]),
            "swap" => Gate::Swap,
            "measure" => Gate::Measure,
            "reset" => Gate::Reset,
            _ => Gate::Barrier,
        };
        Ok(ParsedGate { gate, min_controls })
    }

    /// Short lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Identity => "id",
            Gate::X => "x",
            Gate::Y => "y",
            Gate::Z => "z",
            Gate::H => "h",
            Gate::S => "s",
            Gate::Sdg => "sdg",
            Gate::T => "t",
            Gate::Tdg => "tdg",
            Gate::Sx => "sx",
            Gate::Sxdg => "sxdg",
            Gate::Rx(_) => "rx",
            Gate::Ry(_) => "ry",
            Gate::Rz(_) => "rz",
            Gate::Phase(_) => "p",
            Gate::U2(..) => "u2",
            Gate::U3(..) => "u3",
            Gate::Swap => "swap",
            Gate::Measure => "measure",
            Gate::Reset => "reset",
            Gate::Barrier => "barrier",
        }
    }

    /// Whether the gate is a unitary applied through a gate diagram.
    pub fn is_unitary(&self) -> bool {
        !matches!(self, Gate::Measure | Gate::Reset | Gate::Barrier)
    }

    /// Exact number of targets the gate needs, or `None` if it broadcasts
    /// over any non-empty target list.
    pub fn target_arity(&self) -> Option<usize> {
        match self {
            Gate::Swap => Some(2),
            _ => None,
        }
    }

    /// The 2x2 matrix of a single-qubit unitary; `None` for `swap` and the
    /// non-unitary directives.
    pub fn matrix(&self) -> Option<Matrix2> {
        let zero = Complex::zero();
        let one = Complex::one();
        let i = Complex::i();
        let m = match *self {
            Gate::Identity => [[one, zero], [zero, one]],
            Gate::X => [[zero, one], [one, zero]],
            Gate::Y => [[zero, -i], [i, zero]],
            Gate::Z => phase_shift_matrix(std::f64::consts::PI),
            Gate::H => {
                let h = Complex::new(FRAC_1_SQRT_2, 0.0);
                [[h, h], [h, -h]]
            }
            Gate::S => phase_shift_matrix(FRAC_PI_2),
            Gate::Sdg => phase_shift_matrix(-FRAC_PI_2),
            Gate::T => phase_shift_matrix(FRAC_PI_4),
            Gate::Tdg => phase_shift_matrix(-FRAC_PI_4),
            Gate::Sx => [
                [Complex::new(0.5, 0.5), Complex::new(0.5, -0.5)],
                [Complex::new(0.5, -0.5), Complex::new(0.5, 0.5)],
            ],
            Gate::Sxdg => [
                [Complex::new(0.5, -0.5), Complex::new(0.5, 0.5)],
                [Complex::new(0.5, 0.5), Complex::new(0.5, -0.5)],
            ],
            Gate::Rx(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [[Complex::new(c, 0.0), -i * s], [-i * s, Complex::new(c, 0.0)]]
            }
            Gate::Ry(theta) => {
                let (s, c) = (theta / 2.0).sin_cos();
                [[Complex::new(c, 0.0), Complex::new(-s, 0.0)], [Complex::new(s, 0.0), Complex::new(c, 0.0)]]
            }
            Gate::Rz(theta) => [
                [Complex::from_polar(1.0, -theta / 2.0), zero],
                [zero, Complex::from_polar(1.0, theta / 2.0)],
            ],
            Gate::Phase(lambda) => phase_shift_matrix(lambda),
            Gate::U2(phi, lambda) => u3_matrix(FRAC_PI_2, phi, lambda),
            Gate::U3(theta, phi, lambda) => u3_matrix(theta, phi, lambda),
            Gate::Swap | Gate::Measure | Gate::Reset | Gate::Barrier => return None,
        };
        Some(m)
    }

    /// The inverse gate, if the gate is unitary.
    pub fn inverse(&self) -> Option<Gate> {
        let inverse = match *self {
            Gate::Identity | Gate::X | Gate::Y | Gate::Z | Gate::H | Gate::Swap => *self,
            Gate::S => Gate::Sdg,
            Gate::Sdg => Gate::S,
            Gate::T => Gate::Tdg,
            Gate::Tdg => Gate::T,
            Gate::Sx => Gate::Sxdg,
            Gate::Sxdg => Gate::Sx,
            Gate::Rx(theta) => Gate::Rx(-theta),
            Gate::Ry(theta) => Gate::Ry(-theta),
            Gate::Rz(theta) => Gate::Rz(-theta),
            Gate::Phase(lambda) => Gate::Phase(-lambda),
            Gate::U2(phi, lambda) => Gate::U3(-FRAC_PI_2, -lambda, -phi),
            Gate::U3(theta, phi, lambda) => Gate::U3(-theta, -lambda, -phi),
            Gate::Measure | Gate::Reset | Gate::Barrier => return None,
        };
        Some(inverse)
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            Gate::Rx(a) | Gate::Ry(a) | Gate::Rz(a) | Gate::Phase(a) => vec![a],
            Gate::U2(a, b) => vec![a, b],
            Gate::U3(a, b, c) => vec![a, b, c],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        let params = self.params();
        if !params.is_empty() {
            let rendered: Vec<String> = params.iter().map(|p| format!("{:.4}", p)).collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}

/// `diag(1, e^{iθ})`: phase applied to the |1⟩ component only.
fn phase_shift_matrix(theta: f64) -> Matrix2 {
    [
        [Complex::one(), Complex::zero()],
        [Complex::zero(), Complex::from_polar(1.0, theta)],
    ]
}

/// OpenQASM `u3(θ, φ, λ)`.
fn u3_matrix(theta: f64, phi: f64, lambda: f64) -> Matrix2 {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [Complex::new(c, 0.0), -Complex::from_polar(s, lambda)],
        [Complex::from_polar(s, phi), Complex::from_polar(c, phi + lambda)],
    ]
}
