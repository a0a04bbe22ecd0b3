// src/core/mod.rs

//! Core types: errors, configuration and numeric defaults

pub mod config;
pub mod constants;
pub mod error;

// Re-export public types for convenient access via `qmdd::core::TypeName`
pub use config::SimulationConfig;
pub use constants::{DEFAULT_SHOTS, DEFAULT_TOLERANCE, MAX_QUBITS, MAX_SNAPSHOT_QUBITS};
pub use error::{QmddError, Result};
