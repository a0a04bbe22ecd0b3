// src/dd/mod.rs

//! Quantum multiple-valued decision diagrams (QMDD).
//!
//! States and operators are rooted [`Edge`]s into a shared, hash-consed node
//! graph owned by a [`Package`]. Edge weights are handles into a
//! tolerance-aware [`ComplexTable`]; nodes are reference counted by a
//! [`NodeTable`] and freed as soon as nothing reaches them.
//!
//! Level 0 sits at the root and holds qubit 0; the basis index of an
//! amplitude uses bit `q` for qubit `q`.

pub mod algebra;
pub mod complex_table;
pub mod edge;
pub mod measurement;
pub mod node_table;
pub mod package;

pub use complex_table::{ComplexHandle, ComplexTable};
pub use edge::{Edge, NodeId};
pub use node_table::{Node, NodeTable, TERMINAL_LEVEL};
pub use package::{Matrix2, Package};
