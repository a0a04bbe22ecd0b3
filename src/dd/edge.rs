// src/dd/edge.rs

use super::complex_table::ComplexHandle;
use std::fmt;

/// Stable index of a node slot in the [`NodeTable`](super::NodeTable) arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The terminal node, representing the scalar 1.
    pub const TERMINAL: NodeId = NodeId(0);

    /// Whether this is the terminal node.
    pub fn is_terminal(&self) -> bool {
        *self == NodeId::TERMINAL
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_terminal() {
            write!(f, "T")
        } else {
            write!(f, "n{}", self.0)
        }
    }
}

/// A weighted pointer into a diagram. The weight scales the whole
/// sub-diagram rooted at `node`; a diagram is a single root edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Interned edge weight.
    pub weight: ComplexHandle,
    /// Target node.
    pub node: NodeId,
}

impl Edge {
    /// Builds an edge, canonicalizing zero weights to the zero edge.
    pub fn new(weight: ComplexHandle, node: NodeId) -> Self {
        if weight == ComplexHandle::ZERO {
            Self::zero()
        } else {
            Self { weight, node }
        }
    }

    /// Weight-1 edge to the terminal.
    pub const fn one() -> Self {
        Self { weight: ComplexHandle::ONE, node: NodeId::TERMINAL }
    }

    /// The canonical zero edge: weight 0 pointing at the terminal.
    pub const fn zero() -> Self {
        Self { weight: ComplexHandle::ZERO, node: NodeId::TERMINAL }
    }

    /// Whether this edge carries weight 0.
    pub fn is_zero(&self) -> bool {
        self.weight == ComplexHandle::ZERO
    }

    /// Whether this edge points at the terminal.
    pub fn is_terminal(&self) -> bool {
        self.node.is_terminal()
    }

    /// Same node, different weight.
    pub fn with_weight(self, weight: ComplexHandle) -> Self {
        Self::new(weight, self.node)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -> {})", self.weight, self.node)
    }
}
