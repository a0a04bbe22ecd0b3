// src/dd/package.rs

//! The decision-diagram package: one amplitude store plus one node table, and
//! the operations that build and query diagrams over them.

use super::complex_table::{ComplexHandle, ComplexTable};
use super::edge::{Edge, NodeId};
use super::node_table::NodeTable;
use crate::core::{MAX_SNAPSHOT_QUBITS, QmddError, Result};
use num_complex::Complex;
use num_traits::{One, Zero};

/// A 2x2 complex matrix in row-major order.
pub type Matrix2 = [[Complex<f64>; 2]; 2];

/// Owns the amplitude store and the node table of one simulation.
///
/// Diagrams are plain [`Edge`] values; the package is the only place that
/// can create, combine or free the nodes they point at. A diagram that must
/// survive [`Package::collect_unreferenced`] has to be registered with
/// [`Package::inc_ref`] and released later with [`Package::dec_ref`].
#[derive(Debug, Clone)]
pub struct Package {
    pub(crate) complex: ComplexTable,
    pub(crate) nodes: NodeTable,
}

impl Package {
    /// Creates an empty package with the given tolerance ε.
    pub fn new(tolerance: f64) -> Result<Self> {
        Ok(Self {
            complex: ComplexTable::new(tolerance)?,
            nodes: NodeTable::new(),
        })
    }

    /// The amplitude store.
    pub fn complex_table(&self) -> &ComplexTable {
        &self.complex
    }

    /// The node table.
    pub fn node_table(&self) -> &NodeTable {
        &self.nodes
    }

    /// Weight-1 edge to the terminal.
    pub fn terminal(&self) -> Edge {
        Edge::one()
    }

    /// The canonical zero edge.
    pub fn zero(&self) -> Edge {
        Edge::zero()
    }

    /// Value of an edge weight.
    pub fn weight(&self, edge: Edge) -> Complex<f64> {
        self.complex.value_of(edge.weight)
    }

    /// Live nodes across all levels.
    pub fn active_nodes(&self) -> usize {
        self.nodes.live_count()
    }

    /// Distinct interned complex values.
    pub fn complex_count(&self) -> usize {
        self.complex.len()
    }

    // --- reference counting ---

    /// Registers an external reference to the diagram rooted at `edge`.
    pub fn inc_ref(&mut self, edge: Edge) {
        self.nodes.incref(edge.node);
    }

    /// Drops an external reference; unreachable nodes are freed at once.
    pub fn dec_ref(&mut self, edge: Edge) {
        self.nodes.decref(edge.node);
    }

    /// Frees intermediate nodes no registered diagram reaches.
    pub fn collect_unreferenced(&mut self) -> usize {
        self.nodes.collect_unreferenced()
    }

    // --- normalized node construction ---

    /// Multiplies the weight of `edge` by `factor`.
    pub fn scale(&mut self, edge: Edge, factor: ComplexHandle) -> Edge {
        if edge.is_zero() {
            return edge;
        }
        let weight = self.complex.multiply(edge.weight, factor);
        edge.with_weight(weight)
    }

    /// Builds a normalized state-vector node at `level`.
    ///
    /// The child weights are divided by `‖w‖₂ · phase(first non-zero w)`, so
    /// they have unit 2-norm and the first non-zero one is real positive; the
    /// divisor moves to the returned edge.
    pub fn make_vector_edge(&mut self, level: usize, children: [Edge; 2]) -> Edge {
        if children.iter().all(Edge::is_zero) {
            return Edge::zero();
        }
        let values = children.map(|e| self.complex.value_of(e.weight));
        let norm = values.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
        let lead = if children[0].is_zero() { values[1] } else { values[0] };
        let divisor = lead / lead.norm() * norm;

        let top = self.complex.intern(divisor);
        if top == ComplexHandle::ZERO {
            return Edge::zero();
        }
        let mut normalized = [Edge::zero(); 2];
        for (slot, (child, value)) in normalized.iter_mut().zip(children.iter().zip(values)) {
            if !child.is_zero() {
                *slot = Edge::new(self.complex.intern(value / divisor), child.node);
            }
        }
        let node = self.nodes.make_node(level, &normalized);
        Edge::new(top, node)
    }

    /// Builds a normalized operator node at `level`.
    ///
    /// The child weights are divided by the largest-magnitude weight (lowest
    /// index on ties within ε), which becomes exactly 1.
    pub fn make_matrix_edge(&mut self, level: usize, children: [Edge; 4]) -> Edge {
        if children.iter().all(Edge::is_zero) {
            return Edge::zero();
        }
        let tolerance = self.complex.tolerance();
        let values = children.map(|e| self.complex.value_of(e.weight));
        let max = values.iter().map(|v| v.norm()).fold(0.0, f64::max);
        let lead = values
            .iter()
            .position(|v| v.norm() >= max - tolerance)
            .unwrap_or(0);
        let divisor = values[lead];

        let mut normalized = [Edge::zero(); 4];
        for (i, slot) in normalized.iter_mut().enumerate() {
            let child = children[i];
            if child.is_zero() {
                continue;
            }
            let weight = if i == lead {
                ComplexHandle::ONE
            } else {
                self.complex.intern(values[i] / divisor)
            };
            *slot = Edge::new(weight, child.node);
        }
        let node = self.nodes.make_node(level, &normalized);
        Edge::new(children[lead].weight, node)
    }

    // --- diagram construction ---

    /// The all-zero basis state |0…0⟩ over `n` qubits.
    pub fn basis_state(&mut self, n: usize) -> Edge {
        let mut edge = Edge::one();
        for level in (0..n).rev() {
            edge = self.make_vector_edge(level, [edge, Edge::zero()]);
        }
        edge
    }

    /// The computational basis state `|index⟩`; bit `q` of `index` is the
    /// value of qubit `q`.
    pub fn computational_basis_state(&mut self, n: usize, index: u64) -> Result<Edge> {
        if n < 64 && index >> n != 0 {
            return Err(QmddError::InvalidConfiguration {
                message: format!("basis index {} does not fit in {} qubits", index, n),
            });
        }
        let mut edge = Edge::one();
        for level in (0..n).rev() {
            edge = if (index >> level) & 1 == 0 {
                self.make_vector_edge(level, [edge, Edge::zero()])
            } else {
                self.make_vector_edge(level, [Edge::zero(), edge])
            };
        }
        Ok(edge)
    }

    /// The identity operator over `n` qubits.
    pub fn identity(&mut self, n: usize) -> Edge {
        let mut edge = Edge::one();
        for level in (0..n).rev() {
            edge = self.identity_step(level, edge);
        }
        edge
    }

    /// Operator applying `matrix` to `target` when every qubit in `controls`
    /// is |1⟩, and the identity otherwise.
    ///
    /// Built bottom-up. Below the target two diagrams are carried: `p`, the
    /// projector onto "all controls seen so far are satisfied", and `q = I - p`.
    /// The target level combines them as `U ⊗ p + I ⊗ q`; a control above the
    /// target wraps the result as `|0⟩⟨0| ⊗ I + |1⟩⟨1| ⊗ G`.
    pub fn gate_diagram(&mut self, matrix: &Matrix2, target: usize, controls: &[usize], n: usize) -> Edge {
        debug_assert!(target < n, "target {} outside {} qubits", target, n);
        let u = [matrix[0][0], matrix[0][1], matrix[1][0], matrix[1][1]].map(|v| self.complex.intern(v));

        let mut id = Edge::one();
        let mut p = Edge::one();
        let mut q = Edge::zero();
        for level in (target + 1..n).rev() {
            if controls.contains(&level) {
                p = self.make_matrix_edge(level, [Edge::zero(), Edge::zero(), Edge::zero(), p]);
                q = self.make_matrix_edge(level, [id, Edge::zero(), Edge::zero(), q]);
            } else {
                p = self.identity_step(level, p);
                q = self.identity_step(level, q);
            }
            id = self.identity_step(level, id);
        }

        let diagonal = [self.scale(p, u[0]), self.scale(p, u[3])];
        let d0 = self.add(diagonal[0], q);
        let d1 = self.add(diagonal[1], q);
        let off0 = self.scale(p, u[1]);
        let off1 = self.scale(p, u[2]);
        let mut gate = self.make_matrix_edge(target, [d0, off0, off1, d1]);
        id = self.identity_step(target, id);

        for level in (0..target).rev() {
            gate = if controls.contains(&level) {
                self.make_matrix_edge(level, [id, Edge::zero(), Edge::zero(), gate])
            } else {
                self.identity_step(level, gate)
            };
            id = self.identity_step(level, id);
        }
        gate
    }

    /// Projector `|outcome⟩⟨outcome|` on `qubit`, identity elsewhere.
    pub fn projector(&mut self, qubit: usize, outcome: bool, n: usize) -> Edge {
        let (zero, one) = (Complex::zero(), Complex::one());
        let matrix = if outcome {
            [[zero, zero], [zero, one]]
        } else {
            [[one, zero], [zero, zero]]
        };
        self.gate_diagram(&matrix, qubit, &[], n)
    }

    fn identity_step(&mut self, level: usize, below: Edge) -> Edge {
        self.make_matrix_edge(level, [below, Edge::zero(), Edge::zero(), below])
    }

    // --- queries ---

    /// Amplitude of basis state `index`: the product of the weights on the
    /// path selected by the bits of `index`, computed through the store.
    pub fn amplitude(&mut self, state: Edge, index: u64) -> Complex<f64> {
        let mut weight = state.weight;
        let mut node = state.node;
        while !node.is_terminal() && weight != ComplexHandle::ZERO {
            let current = self.nodes.node(node);
            let bit = ((index >> current.level()) & 1) as usize;
            let edge = current.edges()[bit];
            weight = self.complex.multiply(weight, edge.weight);
            node = edge.node;
        }
        self.complex.value_of(weight)
    }

    /// `|amplitude(state, index)|²`.
    pub fn probability(&mut self, state: Edge, index: u64) -> f64 {
        self.amplitude(state, index).norm_sqr()
    }

    /// Squared norm of a state diagram. Vector nodes have unit-norm children,
    /// so this is the squared magnitude of the root weight.
    pub fn norm_sqr(&self, state: Edge) -> f64 {
        self.complex.magnitude_sqr(state.weight)
    }

    /// Rescales the root so the state has unit norm. A zero state stays zero.
    pub fn normalize(&mut self, state: Edge) -> Edge {
        let norm = self.norm_sqr(state).sqrt();
        if state.is_zero() || norm == 0.0 {
            return state;
        }
        let value = self.complex.value_of(state.weight) / norm;
        let weight = self.complex.intern(value);
        state.with_weight(weight)
    }

    /// Dense amplitude vector of an `n`-qubit state; entry `i` is
    /// `amplitude(state, i)`.
    ///
    /// # Errors
    /// `InvalidConfiguration` when `n` exceeds [`MAX_SNAPSHOT_QUBITS`].
    pub fn state_vector(&self, state: Edge, n: usize) -> Result<Vec<Complex<f64>>> {
        if n > MAX_SNAPSHOT_QUBITS {
            return Err(QmddError::InvalidConfiguration {
                message: format!(
                    "dense snapshots are limited to {} qubits, requested {}",
                    MAX_SNAPSHOT_QUBITS, n
                ),
            });
        }
        let mut out = vec![Complex::zero(); 1usize << n];
        let root = self.complex.value_of(state.weight);
        self.fill_vector(state.node, root, 0, &mut out);
        Ok(out)
    }

    /// Dense probability vector of an `n`-qubit state.
    pub fn probabilities(&self, state: Edge, n: usize) -> Result<Vec<f64>> {
        Ok(self.state_vector(state, n)?.iter().map(|a| a.norm_sqr()).collect())
    }

    fn fill_vector(&self, node: NodeId, weight: Complex<f64>, index: usize, out: &mut [Complex<f64>]) {
        if weight.is_zero() {
            return;
        }
        if node.is_terminal() {
            out[index] = weight;
            return;
        }
        let current = self.nodes.node(node);
        let level = current.level();
        for (bit, edge) in current.edges().iter().enumerate() {
            if edge.is_zero() {
                continue;
            }
            let child_weight = weight * self.complex.value_of(edge.weight);
            self.fill_vector(edge.node, child_weight, index | (bit << level), out);
        }
    }
}
