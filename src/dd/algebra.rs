// src/dd/algebra.rs

//! Diagram composition: operator × state, operator × operator and addition.
//!
//! Every top-level call owns a [`ComputeCache`] that memoizes recursive
//! subproblems and is dropped when the call returns, so memory use does not
//! grow across a long instruction stream.

use super::edge::{Edge, NodeId};
use super::package::Package;
use std::collections::HashMap;
use tracing::trace;

/// Memo tables for one top-level composition.
///
/// Products are keyed by node pair only: the cached result is the product of
/// the unit-weight sub-diagrams, and the caller rescales it by the product of
/// the incoming edge weights. Sums depend on the weights and are keyed by
/// the full edges.
#[derive(Debug, Default)]
pub(crate) struct ComputeCache {
    matrix_vector: HashMap<(NodeId, NodeId), Edge>,
    matrix_matrix: HashMap<(NodeId, NodeId), Edge>,
    sums: HashMap<(Edge, Edge), Edge>,
}

impl ComputeCache {
    fn len(&self) -> usize {
        self.matrix_vector.len() + self.matrix_matrix.len() + self.sums.len()
    }
}

impl Package {
    /// Applies the operator diagram `gate` to the state diagram `state`.
    ///
    /// The result root is not renormalized; callers that need a unit-norm
    /// state follow up with [`Package::normalize`].
    pub fn apply(&mut self, gate: Edge, state: Edge) -> Edge {
        let mut cache = ComputeCache::default();
        let result = self.multiply_mv(gate, state, &mut cache);
        trace!(cached = cache.len(), result = %result, "apply");
        result
    }

    /// Operator product `a · b` (apply `b` first, then `a`).
    pub fn multiply(&mut self, a: Edge, b: Edge) -> Edge {
        let mut cache = ComputeCache::default();
        let result = self.multiply_mm(a, b, &mut cache);
        trace!(cached = cache.len(), result = %result, "multiply");
        result
    }

    /// Sum of two diagrams of the same kind and height.
    pub fn add(&mut self, a: Edge, b: Edge) -> Edge {
        let mut cache = ComputeCache::default();
        self.add_edges(a, b, &mut cache)
    }

    fn multiply_mv(&mut self, op: Edge, state: Edge, cache: &mut ComputeCache) -> Edge {
        if op.is_zero() || state.is_zero() {
            return Edge::zero();
        }
        let factor = self.complex.multiply(op.weight, state.weight);
        if op.is_terminal() {
            // A scalar operator just rescales the state.
            return state.with_weight(factor);
        }
        debug_assert!(!state.is_terminal(), "operator taller than state");
        if let Some(&cached) = cache.matrix_vector.get(&(op.node, state.node)) {
            return self.scale(cached, factor);
        }

        let op_node = self.nodes.node(op.node);
        let level = op_node.level();
        let m: [Edge; 4] = [op_node.edges()[0], op_node.edges()[1], op_node.edges()[2], op_node.edges()[3]];
        let state_node = self.nodes.node(state.node);
        debug_assert_eq!(level, state_node.level(), "operator and state out of step");
        let v: [Edge; 2] = [state_node.edges()[0], state_node.edges()[1]];

        let mut rows = [Edge::zero(); 2];
        for (row, slot) in rows.iter_mut().enumerate() {
            let left = self.multiply_mv(m[2 * row], v[0], cache);
            let right = self.multiply_mv(m[2 * row + 1], v[1], cache);
            *slot = self.add_edges(left, right, cache);
        }
        let result = self.make_vector_edge(level, rows);
        cache.matrix_vector.insert((op.node, state.node), result);
        self.scale(result, factor)
    }

    fn multiply_mm(&mut self, a: Edge, b: Edge, cache: &mut ComputeCache) -> Edge {
        if a.is_zero() || b.is_zero() {
            return Edge::zero();
        }
        let factor = self.complex.multiply(a.weight, b.weight);
        if a.is_terminal() {
            return b.with_weight(factor);
        }
        if b.is_terminal() {
            return a.with_weight(factor);
        }
        if let Some(&cached) = cache.matrix_matrix.get(&(a.node, b.node)) {
            return self.scale(cached, factor);
        }

        let a_node = self.nodes.node(a.node);
        let level = a_node.level();
        let x: [Edge; 4] = [a_node.edges()[0], a_node.edges()[1], a_node.edges()[2], a_node.edges()[3]];
        let b_node = self.nodes.node(b.node);
        debug_assert_eq!(level, b_node.level(), "operators out of step");
        let y: [Edge; 4] = [b_node.edges()[0], b_node.edges()[1], b_node.edges()[2], b_node.edges()[3]];

        let mut blocks = [Edge::zero(); 4];
        for (index, slot) in blocks.iter_mut().enumerate() {
            let (row, col) = (index / 2, index % 2);
            let first = self.multiply_mm(x[2 * row], y[col], cache);
            let second = self.multiply_mm(x[2 * row + 1], y[2 + col], cache);
            *slot = self.add_edges(first, second, cache);
        }
        let result = self.make_matrix_edge(level, blocks);
        cache.matrix_matrix.insert((a.node, b.node), result);
        self.scale(result, factor)
    }

    fn add_edges(&mut self, a: Edge, b: Edge, cache: &mut ComputeCache) -> Edge {
        if a.is_zero() {
            return b;
        }
        if b.is_zero() {
            return a;
        }
        if a.node == b.node {
            let weight = self.complex.add(a.weight, b.weight);
            return Edge::new(weight, a.node);
        }
        debug_assert!(!a.is_terminal() && !b.is_terminal(), "adding diagrams of different height");
        if let Some(&cached) = cache.sums.get(&(a, b)) {
            return cached;
        }

        let a_node = self.nodes.node(a.node);
        let level = a_node.level();
        let arity = a_node.arity();
        let mut left = [Edge::zero(); 4];
        left[..arity].copy_from_slice(a_node.edges());
        let b_node = self.nodes.node(b.node);
        debug_assert_eq!(arity, b_node.arity(), "adding a state to an operator");
        let mut right = [Edge::zero(); 4];
        right[..arity].copy_from_slice(b_node.edges());

        let mut sums = [Edge::zero(); 4];
        for i in 0..arity {
            let l = self.scale(left[i], a.weight);
            let r = self.scale(right[i], b.weight);
            sums[i] = self.add_edges(l, r, cache);
        }
        let result = if arity == 2 {
            self.make_vector_edge(level, [sums[0], sums[1]])
        } else {
            self.make_matrix_edge(level, sums)
        };
        cache.sums.insert((a, b), result);
        result
    }

    /// Conjugate transpose of an operator diagram.
    pub fn adjoint(&mut self, op: Edge) -> Edge {
        let mut cache = HashMap::new();
        self.adjoint_rec(op, &mut cache)
    }

    fn adjoint_rec(&mut self, op: Edge, cache: &mut HashMap<NodeId, Edge>) -> Edge {
        if op.is_zero() {
            return op;
        }
        let weight = self.complex.conj(op.weight);
        if op.is_terminal() {
            return op.with_weight(weight);
        }
        if let Some(&cached) = cache.get(&op.node) {
            return self.scale(cached, weight);
        }
        let node = self.nodes.node(op.node);
        let level = node.level();
        let m: [Edge; 4] = [node.edges()[0], node.edges()[2], node.edges()[1], node.edges()[3]];
        let mut blocks = [Edge::zero(); 4];
        for (slot, edge) in blocks.iter_mut().zip(m) {
            *slot = self.adjoint_rec(edge, cache);
        }
        let result = self.make_matrix_edge(level, blocks);
        cache.insert(op.node, result);
        self.scale(result, weight)
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Result;
    use crate::dd::{Matrix2, Package};
    use num_complex::Complex;
    use num_traits::{One, Zero};
    use std::f64::consts::FRAC_1_SQRT_2;

    const EPS: f64 = 1e-12;

    fn x() -> Matrix2 {
        let (o, l) = (Complex::zero(), Complex::one());
        [[o, l], [l, o]]
    }

    fn h() -> Matrix2 {
        let v = Complex::new(FRAC_1_SQRT_2, 0.0);
        [[v, v], [v, -v]]
    }

    #[test]
    fn bell_pair_probabilities() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let state = dd.basis_state(2);
        let hadamard = dd.gate_diagram(&h(), 0, &[], 2);
        let state = dd.apply(hadamard, state);
        let cnot = dd.gate_diagram(&x(), 1, &[0], 2);
        let state = dd.apply(cnot, state);

        assert!((dd.probability(state, 0b00) - 0.5).abs() < EPS);
        assert!((dd.probability(state, 0b11) - 0.5).abs() < EPS);
        assert!(dd.probability(state, 0b01) < EPS);
        assert!(dd.probability(state, 0b10) < EPS);
        Ok(())
    }

    #[test]
    fn control_below_target() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        // |q1 q0> = |10>, CNOT with control 1, target 0 -> |11>
        let state = dd.computational_basis_state(2, 0b10)?;
        let cnot = dd.gate_diagram(&x(), 0, &[1], 2);
        let state = dd.apply(cnot, state);
        assert!((dd.probability(state, 0b11) - 1.0).abs() < EPS);

        // Control not satisfied: identity.
        let state = dd.computational_basis_state(2, 0b00)?;
        let state = dd.apply(cnot, state);
        assert!((dd.probability(state, 0b00) - 1.0).abs() < EPS);
        Ok(())
    }

    #[test]
    fn toffoli_with_controls_on_both_sides() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let toffoli = dd.gate_diagram(&x(), 1, &[0, 2], 3);
        for index in 0..8u64 {
            let state = dd.computational_basis_state(3, index)?;
            let out = dd.apply(toffoli, state);
            let expected = if index & 0b101 == 0b101 { index ^ 0b010 } else { index };
            assert!(
                (dd.probability(out, expected) - 1.0).abs() < EPS,
                "input {:03b} expected {:03b}",
                index,
                expected
            );
        }
        Ok(())
    }

    #[test]
    fn x_times_x_is_the_identity_node() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let x1 = dd.gate_diagram(&x(), 1, &[], 3);
        let product = dd.multiply(x1, x1);
        let identity = dd.identity(3);
        assert_eq!(product, identity);
        Ok(())
    }

    #[test]
    fn multiply_matches_sequential_application() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let hadamard = dd.gate_diagram(&h(), 0, &[], 2);
        let cnot = dd.gate_diagram(&x(), 1, &[0], 2);
        let fused = dd.multiply(cnot, hadamard);

        let zero = dd.basis_state(2);
        let via_fused = dd.apply(fused, zero);
        let step = dd.apply(hadamard, zero);
        let via_steps = dd.apply(cnot, step);
        assert_eq!(via_fused.node, via_steps.node);
        assert!((dd.weight(via_fused) - dd.weight(via_steps)).norm() < EPS);
        Ok(())
    }

    #[test]
    fn adjoint_undoes_a_gate() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let s = {
            let (o, l) = (Complex::zero(), Complex::one());
            [[l, o], [o, Complex::i()]]
        };
        let gate = dd.gate_diagram(&s, 0, &[1], 2);
        let dagger = dd.adjoint(gate);
        let product = dd.multiply(dagger, gate);
        let identity = dd.identity(2);
        assert_eq!(product, identity);
        Ok(())
    }

    #[test]
    fn zero_edges_short_circuit() -> Result<()> {
        let mut dd = Package::new(EPS)?;
        let gate = dd.gate_diagram(&h(), 0, &[], 1);
        let zero = dd.zero();
        assert!(dd.apply(gate, zero).is_zero());
        let state = dd.basis_state(1);
        assert_eq!(dd.add(state, zero), state);
        Ok(())
    }
}
