// src/dd/measurement.rs

//! Measurement on state diagrams: outcome probabilities, collapse and
//! full-register sampling.
//!
//! Vector nodes carry unit-norm child weights, so the probability of taking
//! a branch is the squared magnitude of its weight and no subtree norms have
//! to be recomputed.

use super::edge::{Edge, NodeId};
use super::package::Package;
use std::collections::HashMap;

impl Package {
    /// Probability that measuring `qubit` yields 1, conditioned on the
    /// current (unit-norm) state.
    pub fn probability_of_one(&self, state: Edge, qubit: usize) -> f64 {
        if state.is_zero() {
            return 0.0;
        }
        let mut memo = HashMap::new();
        self.probability_of_one_rec(state.node, qubit, &mut memo).clamp(0.0, 1.0)
    }

    fn probability_of_one_rec(&self, node: NodeId, qubit: usize, memo: &mut HashMap<NodeId, f64>) -> f64 {
        if node.is_terminal() {
            return 0.0;
        }
        if let Some(&p) = memo.get(&node) {
            return p;
        }
        let current = self.nodes.node(node);
        let edges = [current.edges()[0], current.edges()[1]];
        let p = if current.level() == qubit {
            self.complex.magnitude_sqr(edges[1].weight)
        } else {
            edges
                .iter()
                .filter(|e| !e.is_zero())
                .map(|e| self.complex.magnitude_sqr(e.weight) * self.probability_of_one_rec(e.node, qubit, memo))
                .sum()
        };
        memo.insert(node, p);
        p
    }

    /// Projects `state` onto `qubit = outcome` and renormalizes.
    ///
    /// The projection is an ordinary gate application, so branches
    /// inconsistent with the outcome become zero edges first; the root weight
    /// is rescaled afterwards.
    pub fn collapse(&mut self, state: Edge, qubit: usize, outcome: bool, n: usize) -> Edge {
        let projector = self.projector(qubit, outcome, n);
        let projected = self.apply(projector, state);
        self.normalize(projected)
    }

    /// Samples one qubit and collapses the state onto the outcome.
    ///
    /// `draw` must return uniform values in `[0, 1)`. Outcome 0 owns the
    /// interval `[0, p0)` and outcome 1 owns `[p0, 1)`.
    pub fn measure_qubit(
        &mut self,
        state: Edge,
        qubit: usize,
        n: usize,
        draw: &mut dyn FnMut() -> f64,
    ) -> (bool, Edge) {
        let tolerance = self.complex.tolerance();
        let p1 = self.probability_of_one(state, qubit);
        let outcome = if p1 <= tolerance {
            false
        } else if p1 >= 1.0 - tolerance {
            true
        } else {
            draw() >= 1.0 - p1
        };
        (outcome, self.collapse(state, qubit, outcome, n))
    }

    /// Samples every qubit at once by descending from the root, choosing each
    /// branch with probability `|w|²`. Returns the sampled basis index; bit
    /// `q` holds the value of qubit `q`.
    pub fn sample_all(&self, state: Edge, draw: &mut dyn FnMut() -> f64) -> u64 {
        let mut index = 0u64;
        if state.is_zero() {
            return index;
        }
        let mut node = state.node;
        while !node.is_terminal() {
            let current = self.nodes.node(node);
            let [zero, one] = [current.edges()[0], current.edges()[1]];
            let p0 = self.complex.magnitude_sqr(zero.weight);
            let p1 = self.complex.magnitude_sqr(one.weight);
            let take_one = if zero.is_zero() {
                true
            } else if one.is_zero() {
                false
            } else {
                draw() * (p0 + p1) >= p0
            };
            if take_one {
                index |= 1 << current.level();
                node = one.node;
            } else {
                node = zero.node;
            }
        }
        index
    }
}
