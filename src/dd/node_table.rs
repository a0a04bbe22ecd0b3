// src/dd/node_table.rs

//! Unique table and reference-counting garbage collector for diagram nodes.

use super::edge::{Edge, NodeId};
use std::collections::HashMap;
use tracing::trace;

/// Level value carried by the terminal node.
pub const TERMINAL_LEVEL: usize = usize::MAX;
/// Level value carried by a freed arena slot.
const FREE_LEVEL: usize = usize::MAX - 1;

/// An immutable decision-diagram node.
///
/// Arity 2 nodes belong to state vectors (`[|0>, |1>]` branches), arity 4
/// nodes to operators (row-major `[00, 01, 10, 11]` blocks).
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    level: usize,
    edges: Box<[Edge]>,
    ref_count: u32,
}

impl Node {
    /// Variable level (qubit index); [`TERMINAL_LEVEL`] for the terminal.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Outgoing edges in branch order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of outgoing edges.
    pub fn arity(&self) -> usize {
        self.edges.len()
    }

    /// Parents plus external roots currently holding this node.
    pub fn ref_count(&self) -> u32 {
        self.ref_count
    }

    fn is_free(&self) -> bool {
        self.level == FREE_LEVEL
    }
}

/// Hash-consed node store, partitioned by level.
///
/// Nodes live in an arena addressed by [`NodeId`]; freed slots are reused.
/// A node's reference count is the number of parent edges pointing at it plus
/// the number of external roots registered with [`NodeTable::incref`].
/// Dropping the count to zero frees the node immediately and cascades to its
/// children. The terminal (slot 0) is never counted or freed.
#[derive(Debug, Clone)]
pub struct NodeTable {
    nodes: Vec<Node>,
    free_slots: Vec<NodeId>,
    levels: Vec<HashMap<Box<[Edge]>, NodeId>>,
    /// Nodes created since the last `collect_unreferenced`.
    fresh: Vec<NodeId>,
    live: usize,
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeTable {
    /// Creates a table holding only the terminal.
    pub fn new() -> Self {
        let terminal = Node {
            level: TERMINAL_LEVEL,
            edges: Box::new([]),
            ref_count: 0,
        };
        Self {
            nodes: vec![terminal],
            free_slots: Vec::new(),
            levels: Vec::new(),
            fresh: Vec::new(),
            live: 0,
        }
    }

    /// Returns the unique node for `(level, edges)`, creating it with
    /// reference count 0 if it does not exist yet.
    pub fn make_node(&mut self, level: usize, edges: &[Edge]) -> NodeId {
        debug_assert!(edges.len() == 2 || edges.len() == 4, "unsupported arity {}", edges.len());
        if self.levels.len() <= level {
            self.levels.resize_with(level + 1, HashMap::new);
        }
        if let Some(&id) = self.levels[level].get(edges) {
            return id;
        }

        for edge in edges {
            debug_assert!(
                edge.is_terminal() || self.nodes[edge.node.index()].level == level + 1,
                "edge from level {} skips to {}",
                level,
                self.nodes[edge.node.index()].level
            );
            self.incref(edge.node);
        }

        let node = Node {
            level,
            edges: edges.into(),
            ref_count: 0,
        };
        let id = match self.free_slots.pop() {
            Some(id) => {
                self.nodes[id.index()] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId((self.nodes.len() - 1) as u32)
            }
        };
        self.levels[level].insert(edges.into(), id);
        self.fresh.push(id);
        self.live += 1;
        id
    }

    /// Read access to a live node.
    pub fn node(&self, id: NodeId) -> &Node {
        let node = &self.nodes[id.index()];
        debug_assert!(!node.is_free(), "access to freed node {}", id);
        node
    }

    /// Whether `id` currently names a live node (or the terminal).
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| !n.is_free())
    }

    /// Reference count of a node.
    pub fn ref_count(&self, id: NodeId) -> u32 {
        self.node(id).ref_count
    }

    /// Adds one reference to `id`.
    pub fn incref(&mut self, id: NodeId) {
        if id.is_terminal() {
            return;
        }
        let node = &mut self.nodes[id.index()];
        node.ref_count = node.ref_count.saturating_add(1);
    }

    /// Removes one reference from `id`, freeing it and cascading to its
    /// children when the count reaches zero.
    pub fn decref(&mut self, id: NodeId) {
        debug_assert!(
            id.is_terminal() || self.nodes[id.index()].ref_count > 0,
            "decref of unreferenced node {}",
            id
        );
        let mut pending = Vec::new();
        self.decref_one(id, &mut pending);
        while let Some(child) = pending.pop() {
            self.decref_one(child, &mut pending);
        }
    }

    /// Frees every node created since the previous call that is still
    /// unreferenced. Composition leaves such orphans behind (intermediate
    /// sums and products that did not make it into the result); callers must
    /// have registered every diagram they keep with `incref` first.
    pub fn collect_unreferenced(&mut self) -> usize {
        let before = self.live;
        let fresh = std::mem::take(&mut self.fresh);
        let mut pending = Vec::new();
        // Newest first: parents go before the children they keep alive.
        for id in fresh.into_iter().rev() {
            let node = &self.nodes[id.index()];
            if node.is_free() || node.ref_count != 0 {
                continue;
            }
            self.free(id, &mut pending);
            while let Some(child) = pending.pop() {
                self.decref_one(child, &mut pending);
            }
        }
        let freed = before - self.live;
        if freed > 0 {
            trace!(freed, live = self.live, "collected unreferenced nodes");
        }
        freed
    }

    /// Total live nodes across all levels, terminal excluded.
    pub fn live_count(&self) -> usize {
        self.live
    }

    /// Live nodes at one level.
    pub fn level_count(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, HashMap::len)
    }

    fn decref_one(&mut self, id: NodeId, pending: &mut Vec<NodeId>) {
        if id.is_terminal() {
            return;
        }
        let node = &mut self.nodes[id.index()];
        if node.is_free() || node.ref_count == 0 {
            return;
        }
        node.ref_count -= 1;
        if node.ref_count == 0 {
            self.free(id, pending);
        }
    }

    /// Releases the slot and queues the children for a decrement.
    fn free(&mut self, id: NodeId, pending: &mut Vec<NodeId>) {
        let node = std::mem::replace(
            &mut self.nodes[id.index()],
            Node {
                level: FREE_LEVEL,
                edges: Box::new([]),
                ref_count: 0,
            },
        );
        if let Some(level) = self.levels.get_mut(node.level) {
            level.remove(&node.edges);
        }
        pending.extend(node.edges.iter().map(|e| e.node));
        self.free_slots.push(id);
        self.live -= 1;
    }
}
