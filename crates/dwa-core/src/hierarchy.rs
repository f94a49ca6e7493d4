//! The assembled metering tree for one sector.
//!
//! Flat parent/child records become a rooted tree held in a petgraph
//! `DiGraph` (parent → child edges), with each node annotated at attach
//! time with its depth and ancestor path. Traversal is always iterative
//! with an explicit stack; parent/child edges come from foreign keys and
//! cannot be trusted to be acyclic, so nothing here recurses natively.

use crate::{DwaError, DwaResult, MeterId, MeterKind, MeterRecord};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// One tree node: the raw record plus placement annotations assigned at
/// construction time.
#[derive(Debug, Clone)]
pub struct HierarchyNode {
    pub record: MeterRecord,
    /// Root = 0, incrementing per generation.
    pub level: u32,
    /// Ordered ancestor names ending with the node's own name.
    pub path: Vec<String>,
}

/// Rooted metering tree for one sector.
#[derive(Debug)]
pub struct MeterHierarchy {
    pub graph: DiGraph<HierarchyNode, ()>,
    root: NodeIndex,
    index: HashMap<MeterId, NodeIndex>,
}

impl MeterHierarchy {
    /// Start a hierarchy from its root record (level 0, path = [name]).
    pub fn new(root: MeterRecord) -> Self {
        let mut graph = DiGraph::new();
        let path = vec![root.name.clone()];
        let id = root.id;
        let root_idx = graph.add_node(HierarchyNode {
            record: root,
            level: 0,
            path,
        });
        let mut index = HashMap::new();
        index.insert(id, root_idx);
        Self {
            graph,
            root: root_idx,
            index,
        }
    }

    /// Attach a record under an existing parent, deriving level and path.
    ///
    /// A record whose id is already present would close a cycle through the
    /// parent/child foreign keys, so the attach fails with
    /// [`DwaError::StructuralCycle`].
    pub fn attach(&mut self, parent: NodeIndex, record: MeterRecord) -> DwaResult<NodeIndex> {
        if self.index.contains_key(&record.id) {
            return Err(DwaError::StructuralCycle(record.id));
        }
        let (level, mut path) = {
            let parent_node = &self.graph[parent];
            (parent_node.level + 1, parent_node.path.clone())
        };
        path.push(record.name.clone());
        let id = record.id;
        let idx = self.graph.add_node(HierarchyNode {
            record,
            level,
            path,
        });
        self.graph.add_edge(parent, idx, ());
        self.index.insert(id, idx);
        Ok(idx)
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn root_node(&self) -> &HierarchyNode {
        &self.graph[self.root]
    }

    pub fn node(&self, idx: NodeIndex) -> &HierarchyNode {
        &self.graph[idx]
    }

    /// Look up a node by meter id.
    pub fn get(&self, id: MeterId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Direct children in insertion order (deterministic for a given
    /// snapshot, which keeps repeated runs bit-identical).
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        out.reverse();
        out
    }

    pub fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Name of the nearest ancestor of the given kind, walking parent
    /// edges upward.
    pub fn ancestor_name_of_kind(&self, idx: NodeIndex, kind: MeterKind) -> Option<String> {
        let mut current = self.parent_of(idx);
        while let Some(up) = current {
            let node = self.node(up);
            if node.record.kind == kind {
                return Some(node.record.name.clone());
            }
            current = self.parent_of(up);
        }
        None
    }

    /// Children-before-parent ordering via an explicit stack (reversed
    /// pre-order, valid post-order for a tree).
    pub fn post_order(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            stack.extend(self.children(idx));
        }
        out.reverse();
        out
    }

    /// All node indices in pre-order (parent before children).
    pub fn pre_order(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.graph.node_count());
        let mut stack = vec![self.root];
        while let Some(idx) = stack.pop() {
            out.push(idx);
            let mut kids = self.children(idx);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Count of nodes per kind.
    pub fn counts_by_kind(&self) -> HashMap<MeterKind, usize> {
        let mut counts = HashMap::new();
        for node in self.graph.node_weights() {
            *counts.entry(node.record.kind).or_insert(0) += 1;
        }
        counts
    }

    /// Sum of own withdrawal over every customer node in the tree,
    /// regardless of depth. The end-to-end counterpart to the root's own
    /// reading.
    pub fn customer_withdrawal_total(&self) -> f64 {
        self.graph
            .node_weights()
            .filter(|n| n.record.kind == MeterKind::Customer)
            .map(|n| n.record.withdrawal())
            .sum()
    }
}
