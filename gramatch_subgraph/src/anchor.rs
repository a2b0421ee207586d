//! Pre-matched pattern elements: the anchor a plan is compiled for, and the
//! seed map that supplies their host images at search time.

use std::collections::BTreeMap;

use gramatch_common::{Condition, EdgeId, LabelId, NodeImage, PEdgeId, PNodeId, PVarId};

/// The set of pattern elements whose images are known before the search starts.
///
/// Kept sorted, so two anchors over the same elements compare and hash equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Anchor {
    nodes: Vec<PNodeId>,
    edges: Vec<PEdgeId>,
    vars: Vec<PVarId>,
}

impl Anchor {
    /// An anchor over the given elements.
    pub fn new(
        nodes: impl IntoIterator<Item = PNodeId>,
        edges: impl IntoIterator<Item = PEdgeId>,
        vars: impl IntoIterator<Item = PVarId>,
    ) -> Self {
        let mut anchor = Self {
            nodes: nodes.into_iter().collect(),
            edges: edges.into_iter().collect(),
            vars: vars.into_iter().collect(),
        };
        anchor.nodes.sort_unstable();
        anchor.nodes.dedup();
        anchor.edges.sort_unstable();
        anchor.edges.dedup();
        anchor.vars.sort_unstable();
        anchor.vars.dedup();
        anchor
    }

    /// The empty anchor.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The anchor of a sub-condition: its root nodes and variables.
    pub fn roots(condition: &Condition) -> Self {
        Self::new(
            condition.root_nodes.iter().copied(),
            [],
            condition.root_vars.iter().copied(),
        )
    }

    /// Whether nothing is anchored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.vars.is_empty()
    }

    /// Anchored nodes, sorted.
    pub fn nodes(&self) -> &[PNodeId] {
        &self.nodes
    }

    /// Anchored edges, sorted.
    pub fn edges(&self) -> &[PEdgeId] {
        &self.edges
    }

    /// Anchored variables, sorted.
    pub fn vars(&self) -> &[PVarId] {
        &self.vars
    }

    /// Whether `node` is anchored.
    pub fn contains_node(&self, node: PNodeId) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }

    /// Whether `edge` is anchored.
    pub fn contains_edge(&self, edge: PEdgeId) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    /// Whether `var` is anchored.
    pub fn contains_var(&self, var: PVarId) -> bool {
        self.vars.binary_search(&var).is_ok()
    }
}

/// Host images for anchored pattern elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedMap {
    nodes: BTreeMap<PNodeId, NodeImage>,
    edges: BTreeMap<PEdgeId, EdgeId>,
    vars: BTreeMap<PVarId, LabelId>,
}

impl SeedMap {
    /// An empty seed map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a node image.
    pub fn with_node(mut self, node: PNodeId, image: NodeImage) -> Self {
        self.nodes.insert(node, image);
        self
    }

    /// Seed an edge image.
    pub fn with_edge(mut self, edge: PEdgeId, image: EdgeId) -> Self {
        self.edges.insert(edge, image);
        self
    }

    /// Seed a variable.
    pub fn with_var(mut self, var: PVarId, label: LabelId) -> Self {
        self.vars.insert(var, label);
        self
    }

    /// Seed a node image in place.
    pub fn insert_node(&mut self, node: PNodeId, image: NodeImage) {
        self.nodes.insert(node, image);
    }

    /// Seed a variable in place.
    pub fn insert_var(&mut self, var: PVarId, label: LabelId) {
        self.vars.insert(var, label);
    }

    /// Drop all seeds, keeping allocations.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.vars.clear();
    }

    /// Seeded node image.
    pub fn node(&self, node: PNodeId) -> Option<&NodeImage> {
        self.nodes.get(&node)
    }

    /// Seeded edge image.
    pub fn edge(&self, edge: PEdgeId) -> Option<EdgeId> {
        self.edges.get(&edge).copied()
    }

    /// Seeded variable.
    pub fn var(&self, var: PVarId) -> Option<LabelId> {
        self.vars.get(&var).copied()
    }

    /// Seeded nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = (PNodeId, &NodeImage)> {
        self.nodes.iter().map(|(k, v)| (*k, v))
    }

    /// Seeded edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (PEdgeId, EdgeId)> + '_ {
        self.edges.iter().map(|(k, v)| (*k, *v))
    }

    /// Seeded variables in id order.
    pub fn vars(&self) -> impl Iterator<Item = (PVarId, LabelId)> + '_ {
        self.vars.iter().map(|(k, v)| (*k, *v))
    }

    /// The anchor these seeds cover.
    pub fn anchor(&self) -> Anchor {
        Anchor::new(
            self.nodes.keys().copied(),
            self.edges.keys().copied(),
            self.vars.keys().copied(),
        )
    }
}
