//! Mutable image arrays of one search execution.

use std::collections::HashSet;

use gramatch_common::{
    ConditionId, Config, EdgeId, HostGraph, LabelId, NodeId, NodeImage, PEdgeId, PNodeId, PVarId,
    Pattern,
};

use crate::error::SearchError;
use crate::item::NodeCheck;
use crate::matches::TreeMatch;

/// Images of pattern elements, indexed by their dense ids.
pub(crate) struct State<'g> {
    pub(crate) host: &'g HostGraph,
    pub(crate) pattern: &'g Pattern,
    pub(crate) config: &'g Config,
    nodes: Vec<Option<NodeImage>>,
    edges: Vec<Option<EdgeId>>,
    vars: Vec<Option<LabelId>>,
    slots: Vec<Option<TreeMatch>>,
    // Host nodes currently used as images, value nodes excluded.
    used: HashSet<NodeId>,
    // Seeds stay out of `used`, so fresh nodes may reuse their images.
    shared_seeds: bool,
}

impl<'g> State<'g> {
    pub(crate) fn new(host: &'g HostGraph, pattern: &'g Pattern, config: &'g Config) -> Self {
        State {
            host,
            pattern,
            config,
            nodes: vec![None; pattern.node_count()],
            edges: vec![None; pattern.edge_count()],
            vars: vec![None; pattern.var_count()],
            slots: vec![None; pattern.condition_count()],
            used: HashSet::new(),
            shared_seeds: false,
        }
    }

    /// Let fresh nodes take the images of seeded nodes.
    pub(crate) fn share_seeds(&mut self) {
        self.shared_seeds = true;
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.fill(None);
        self.edges.fill(None);
        self.vars.fill(None);
        self.slots.fill(None);
        self.used.clear();
    }

    pub(crate) fn node(&self, node: PNodeId) -> Option<&NodeImage> {
        self.nodes[node.index()].as_ref()
    }

    /// The image of a node an item was activated to find already bound.
    pub(crate) fn found_node(&self, node: PNodeId) -> Result<&NodeImage, SearchError> {
        self.node(node)
            .ok_or_else(|| SearchError::invariant(format!("node {node} is expected to be bound")))
    }

    pub(crate) fn edge(&self, edge: PEdgeId) -> Option<EdgeId> {
        self.edges[edge.index()]
    }

    pub(crate) fn var(&self, var: PVarId) -> Option<LabelId> {
        self.vars[var.index()]
    }

    pub(crate) fn found_var(&self, var: PVarId) -> Result<LabelId, SearchError> {
        self.var(var)
            .ok_or_else(|| SearchError::invariant(format!("variable {var} is expected to be bound")))
    }

    pub(crate) fn slot(&self, condition: ConditionId) -> Option<&TreeMatch> {
        self.slots[condition.index()].as_ref()
    }

    fn injective_image(&self, image: &NodeImage) -> Option<NodeId> {
        match image {
            NodeImage::Node(n) if self.config.injective && self.host.value(*n).is_none() => Some(*n),
            _ => None,
        }
    }

    /// Bind an unbound node. Fails without side effects on an injectivity clash.
    #[contracts::debug_requires(self.nodes[node.index()].is_none())]
    pub(crate) fn bind_node(&mut self, node: PNodeId, image: NodeImage) -> Result<bool, SearchError> {
        if self.config.check_invariants && !self.host.contains_image(&image) {
            return Err(SearchError::invariant(format!(
                "image {image} of {node} is not in the host graph"
            )));
        }
        if let Some(n) = self.injective_image(&image) {
            if !self.used.insert(n) {
                return Ok(false);
            }
        }
        self.nodes[node.index()] = Some(image);
        Ok(true)
    }

    #[contracts::debug_ensures(self.nodes[node.index()].is_none())]
    pub(crate) fn unbind_node(&mut self, node: PNodeId) {
        if let Some(image) = self.nodes[node.index()].take() {
            if let Some(n) = self.injective_image(&image) {
                self.used.remove(&n);
            }
        }
    }

    /// Bind `node` to `image` if it is unbound, or check the existing image otherwise.
    pub(crate) fn bind_or_check(
        &mut self,
        node: PNodeId,
        image: NodeImage,
        found: bool,
        check: &NodeCheck,
    ) -> Result<bool, SearchError> {
        if found {
            Ok(self.found_node(node)? == &image)
        } else if !check.admits(self.host, &image) {
            Ok(false)
        } else {
            self.bind_node(node, image)
        }
    }

    pub(crate) fn bind_edge(&mut self, edge: PEdgeId, image: EdgeId) -> Result<(), SearchError> {
        if self.config.check_invariants && !self.host.contains_edge(image) {
            return Err(SearchError::invariant(format!(
                "image #{} of {edge} is not in the host graph",
                image.0
            )));
        }
        self.edges[edge.index()] = Some(image);
        Ok(())
    }

    pub(crate) fn unbind_edge(&mut self, edge: PEdgeId) {
        self.edges[edge.index()] = None;
    }

    pub(crate) fn bind_var(&mut self, var: PVarId, label: LabelId) {
        self.vars[var.index()] = Some(label);
    }

    pub(crate) fn unbind_var(&mut self, var: PVarId) {
        self.vars[var.index()] = None;
    }

    pub(crate) fn set_slot(&mut self, condition: ConditionId, result: TreeMatch) {
        self.slots[condition.index()] = Some(result);
    }

    pub(crate) fn clear_slot(&mut self, condition: ConditionId) {
        self.slots[condition.index()] = None;
    }

    /// Install a seed image. Seeds may share images; the seed item rejects
    /// such clashes when matching is injective.
    pub(crate) fn seed_node(&mut self, node: PNodeId, image: NodeImage) {
        if let (false, Some(n)) = (self.shared_seeds, self.injective_image(&image)) {
            self.used.insert(n);
        }
        self.nodes[node.index()] = Some(image);
    }

    pub(crate) fn seed_edge(&mut self, edge: PEdgeId, image: EdgeId) {
        self.edges[edge.index()] = Some(image);
    }

    pub(crate) fn seed_var(&mut self, var: PVarId, label: LabelId) {
        self.vars[var.index()] = Some(label);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use gramatch_common::TypeGraph;
    use rstest::rstest;

    use super::*;

    /// One host node; the pattern `x -r-> y`.
    fn fixture() -> (HostGraph, Arc<Pattern>) {
        let mut tb = TypeGraph::builder();
        tb.node_type("T");
        tb.edge_label("r");
        let types = Arc::new(tb.build().unwrap());

        let mut hb = HostGraph::builder(types.clone());
        hb.node("T").unwrap();
        let host = hb.build();

        let mut b = Pattern::builder(types);
        let root = b.root();
        let x = b.node(root, "x", "T").unwrap();
        let y = b.node(root, "y", "T").unwrap();
        b.edge(root, x, "r", y).unwrap();
        (host, b.build().unwrap())
    }

    #[test]
    fn foreign_images_are_invariant_violations() {
        let (host, pattern) = fixture();
        let config = Config::builder().check_invariants(true).build();
        let mut state = State::new(&host, &pattern, &config);

        assert!(matches!(
            state.bind_node(PNodeId(0), NodeImage::Node(NodeId(7))),
            Err(SearchError::Invariant(_))
        ));
        assert!(matches!(
            state.bind_edge(PEdgeId(0), EdgeId(3)),
            Err(SearchError::Invariant(_))
        ));
        assert!(matches!(state.found_node(PNodeId(1)), Err(SearchError::Invariant(_))));
        assert!(state.node(PNodeId(0)).is_none());
    }

    #[rstest]
    #[case::exclusive(false, false)]
    #[case::shared(true, true)]
    fn fresh_nodes_reuse_only_shared_seeds(#[case] shared: bool, #[case] expected: bool) {
        let (host, pattern) = fixture();
        let config = Config::default();
        let mut state = State::new(&host, &pattern, &config);
        if shared {
            state.share_seeds();
        }
        state.seed_node(PNodeId(0), NodeImage::Node(NodeId(0)));
        assert_eq!(state.bind_node(PNodeId(1), NodeImage::Node(NodeId(0))).unwrap(), expected);
    }
}
