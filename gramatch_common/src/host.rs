//! Host graph: the read-only, indexed graph that patterns are matched against.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::algebra::Value;
use crate::error::GraphError;
use crate::types::{LabelId, LabelKind, TypeGraph};

/// Dense identifier of a host node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Dense identifier of a host edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl NodeId {
    /// Position in the host node table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    /// Position in the host edge table.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// The image of a pattern node.
///
/// Values that occur in the host graph are always represented by their host
/// node; `Value` is only used for computed values without a host node. Use
/// [`HostGraph::image_of_value`] to obtain the canonical image of a value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeImage {
    /// A host node.
    Node(NodeId),
    /// A data value absent from the host graph.
    Value(Value),
}

impl fmt::Display for NodeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeImage::Node(n) => write!(f, "n{}", n.0),
            NodeImage::Value(v) => write!(f, "{v}"),
        }
    }
}

/// A binary, labelled host edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HostEdge {
    /// Source node.
    pub source: NodeId,
    /// Edge label.
    pub label: LabelId,
    /// Target node.
    pub target: NodeId,
}

#[derive(Clone, Debug)]
struct HostNode {
    ty: LabelId,
    value: Option<Value>,
}

/// Indexed, immutable host graph.
#[derive(Clone, Debug)]
pub struct HostGraph {
    types: Arc<TypeGraph>,
    nodes: Vec<HostNode>,
    edges: Vec<HostEdge>,
    out_edges: Vec<Vec<EdgeId>>,
    in_edges: Vec<Vec<EdgeId>>,
    by_label: Vec<Vec<EdgeId>>,
    by_type: Vec<Vec<NodeId>>,
    values: HashMap<Value, NodeId>,
    triples: HashMap<(NodeId, LabelId, NodeId), Vec<EdgeId>>,
    simple: bool,
}

const NO_EDGES: &[EdgeId] = &[];
const NO_NODES: &[NodeId] = &[];

impl HostGraph {
    /// Start building a host graph over `types`.
    pub fn builder(types: Arc<TypeGraph>) -> HostGraphBuilder {
        HostGraphBuilder::new(types)
    }

    /// The type graph this host graph is typed by.
    pub fn types(&self) -> &Arc<TypeGraph> {
        &self.types
    }

    /// Number of nodes, value nodes included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// All node ids in creation order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len() as u32).map(NodeId)
    }

    /// Whether no two edges share source, label and target.
    pub const fn is_simple(&self) -> bool {
        self.simple
    }

    /// Endpoints and label of an edge.
    #[contracts::debug_requires(self.contains_edge(id))]
    pub fn edge(&self, id: EdgeId) -> &HostEdge {
        &self.edges[id.index()]
    }

    /// Whether `id` denotes an edge of this graph.
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        id.index() < self.edges.len()
    }

    /// Whether `image` denotes a node of this graph or a well-formed computed value.
    pub fn contains_image(&self, image: &NodeImage) -> bool {
        match image {
            NodeImage::Node(n) => n.index() < self.nodes.len(),
            NodeImage::Value(v) => !self.values.contains_key(v),
        }
    }

    /// Type of a host node.
    #[contracts::debug_requires(id.index() < self.nodes.len())]
    pub fn node_type(&self, id: NodeId) -> LabelId {
        self.nodes[id.index()].ty
    }

    /// Value carried by a host node, if it is a value node.
    pub fn value(&self, id: NodeId) -> Option<&Value> {
        self.nodes[id.index()].value.as_ref()
    }

    /// Type of a node image; computed values carry their sort type.
    pub fn image_type(&self, image: &NodeImage) -> LabelId {
        match image {
            NodeImage::Node(n) => self.node_type(*n),
            NodeImage::Value(v) => self.types.sort_type(v.sort()),
        }
    }

    /// Value of a node image, if it is a value.
    pub fn image_value<'a>(&'a self, image: &'a NodeImage) -> Option<&'a Value> {
        match image {
            NodeImage::Node(n) => self.value(*n),
            NodeImage::Value(v) => Some(v),
        }
    }

    /// Canonical image of a value: its host node if present, the value otherwise.
    pub fn image_of_value(&self, value: Value) -> NodeImage {
        match self.values.get(&value) {
            Some(&n) => NodeImage::Node(n),
            None => NodeImage::Value(value),
        }
    }

    /// Outgoing edges of a node image.
    pub fn out_edges(&self, image: &NodeImage) -> &[EdgeId] {
        match image {
            NodeImage::Node(n) => &self.out_edges[n.index()],
            NodeImage::Value(_) => NO_EDGES,
        }
    }

    /// Incoming edges of a node image.
    pub fn in_edges(&self, image: &NodeImage) -> &[EdgeId] {
        match image {
            NodeImage::Node(n) => &self.in_edges[n.index()],
            NodeImage::Value(_) => NO_EDGES,
        }
    }

    /// All edges with a given label.
    pub fn edges_with_label(&self, label: LabelId) -> &[EdgeId] {
        self.by_label.get(label.index()).map_or(NO_EDGES, Vec::as_slice)
    }

    /// All nodes of exactly the given type.
    pub fn nodes_of_type(&self, ty: LabelId) -> &[NodeId] {
        self.by_type.get(ty.index()).map_or(NO_NODES, Vec::as_slice)
    }

    /// Edges from `source` to `target` with `label`.
    pub fn edges_between(&self, source: &NodeImage, label: LabelId, target: &NodeImage) -> &[EdgeId] {
        let (NodeImage::Node(s), NodeImage::Node(t)) = (source, target) else {
            return NO_EDGES;
        };
        self.triples.get(&(*s, label, *t)).map_or(NO_EDGES, Vec::as_slice)
    }
}

impl fmt::Display for HostGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HostGraph({} nodes, {} edges{})",
            self.nodes.len(),
            self.edges.len(),
            if self.simple { "" } else { ", multigraph" }
        )
    }
}

/// Builder for a [`HostGraph`].
#[derive(Debug)]
pub struct HostGraphBuilder {
    types: Arc<TypeGraph>,
    nodes: Vec<HostNode>,
    edges: Vec<HostEdge>,
    values: HashMap<Value, NodeId>,
    triples: HashMap<(NodeId, LabelId, NodeId), Vec<EdgeId>>,
    multigraph: bool,
}

impl HostGraphBuilder {
    fn new(types: Arc<TypeGraph>) -> Self {
        Self {
            types,
            nodes: Vec::new(),
            edges: Vec::new(),
            values: HashMap::new(),
            triples: HashMap::new(),
            multigraph: false,
        }
    }

    /// Keep parallel edges with equal labels instead of folding them.
    pub fn multigraph(mut self) -> Self {
        self.multigraph = true;
        self
    }

    /// Add a node of the given type.
    pub fn add_node(&mut self, ty: LabelId) -> Result<NodeId, GraphError> {
        if ty.index() >= self.types.label_count() || self.types.kind(ty) != LabelKind::NodeType {
            return Err(GraphError::NotANodeType(ty));
        }
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(HostNode { ty, value: None });
        Ok(id)
    }

    /// Add a node whose type is given by name.
    pub fn node(&mut self, ty: &str) -> Result<NodeId, GraphError> {
        let ty = self
            .types
            .node_type(ty)
            .ok_or_else(|| GraphError::UnknownLabel(ty.to_owned()))?;
        self.add_node(ty)
    }

    /// The value node for `value`, created on first use.
    pub fn value_node(&mut self, value: Value) -> NodeId {
        if let Some(&id) = self.values.get(&value) {
            return id;
        }
        let id = NodeId(self.nodes.len() as u32);
        let ty = self.types.sort_type(value.sort());
        self.nodes.push(HostNode {
            ty,
            value: Some(value.clone()),
        });
        self.values.insert(value, id);
        id
    }

    /// Add an edge. In a simple graph an existing equal edge is returned instead.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        label: LabelId,
        target: NodeId,
    ) -> Result<EdgeId, GraphError> {
        for n in [source, target] {
            if n.index() >= self.nodes.len() {
                return Err(GraphError::UnknownNode(n));
            }
        }
        if label.index() >= self.types.label_count() || self.types.kind(label) != LabelKind::EdgeLabel {
            return Err(GraphError::NotAnEdgeLabel(label));
        }
        let parallel = self.triples.entry((source, label, target)).or_default();
        if !self.multigraph {
            if let Some(&existing) = parallel.first() {
                return Ok(existing);
            }
        }
        let id = EdgeId(self.edges.len() as u32);
        parallel.push(id);
        self.edges.push(HostEdge {
            source,
            label,
            target,
        });
        Ok(id)
    }

    /// Add an edge whose label is given by name.
    pub fn edge(&mut self, source: NodeId, label: &str, target: NodeId) -> Result<EdgeId, GraphError> {
        let label = self
            .types
            .edge_label(label)
            .ok_or_else(|| GraphError::UnknownLabel(label.to_owned()))?;
        self.add_edge(source, label, target)
    }

    /// Freeze the graph and build its indexes.
    pub fn build(self) -> HostGraph {
        let node_count = self.nodes.len();
        let label_count = self.types.label_count();
        let mut out_edges = vec![Vec::new(); node_count];
        let mut in_edges = vec![Vec::new(); node_count];
        let mut by_label = vec![Vec::new(); label_count];
        let mut by_type = vec![Vec::new(); label_count];

        for (ix, edge) in self.edges.iter().enumerate() {
            let id = EdgeId(ix as u32);
            out_edges[edge.source.index()].push(id);
            in_edges[edge.target.index()].push(id);
            by_label[edge.label.index()].push(id);
        }
        for (ix, node) in self.nodes.iter().enumerate() {
            by_type[node.ty.index()].push(NodeId(ix as u32));
        }
        let simple = self.triples.values().all(|parallel| parallel.len() <= 1);

        tracing::debug!(
            "built host graph: {} nodes, {} edges, simple: {}",
            node_count,
            self.edges.len(),
            simple
        );

        HostGraph {
            types: self.types,
            nodes: self.nodes,
            edges: self.edges,
            out_edges,
            in_edges,
            by_label,
            by_type,
            values: self.values,
            triples: self.triples,
            simple,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Arc<TypeGraph> {
        let mut b = TypeGraph::builder();
        b.node_type("T");
        b.edge_label("r");
        Arc::new(b.build().unwrap())
    }

    #[test]
    fn simple_graphs_fold_parallel_edges() {
        let mut b = HostGraph::builder(types());
        let a = b.node("T").unwrap();
        let c = b.node("T").unwrap();
        let e1 = b.edge(a, "r", c).unwrap();
        let e2 = b.edge(a, "r", c).unwrap();
        assert_eq!(e1, e2);
        let g = b.build();
        assert!(g.is_simple());
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn multigraphs_keep_parallel_edges() {
        let mut b = HostGraph::builder(types()).multigraph();
        let a = b.node("T").unwrap();
        let c = b.node("T").unwrap();
        b.edge(a, "r", c).unwrap();
        b.edge(a, "r", c).unwrap();
        let g = b.build();
        assert!(!g.is_simple());
        let r = g.types().edge_label("r").unwrap();
        assert_eq!(g.edges_between(&NodeImage::Node(a), r, &NodeImage::Node(c)).len(), 2);
    }

    #[test]
    fn value_images_are_canonical() {
        let mut b = HostGraph::builder(types());
        let five = b.value_node(Value::Int(5));
        assert_eq!(b.value_node(Value::Int(5)), five);
        let g = b.build();
        assert_eq!(g.image_of_value(Value::Int(5)), NodeImage::Node(five));
        assert_eq!(g.image_of_value(Value::Int(6)), NodeImage::Value(Value::Int(6)));
        let int = g.types().sort_type(crate::algebra::Sort::Int);
        assert_eq!(g.image_type(&NodeImage::Value(Value::Int(6))), int);
        assert_eq!(g.nodes_of_type(int), &[five]);
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let mut b = HostGraph::builder(types());
        assert!(matches!(b.node("Nope"), Err(GraphError::UnknownLabel(_))));
        let a = b.node("T").unwrap();
        assert!(matches!(b.edge(a, "nope", a), Err(GraphError::UnknownLabel(_))));
    }
}
