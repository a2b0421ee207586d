#![allow(dead_code)]

use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

use lazy_static::lazy_static;
use quickcheck::{Arbitrary, Gen};
use tracing_subscriber::EnvFilter;

use gramatch_common::{
    Condition, Config, EdgeId, HostGraph, NodeId, NodeImage, PNodeId, Pattern, PatternLabel, PatternNodeKind,
    Quantifier, TypeGraph,
};
use gramatch_subgraph::TreeMatch;

static INIT: OnceLock<()> = OnceLock::new();

pub fn init_test_logger() {
    INIT.get_or_init(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

lazy_static! {
    /// `B` is a subtype of `A`; `r` and `s` are the edge labels.
    pub static ref TYPES: Arc<TypeGraph> = {
        let mut tb = TypeGraph::builder();
        tb.node_type("A");
        tb.node_type("T");
        tb.edge_label("r");
        tb.edge_label("s");
        tb.edge_label("age");
        tb.edge_label("knows");
        tb.subtype("B", "A");
        Arc::new(tb.build().expect("fixture type graph"))
    };
}

/// Node images of the condition's own nodes, then edge images of its own edges.
pub type Flat = (Vec<NodeId>, Vec<EdgeId>);

pub fn flatten(pattern: &Pattern, found: &TreeMatch) -> Flat {
    let cond = pattern.condition(found.condition);
    let nodes = cond
        .nodes
        .iter()
        .map(|n| match found.node(*n) {
            Some(NodeImage::Node(id)) => *id,
            other => panic!("node {n} has image {other:?}"),
        })
        .collect();
    let edges = cond
        .edges
        .iter()
        .map(|e| found.edge(*e).unwrap_or_else(|| panic!("edge {e} unbound")))
        .collect();
    (nodes, edges)
}

fn type_ok(pattern: &Pattern, host: &HostGraph, node: PNodeId, image: NodeId) -> bool {
    match pattern.node(node).kind {
        PatternNodeKind::Typed { ty, sharp, .. } => pattern
            .types()
            .matching_types(ty, sharp)
            .contains(&host.node_type(image)),
        PatternNodeKind::Value { .. } => false,
    }
}

/// Every assignment of the condition's own nodes extending `base`. With
/// `shared_roots` the own nodes need only be distinct from each other.
fn node_assignments(
    pattern: &Pattern,
    host: &HostGraph,
    injective: bool,
    shared_roots: bool,
    cond: &Condition,
    base: Vec<Option<NodeId>>,
) -> Vec<Vec<Option<NodeId>>> {
    let mut partial = vec![base];
    for &node in &cond.nodes {
        let mut next = Vec::new();
        for assignment in partial {
            for image in host.node_ids() {
                if !type_ok(pattern, host, node, image) {
                    continue;
                }
                let taken = if shared_roots {
                    cond.nodes.iter().any(|n| assignment[n.index()] == Some(image))
                } else {
                    assignment.contains(&Some(image))
                };
                if injective && taken {
                    continue;
                }
                let mut extended = assignment.clone();
                extended[node.index()] = Some(image);
                next.push(extended);
            }
        }
        partial = next;
    }
    partial
}

/// Every assignment of the condition's own plain edges given its node images.
fn edge_assignments(pattern: &Pattern, host: &HostGraph, cond: &Condition, nodes: &[Option<NodeId>]) -> Vec<Vec<EdgeId>> {
    let mut partial = vec![Vec::new()];
    for &edge in &cond.edges {
        let e = pattern.edge(edge);
        let PatternLabel::Plain(label) = e.label else {
            panic!("reference matcher only handles plain edges");
        };
        let (Some(source), Some(target)) = (nodes[e.source.index()], nodes[e.target.index()]) else {
            panic!("edge {edge} has an unassigned end");
        };
        let candidates: Vec<EdgeId> = (0..host.edge_count())
            .map(|ix| EdgeId(ix as u32))
            .filter(|&id| {
                let he = host.edge(id);
                he.label == label && he.source == source && he.target == target
            })
            .collect();
        partial = partial
            .into_iter()
            .flat_map(|prefix| {
                candidates.iter().map(move |&c| {
                    let mut extended = prefix.clone();
                    extended.push(c);
                    extended
                })
            })
            .collect();
    }
    partial
}

fn children_hold(pattern: &Pattern, host: &HostGraph, injective: bool, cond: &Condition, nodes: &[Option<NodeId>]) -> bool {
    cond.children.iter().all(|&child| {
        let child = pattern.condition(child);
        let mut base = vec![None; pattern.node_count()];
        for &root in &child.root_nodes {
            base[root.index()] = nodes[root.index()];
        }
        let shared_roots = child.quantifier == Quantifier::Not;
        let exists = node_assignments(pattern, host, injective, shared_roots, child, base)
            .into_iter()
            .any(|a| !edge_assignments(pattern, host, child, &a).is_empty() && children_hold(pattern, host, injective, child, &a));
        match child.quantifier {
            Quantifier::Not => !exists,
            Quantifier::Exists => exists,
            q => panic!("reference matcher does not handle {q:?}"),
        }
    })
}

/// All matches of the root condition by exhaustive enumeration.
pub fn brute_force(pattern: &Pattern, host: &HostGraph, injective: bool) -> BTreeSet<Flat> {
    let root = pattern.condition(pattern.root());
    let mut out = BTreeSet::new();
    for nodes in node_assignments(pattern, host, injective, false, root, vec![None; pattern.node_count()]) {
        if !children_hold(pattern, host, injective, root, &nodes) {
            continue;
        }
        for edges in edge_assignments(pattern, host, root, &nodes) {
            let own = root.nodes.iter().map(|n| nodes[n.index()].expect("assigned")).collect();
            out.insert((own, edges));
        }
    }
    out
}

pub fn config(injective: bool) -> Arc<Config> {
    Arc::new(Config::builder().injective(injective).build())
}

/// A random small host graph and a pattern over `A`, `B`, `r` and `s`.
#[derive(Clone, Debug)]
pub struct Scenario {
    /// `true` for a `B` node.
    pub host_nodes: Vec<bool>,
    /// `(source, is_s, target)`.
    pub host_edges: Vec<(usize, bool, usize)>,
    /// Keep repeated host edges as parallel edges.
    pub multigraph: bool,
    /// `(is_b, sharp)`.
    pub pattern_nodes: Vec<(bool, bool)>,
    pub pattern_edges: Vec<(usize, bool, usize)>,
    /// A negated edge from a root node to either a root node or a fresh node.
    pub negated: Option<(usize, bool, Option<usize>)>,
    pub injective: bool,
}

fn below(g: &mut Gen, n: usize) -> usize {
    u32::arbitrary(g) as usize % n
}

impl Arbitrary for Scenario {
    fn arbitrary(g: &mut Gen) -> Self {
        let host_count = 1 + below(g, 5);
        let host_nodes = (0..host_count).map(|_| bool::arbitrary(g)).collect();
        let host_edges = (0..below(g, 9))
            .map(|_| (below(g, host_count), bool::arbitrary(g), below(g, host_count)))
            .collect();

        let pattern_count = 1 + below(g, 3);
        let pattern_nodes = (0..pattern_count)
            .map(|_| (bool::arbitrary(g), bool::arbitrary(g)))
            .collect();
        let pattern_edges = (0..below(g, 4))
            .map(|_| (below(g, pattern_count), bool::arbitrary(g), below(g, pattern_count)))
            .collect();
        let negated = bool::arbitrary(g).then(|| {
            let target = if bool::arbitrary(g) {
                Some(below(g, pattern_count))
            } else {
                None
            };
            (below(g, pattern_count), bool::arbitrary(g), target)
        });

        Self {
            host_nodes,
            host_edges,
            multigraph: bool::arbitrary(g),
            pattern_nodes,
            pattern_edges,
            negated,
            injective: bool::arbitrary(g),
        }
    }
}

const fn label(is_s: bool) -> &'static str {
    if is_s { "s" } else { "r" }
}

impl Scenario {
    pub fn host(&self) -> HostGraph {
        let mut b = HostGraph::builder(TYPES.clone());
        if self.multigraph {
            b = b.multigraph();
        }
        let ids: Vec<NodeId> = self
            .host_nodes
            .iter()
            .map(|&is_b| b.node(if is_b { "B" } else { "A" }).expect("fixture type"))
            .collect();
        for &(s, is_s, t) in &self.host_edges {
            b.edge(ids[s], label(is_s), ids[t]).expect("fixture edge");
        }
        b.build()
    }

    /// The pattern, optionally without its negated condition.
    pub fn pattern_with(&self, negation: bool) -> Arc<Pattern> {
        let mut b = Pattern::builder(TYPES.clone());
        let root = b.root();
        let nodes: Vec<PNodeId> = self
            .pattern_nodes
            .iter()
            .enumerate()
            .map(|(ix, &(is_b, sharp))| {
                let ty = if is_b { "B" } else { "A" };
                let name = format!("x{ix}");
                if sharp {
                    b.sharp_node(root, &name, ty)
                } else {
                    b.node(root, &name, ty)
                }
                .expect("fixture node")
            })
            .collect();
        for &(s, is_s, t) in &self.pattern_edges {
            b.edge(root, nodes[s], label(is_s), nodes[t]).expect("fixture edge");
        }
        if let (true, Some((s, is_s, target))) = (negation, self.negated) {
            let neg = b.condition(root, "neg", Quantifier::Not).expect("fixture condition");
            let target = match target {
                Some(t) => nodes[t],
                None => b.node(neg, "fresh", "A").expect("fixture node"),
            };
            b.edge(neg, nodes[s], label(is_s), target).expect("fixture edge");
        }
        b.build().expect("fixture pattern")
    }

    pub fn pattern(&self) -> Arc<Pattern> {
        self.pattern_with(true)
    }
}
