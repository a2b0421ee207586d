//! Items binding single nodes: type tests, constants and the seed.

use gramatch_common::{NodeImage, PEdgeId, PNodeId, PVarId, Pattern, PatternLabel, Value};

use super::{NodeCheck, Part};
use crate::anchor::Anchor;
use crate::error::SearchError;
use crate::record::{MultipleProbe, MultipleRecord, Probe, Record, SingularProbe, SingularRecord};
use crate::state::State;

/// Matches a node against its matching types and binds its type variable.
#[derive(Clone, Debug)]
pub struct NodeTypeItem {
    pub(crate) node: PNodeId,
    check: NodeCheck,
    type_var: Option<PVarId>,
    pub(crate) node_found: bool,
    var_found: bool,
}

impl NodeTypeItem {
    pub(crate) fn new(node: PNodeId, check: NodeCheck, type_var: Option<PVarId>) -> Self {
        Self {
            node,
            check,
            type_var,
            node_found: false,
            var_found: false,
        }
    }

    pub(crate) fn parts(&self) -> Vec<Part> {
        let mut parts = vec![Part::Node(self.node)];
        parts.extend(self.type_var.map(Part::Var));
        parts
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.node_found = found(Part::Node(self.node));
        self.var_found = self.type_var.is_some_and(|v| found(Part::Var(v)));
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        let probe = NodeTypeProbe { item: self };
        if self.node_found {
            Box::new(SingularRecord::new(probe))
        } else {
            Box::new(MultipleRecord::new(probe))
        }
    }
}

struct NodeTypeProbe<'g> {
    item: &'g NodeTypeItem,
}

impl<'g> Probe<'g> for NodeTypeProbe<'g> {
    type Image = NodeImage;

    fn write(&mut self, state: &mut State<'g>, image: &NodeImage) -> Result<bool, SearchError> {
        let item = self.item;
        let ty = state.host.image_type(image);
        if let Some(v) = item.type_var {
            if item.var_found && state.found_var(v)? != ty {
                return Ok(false);
            }
        }
        if !state.bind_or_check(item.node, image.clone(), item.node_found, &item.check)? {
            return Ok(false);
        }
        if let Some(v) = item.type_var {
            if !item.var_found {
                state.bind_var(v, ty);
            }
        }
        Ok(true)
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &NodeImage) {
        if let Some(v) = self.item.type_var {
            if !self.item.var_found {
                state.unbind_var(v);
            }
        }
        if !self.item.node_found {
            state.unbind_node(self.item.node);
        }
    }
}

impl<'g> SingularProbe<'g> for NodeTypeProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<NodeImage>, SearchError> {
        let image = state.found_node(self.item.node)?;
        Ok(self.item.check.admits(state.host, image).then(|| image.clone()))
    }
}

impl<'g> MultipleProbe<'g> for NodeTypeProbe<'g> {
    fn candidates(&mut self, state: &State<'g>) -> Result<Box<dyn Iterator<Item = NodeImage> + 'g>, SearchError> {
        let host = state.host;
        let item = self.item;
        let nodes = item
            .check
            .types()
            .iter()
            .flat_map(move |&ty| host.nodes_of_type(ty))
            .map(|&n| NodeImage::Node(n));
        Ok(Box::new(nodes))
    }
}

/// Matches a constant: the image is the canonical image of the value.
#[derive(Clone, Debug)]
pub struct ValueItem {
    pub(crate) node: PNodeId,
    pub(crate) value: Value,
    pub(crate) node_found: bool,
}

impl ValueItem {
    pub(crate) fn new(node: PNodeId, value: Value) -> Self {
        Self {
            node,
            value,
            node_found: false,
        }
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(ValueProbe { item: self }))
    }
}

struct ValueProbe<'g> {
    item: &'g ValueItem,
}

impl<'g> Probe<'g> for ValueProbe<'g> {
    type Image = NodeImage;

    fn write(&mut self, state: &mut State<'g>, image: &NodeImage) -> Result<bool, SearchError> {
        if self.item.node_found {
            Ok(state.found_node(self.item.node)? == image)
        } else {
            state.bind_node(self.item.node, image.clone())
        }
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &NodeImage) {
        if !self.item.node_found {
            state.unbind_node(self.item.node);
        }
    }
}

impl<'g> SingularProbe<'g> for ValueProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<NodeImage>, SearchError> {
        Ok(Some(state.host.image_of_value(self.item.value.clone())))
    }
}

/// Verifies the pre-matched anchor installed by `Search::initialise`.
#[derive(Clone, Debug)]
pub struct SeedItem {
    pub(crate) anchor: Anchor,
    checks: Vec<(PNodeId, NodeCheck)>,
    edges: Vec<(PEdgeId, PatternLabel, PNodeId, PNodeId)>,
}

impl SeedItem {
    pub(crate) fn new(pattern: &Pattern, anchor: Anchor, checks: Vec<(PNodeId, NodeCheck)>) -> Self {
        let edges = anchor
            .edges()
            .iter()
            .map(|&e| {
                let edge = pattern.edge(e);
                (e, edge.label.clone(), edge.source, edge.target)
            })
            .collect();
        Self { anchor, checks, edges }
    }

    pub(crate) fn parts(&self) -> Vec<Part> {
        let nodes = self.anchor.nodes().iter().map(|&n| Part::Node(n));
        let edges = self.anchor.edges().iter().map(|&e| Part::Edge(e));
        let vars = self.anchor.vars().iter().map(|&v| Part::Var(v));
        nodes.chain(edges).chain(vars).collect()
    }

    pub(crate) fn describe(&self, pattern: &Pattern) -> String {
        let names: Vec<&str> = self
            .anchor
            .nodes()
            .iter()
            .map(|&n| pattern.node(n).name.as_str())
            .chain(self.anchor.vars().iter().map(|&v| pattern.var(v).name.as_str()))
            .collect();
        format!("[{}]", names.join(", "))
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(SeedProbe { item: self }))
    }

    fn verify(&self, state: &State<'_>) -> Result<bool, SearchError> {
        let host = state.host;
        for (node, check) in &self.checks {
            if !check.admits(host, state.found_node(*node)?) {
                return Ok(false);
            }
        }
        if state.config.injective {
            let mut seen = std::collections::HashSet::new();
            for &node in self.anchor.nodes() {
                if let NodeImage::Node(n) = state.found_node(node)? {
                    if host.value(*n).is_none() && !seen.insert(*n) {
                        return Ok(false);
                    }
                }
            }
        }
        for (edge, label, source, target) in &self.edges {
            let image = state
                .edge(*edge)
                .ok_or_else(|| SearchError::invariant(format!("seed edge {edge} is not installed")))?;
            let host_edge = host.edge(image);
            let label_ok = match label {
                PatternLabel::Plain(l) => *l == host_edge.label,
                PatternLabel::Wildcard { var, guard } => {
                    guard.admits(host_edge.label)
                        && var.is_none_or(|v| state.var(v) == Some(host_edge.label))
                }
                PatternLabel::Regex(expr) => expr.as_atom() == Some(host_edge.label),
            };
            if !label_ok
                || state.found_node(*source)? != &NodeImage::Node(host_edge.source)
                || state.found_node(*target)? != &NodeImage::Node(host_edge.target)
            {
                return Ok(false);
            }
        }
        for &var in self.anchor.vars() {
            let label = state.found_var(var)?;
            let expected = match state.pattern.var(var).kind {
                gramatch_common::VarKind::EdgeLabel => gramatch_common::LabelKind::EdgeLabel,
                gramatch_common::VarKind::NodeType => gramatch_common::LabelKind::NodeType,
            };
            if label.index() >= host.types().label_count() || host.types().kind(label) != expected {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

struct SeedProbe<'g> {
    item: &'g SeedItem,
}

impl<'g> Probe<'g> for SeedProbe<'g> {
    type Image = ();

    fn write(&mut self, _state: &mut State<'g>, _image: &()) -> Result<bool, SearchError> {
        Ok(true)
    }

    fn erase(&mut self, _state: &mut State<'g>, _image: &()) {}
}

impl<'g> SingularProbe<'g> for SeedProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<()>, SearchError> {
        Ok(self.item.verify(state)?.then_some(()))
    }
}
