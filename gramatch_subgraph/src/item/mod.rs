//! Search items: the atomic matching obligations a plan orders.
//!
//! Every item declares which parts it needs bound beforehand and which parts
//! it binds. After the plan order is fixed, [`SearchItem::activate`] tells the
//! item which of its bound parts are already found by earlier items, which
//! selects the cheaper checking code paths. Items are immutable afterwards and
//! shared by all searches over the plan; the per-search state lives in the
//! records they create.

mod attribute;
mod condition;
mod edge;
mod node;
mod regex;

use std::fmt;

use gramatch_common::{
    ConditionId, Config, HostGraph, LabelId, NodeImage, PEdgeId, PNodeId, PVarId, Pattern,
    PatternNodeKind, Value,
};

pub(crate) use attribute::{EqualityItem, OperatorItem, SetOperatorItem};
pub(crate) use condition::{ConditionItem, NegatedItem};
pub(crate) use edge::{EdgeItem, EdgeLabel};
pub(crate) use node::{NodeTypeItem, SeedItem, ValueItem};
pub(crate) use regex::RegexItem;

use crate::error::SearchError;
use crate::record::Record;
use crate::state::State;

/// A pattern element an item needs or binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Part {
    /// A pattern node.
    Node(PNodeId),
    /// A pattern edge.
    Edge(PEdgeId),
    /// A pattern variable.
    Var(PVarId),
    /// The result slot of a sub-condition.
    Slot(ConditionId),
}

impl fmt::Display for Part {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Node(n) => write!(f, "{n}"),
            Part::Edge(e) => write!(f, "{e}"),
            Part::Var(v) => write!(f, "{v}"),
            Part::Slot(c) => write!(f, "[{c}]"),
        }
    }
}

/// Dense membership set over parts.
#[derive(Clone, Debug)]
pub(crate) struct PartSet {
    nodes: Vec<bool>,
    edges: Vec<bool>,
    vars: Vec<bool>,
    slots: Vec<bool>,
}

impl PartSet {
    pub(crate) fn new(pattern: &Pattern) -> Self {
        Self {
            nodes: vec![false; pattern.node_count()],
            edges: vec![false; pattern.edge_count()],
            vars: vec![false; pattern.var_count()],
            slots: vec![false; pattern.condition_count()],
        }
    }

    pub(crate) fn contains(&self, part: Part) -> bool {
        match part {
            Part::Node(n) => self.nodes[n.index()],
            Part::Edge(e) => self.edges[e.index()],
            Part::Var(v) => self.vars[v.index()],
            Part::Slot(c) => self.slots[c.index()],
        }
    }

    pub(crate) fn insert(&mut self, part: Part) -> bool {
        let slot = match part {
            Part::Node(n) => &mut self.nodes[n.index()],
            Part::Edge(e) => &mut self.edges[e.index()],
            Part::Var(v) => &mut self.vars[v.index()],
            Part::Slot(c) => &mut self.slots[c.index()],
        };
        !std::mem::replace(slot, true)
    }
}

/// Type (and constant) constraint checked when an item binds a node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct NodeCheck {
    // Sorted host types the image may have.
    types: Vec<LabelId>,
    constant: Option<Value>,
}

impl NodeCheck {
    pub(crate) fn for_node(pattern: &Pattern, config: &Config, node: PNodeId) -> Self {
        let types = pattern.types();
        match &pattern.node(node).kind {
            PatternNodeKind::Typed { ty, sharp, .. } => Self {
                types: types.matching_types(*ty, *sharp),
                constant: None,
            },
            PatternNodeKind::Value { sort, constant } => Self {
                types: vec![types.sort_type(*sort)],
                constant: constant.clone().map(|c| config.algebra.normalize(c)),
            },
        }
    }

    pub(crate) fn types(&self) -> &[LabelId] {
        &self.types
    }

    pub(crate) fn admits(&self, host: &HostGraph, image: &NodeImage) -> bool {
        if self.types.binary_search(&host.image_type(image)).is_err() {
            return false;
        }
        match &self.constant {
            Some(c) => host.image_value(image) == Some(c),
            None => true,
        }
    }
}

/// The endpoints of an edge-like item.
#[derive(Clone, Debug)]
pub(crate) struct Ends {
    pub(crate) source: PNodeId,
    pub(crate) target: PNodeId,
    source_check: NodeCheck,
    target_check: NodeCheck,
    pub(crate) source_found: bool,
    pub(crate) target_found: bool,
}

impl Ends {
    pub(crate) fn new(pattern: &Pattern, config: &Config, source: PNodeId, target: PNodeId) -> Self {
        Self {
            source,
            target,
            source_check: NodeCheck::for_node(pattern, config, source),
            target_check: NodeCheck::for_node(pattern, config, target),
            source_found: false,
            target_found: false,
        }
    }

    pub(crate) fn parts(&self) -> [Part; 2] {
        [Part::Node(self.source), Part::Node(self.target)]
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.source_found = found(Part::Node(self.source));
        self.target_found = found(Part::Node(self.target));
    }

    pub(crate) fn both_found(&self) -> bool {
        self.source_found && self.target_found
    }

    // A self-loop binds its single node through the source.
    fn target_bound_by_source(&self) -> bool {
        self.source == self.target && !self.target_found
    }

    pub(crate) fn found_source<'s>(&self, state: &'s State<'_>) -> Result<Option<&'s NodeImage>, SearchError> {
        if self.source_found {
            state.found_node(self.source).map(Some)
        } else {
            Ok(None)
        }
    }

    pub(crate) fn found_target<'s>(&self, state: &'s State<'_>) -> Result<Option<&'s NodeImage>, SearchError> {
        if self.target_found {
            state.found_node(self.target).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Bind or check both ends. On `false` the state is unchanged.
    pub(crate) fn write(
        &self,
        state: &mut State<'_>,
        source: NodeImage,
        target: NodeImage,
    ) -> Result<bool, SearchError> {
        if !state.bind_or_check(self.source, source, self.source_found, &self.source_check)? {
            return Ok(false);
        }
        let target_found = self.target_found || self.target_bound_by_source();
        if !state.bind_or_check(self.target, target, target_found, &self.target_check)? {
            if !self.source_found {
                state.unbind_node(self.source);
            }
            return Ok(false);
        }
        Ok(true)
    }

    pub(crate) fn erase(&self, state: &mut State<'_>) {
        if !self.target_found && !self.target_bound_by_source() {
            state.unbind_node(self.target);
        }
        if !self.source_found {
            state.unbind_node(self.source);
        }
    }
}

/// Item kinds, in ascending order of scheduling priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    /// Regular expression accepting the empty path.
    EmptyRegex,
    /// Node type test.
    NodeType,
    /// Nested quantified condition.
    Condition,
    /// Regular expression edge.
    Regex,
    /// Wildcard edge.
    Wildcard,
    /// Plain edge.
    Edge,
    /// (In)equality test.
    Equality,
    /// Negated item.
    Negated,
    /// Operator application.
    Operator,
    /// Set operator application.
    SetOperator,
    /// Constant value.
    Value,
    /// Pre-matched anchor.
    Seed,
}

impl ItemKind {
    /// Profiling label of the records of this kind.
    pub const fn timer_label(self) -> &'static str {
        match self {
            ItemKind::EmptyRegex | ItemKind::Regex => "record::regex",
            ItemKind::NodeType => "record::node_type",
            ItemKind::Condition => "record::condition",
            ItemKind::Wildcard | ItemKind::Edge => "record::edge",
            ItemKind::Equality => "record::equality",
            ItemKind::Negated => "record::negated",
            ItemKind::Operator => "record::operator",
            ItemKind::SetOperator => "record::set_operator",
            ItemKind::Value => "record::value",
            ItemKind::Seed => "record::seed",
        }
    }

    /// Scheduling priority: higher ranks are placed earlier among ready items.
    pub const fn rank(self) -> u8 {
        match self {
            ItemKind::EmptyRegex | ItemKind::NodeType => 0,
            ItemKind::Condition => 1,
            ItemKind::Regex => 2,
            ItemKind::Wildcard => 3,
            ItemKind::Edge => 4,
            ItemKind::Equality => 5,
            ItemKind::Negated => 6,
            ItemKind::Operator | ItemKind::SetOperator => 7,
            ItemKind::Value => 8,
            ItemKind::Seed => 9,
        }
    }
}

/// One matching obligation of a search plan.
#[derive(Clone, Debug)]
pub enum SearchItem {
    /// Verify the pre-matched anchor.
    Seed(SeedItem),
    /// Match a plain or wildcard edge.
    Edge(EdgeItem),
    /// Match a path described by a regular expression.
    Regex(RegexItem),
    /// Match a node by type, binding its type variable.
    NodeType(NodeTypeItem),
    /// Compare two node images.
    Equality(EqualityItem),
    /// Evaluate an operator.
    Operator(OperatorItem),
    /// Fold the sub-matches of a sibling condition.
    SetOperator(SetOperatorItem),
    /// Match a constant.
    Value(ValueItem),
    /// Evaluate a nested condition.
    Condition(ConditionItem),
    /// Succeed iff the inner item fails.
    Negated(NegatedItem),
}

impl SearchItem {
    /// The kind of this item.
    pub fn kind(&self) -> ItemKind {
        match self {
            SearchItem::Seed(_) => ItemKind::Seed,
            SearchItem::Edge(item) => match item.label {
                EdgeLabel::Fixed(_) => ItemKind::Edge,
                EdgeLabel::Wildcard { .. } => ItemKind::Wildcard,
            },
            SearchItem::Regex(item) if item.accepts_empty() => ItemKind::EmptyRegex,
            SearchItem::Regex(_) => ItemKind::Regex,
            SearchItem::NodeType(_) => ItemKind::NodeType,
            SearchItem::Equality(_) => ItemKind::Equality,
            SearchItem::Operator(_) => ItemKind::Operator,
            SearchItem::SetOperator(_) => ItemKind::SetOperator,
            SearchItem::Value(_) => ItemKind::Value,
            SearchItem::Condition(_) => ItemKind::Condition,
            SearchItem::Negated(_) => ItemKind::Negated,
        }
    }

    /// Parts that must be bound before this item can run.
    pub fn needs(&self) -> Vec<Part> {
        match self {
            SearchItem::Seed(_) | SearchItem::Edge(_) | SearchItem::NodeType(_) | SearchItem::Value(_) => {
                Vec::new()
            }
            SearchItem::Regex(item) => item.vars().iter().map(|&v| Part::Var(v)).collect(),
            SearchItem::Equality(item) => vec![Part::Node(item.left), Part::Node(item.right)],
            SearchItem::Operator(item) => item.args.iter().map(|&n| Part::Node(n)).collect(),
            SearchItem::SetOperator(item) => vec![Part::Slot(item.condition)],
            SearchItem::Condition(item) => item.roots(),
            SearchItem::Negated(item) => item.needs(),
        }
    }

    /// Parts this item binds, or checks when an earlier item already bound them.
    pub fn binds(&self) -> Vec<Part> {
        match self {
            SearchItem::Seed(item) => item.parts(),
            SearchItem::Edge(item) => item.parts(),
            SearchItem::Regex(item) => item.parts(),
            SearchItem::NodeType(item) => item.parts(),
            SearchItem::Equality(_) | SearchItem::Negated(_) => Vec::new(),
            SearchItem::Operator(item) => vec![Part::Node(item.target)],
            SearchItem::SetOperator(item) => vec![Part::Node(item.target)],
            SearchItem::Value(item) => vec![Part::Node(item.node)],
            SearchItem::Condition(item) => item.binds(),
        }
    }

    /// Resolve which bound parts are found by earlier items.
    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        match self {
            SearchItem::Seed(_) | SearchItem::Equality(_) => {}
            SearchItem::Edge(item) => item.activate(found),
            SearchItem::Regex(item) => item.activate(found),
            SearchItem::NodeType(item) => item.activate(found),
            SearchItem::Operator(item) => item.target_found = found(Part::Node(item.target)),
            SearchItem::SetOperator(item) => item.target_found = found(Part::Node(item.target)),
            SearchItem::Value(item) => item.node_found = found(Part::Node(item.node)),
            SearchItem::Condition(item) => item.activate(found),
            SearchItem::Negated(item) => item.activate(found),
        }
    }

    /// Whether records of this item produce at most one image on `host`.
    pub fn is_singular(&self, host: &HostGraph) -> bool {
        match self {
            SearchItem::Edge(item) => item.is_singular(host),
            SearchItem::Regex(item) => item.ends.both_found(),
            SearchItem::NodeType(item) => item.node_found,
            _ => true,
        }
    }

    /// Whether records of this item produce at most one image on hosts without parallel edges.
    pub fn is_singular_on_simple_host(&self) -> bool {
        match self {
            SearchItem::Edge(item) => item.is_singular_on_simple_host(),
            SearchItem::Regex(item) => item.ends.both_found(),
            SearchItem::NodeType(item) => item.node_found,
            _ => true,
        }
    }

    /// Create the per-search record of this item.
    pub(crate) fn create_record<'g>(&'g self, host: &'g HostGraph) -> Box<dyn Record<'g> + 'g> {
        match self {
            SearchItem::Seed(item) => item.create_record(),
            SearchItem::Edge(item) => item.create_record(host),
            SearchItem::Regex(item) => item.create_record(),
            SearchItem::NodeType(item) => item.create_record(),
            SearchItem::Equality(item) => item.create_record(),
            SearchItem::Operator(item) => item.create_record(),
            SearchItem::SetOperator(item) => item.create_record(),
            SearchItem::Value(item) => item.create_record(),
            SearchItem::Condition(item) => item.create_record(),
            SearchItem::Negated(item) => item.create_record(host),
        }
    }

    /// The edge label this item matches, if it is fixed.
    pub fn label(&self) -> Option<LabelId> {
        match self {
            SearchItem::Edge(EdgeItem {
                label: EdgeLabel::Fixed(label),
                ..
            }) => Some(*label),
            _ => None,
        }
    }

    /// Source and target of edge-like items.
    pub fn ends(&self) -> Option<(PNodeId, PNodeId)> {
        match self {
            SearchItem::Edge(item) => Some((item.ends.source, item.ends.target)),
            SearchItem::Regex(item) => Some((item.ends.source, item.ends.target)),
            _ => None,
        }
    }

    /// Structural key used to order otherwise equivalent items deterministically.
    pub fn rating(&self) -> (u32, u32, u32) {
        match self {
            SearchItem::Seed(_) => (0, 0, 0),
            SearchItem::Edge(item) => (
                self.label().map_or(u32::MAX, |l| l.0),
                item.ends.source.0,
                item.ends.target.0,
            ),
            SearchItem::Regex(item) => (item.edge.0, item.ends.source.0, item.ends.target.0),
            SearchItem::NodeType(item) => (item.node.0, 0, 0),
            SearchItem::Equality(item) => (item.left.0, item.right.0, u32::from(item.equal)),
            SearchItem::Operator(item) => (item.target.0, 0, 0),
            SearchItem::SetOperator(item) => (item.target.0, item.condition.0, 0),
            SearchItem::Value(item) => (item.node.0, 0, 0),
            SearchItem::Condition(item) => (item.condition.0, 0, 0),
            SearchItem::Negated(item) => item.inner.rating(),
        }
    }

    /// Short human-readable description.
    pub fn describe(&self, pattern: &Pattern) -> String {
        let node = |n: PNodeId| pattern.node(n).name.clone();
        match self {
            SearchItem::Seed(item) => format!("seed {}", item.describe(pattern)),
            SearchItem::Edge(item) => format!(
                "edge {} -{}-> {}",
                node(item.ends.source),
                pattern.describe_label(&pattern.edge(item.edge).label),
                node(item.ends.target)
            ),
            SearchItem::Regex(item) => format!(
                "path {} -{}-> {}",
                node(item.ends.source),
                pattern.describe_label(&pattern.edge(item.edge).label),
                node(item.ends.target)
            ),
            SearchItem::NodeType(item) => format!("type {}", node(item.node)),
            SearchItem::Equality(item) => format!(
                "{} {} {}",
                node(item.left),
                if item.equal { "==" } else { "!=" },
                node(item.right)
            ),
            SearchItem::Operator(item) => format!(
                "{} = {:?}({})",
                node(item.target),
                item.op,
                item.args.iter().map(|&a| node(a)).collect::<Vec<_>>().join(", ")
            ),
            SearchItem::SetOperator(item) => format!(
                "{} = {:?}{{{} | {}}}",
                node(item.target),
                item.op,
                node(item.arg),
                pattern.condition(item.condition).name
            ),
            SearchItem::Value(item) => format!("value {} = {}", node(item.node), item.value),
            SearchItem::Condition(item) => {
                let cond = pattern.condition(item.condition);
                format!("{} {}", item.quantifier.symbol(), cond.name)
            }
            SearchItem::Negated(item) => format!("not ({})", item.inner.describe(pattern)),
        }
    }
}
