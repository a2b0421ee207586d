//! Nested graph conditions.

use crate::algebra::{Operator, SetOperator};

use super::{ConditionId, PNodeId, PVarId, PEdgeId};

/// How a condition's matches combine into its parent's match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// At least one match must exist; the matches form a disjunction.
    Exists,
    /// All matches are collected. A positive universal fails without matches.
    Forall {
        /// Whether at least one match is required.
        positive: bool,
    },
    /// No match may exist.
    Not,
    /// Always satisfied, with an empty sub-match.
    True,
}

impl Quantifier {
    /// Short name used in plan listings.
    pub const fn symbol(self) -> &'static str {
        match self {
            Quantifier::Exists => "exists",
            Quantifier::Forall { positive: true } => "forall+",
            Quantifier::Forall { positive: false } => "forall",
            Quantifier::Not => "not",
            Quantifier::True => "true",
        }
    }
}

/// Required (in)equality between two node images.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Equation {
    /// Left-hand node.
    pub left: PNodeId,
    /// Right-hand node.
    pub right: PNodeId,
    /// `true` for `left == right`, `false` for `left != right`.
    pub equal: bool,
}

/// An operator applied to value nodes, producing (or checking) a target value node.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Operation {
    /// The operator.
    pub op: Operator,
    /// Argument value nodes, in order.
    pub args: Vec<PNodeId>,
    /// Result value node.
    pub target: PNodeId,
}

/// A set operator folding the images of `arg` over all sub-matches of `condition`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SetOperation {
    /// The operator.
    pub op: SetOperator,
    /// Sub-condition whose matches are folded.
    pub condition: ConditionId,
    /// Value node of the sub-condition read in each sub-match.
    pub arg: PNodeId,
    /// Result value node.
    pub target: PNodeId,
}

/// One node of the condition tree.
#[derive(Clone, Debug)]
pub struct Condition {
    /// Identifier.
    pub id: ConditionId,
    /// Display name.
    pub name: String,
    /// Quantifier.
    pub quantifier: Quantifier,
    /// Enclosing condition, `None` for the root.
    pub parent: Option<ConditionId>,
    /// Nodes owned by this condition.
    pub nodes: Vec<PNodeId>,
    /// Edges owned by this condition.
    pub edges: Vec<PEdgeId>,
    /// Variables owned by this condition.
    pub vars: Vec<PVarId>,
    /// Nodes owned by an ancestor and used here or below.
    pub root_nodes: Vec<PNodeId>,
    /// Variables owned by an ancestor and used here or below.
    pub root_vars: Vec<PVarId>,
    /// (In)equalities between node images.
    pub equations: Vec<Equation>,
    /// Operator applications.
    pub operations: Vec<Operation>,
    /// Set operator applications over direct sub-conditions.
    pub set_operations: Vec<SetOperation>,
    /// Parent-owned value node receiving the number of matches.
    pub count_node: Option<PNodeId>,
    /// Direct sub-conditions.
    pub children: Vec<ConditionId>,
}

impl Condition {
    pub(crate) fn new(
        id: ConditionId,
        name: String,
        quantifier: Quantifier,
        parent: Option<ConditionId>,
    ) -> Self {
        Self {
            id,
            name,
            quantifier,
            parent,
            nodes: Vec::new(),
            edges: Vec::new(),
            vars: Vec::new(),
            root_nodes: Vec::new(),
            root_vars: Vec::new(),
            equations: Vec::new(),
            operations: Vec::new(),
            set_operations: Vec::new(),
            count_node: None,
            children: Vec::new(),
        }
    }
}
