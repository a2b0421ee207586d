//! Pattern model: a rule-wide arena of pattern nodes, edges and variables,
//! organised into a tree of nested conditions.
//!
//! Every element receives a dense id when it is added to the builder. The ids
//! are stable for the lifetime of the [`Pattern`], so search state can be kept
//! in plain arrays indexed by them.

mod builder;
mod condition;

use std::fmt;
use std::sync::Arc;

pub use builder::PatternBuilder;
pub use condition::{Condition, Equation, Operation, Quantifier, SetOperation};

use crate::algebra::{Sort, Value};
use crate::regex::{Guard, RegAut, RegExpr};
use crate::types::{LabelId, TypeGraph};

macro_rules! dense_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            /// Position in the pattern arena.
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

dense_id!(
    /// Dense id of a pattern node.
    PNodeId,
    "p"
);
dense_id!(
    /// Dense id of a pattern edge.
    PEdgeId,
    "e"
);
dense_id!(
    /// Dense id of a pattern variable.
    PVarId,
    "v"
);
dense_id!(
    /// Dense id of a condition.
    ConditionId,
    "c"
);

/// What a pattern node stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternNodeKind {
    /// A graph node constrained by type.
    Typed {
        /// Declared type.
        ty: LabelId,
        /// Whether subtypes are excluded.
        sharp: bool,
        /// Variable bound to the actual node type.
        type_var: Option<PVarId>,
    },
    /// A data value of a sort, optionally fixed to a constant.
    Value {
        /// Sort of the value.
        sort: Sort,
        /// Constant the value must equal.
        constant: Option<Value>,
    },
}

/// A pattern node.
#[derive(Clone, Debug)]
pub struct PatternNode {
    /// Display name.
    pub name: String,
    /// Kind and constraints.
    pub kind: PatternNodeKind,
    /// Whether the node's image distinguishes matches.
    pub relevant: bool,
    /// Condition that owns the node.
    pub owner: ConditionId,
}

impl PatternNode {
    /// Whether this node stands for a data value.
    pub const fn is_value(&self) -> bool {
        matches!(self.kind, PatternNodeKind::Value { .. })
    }

    /// The type variable attached to a typed node.
    pub const fn type_var(&self) -> Option<PVarId> {
        match self.kind {
            PatternNodeKind::Typed { type_var, .. } => type_var,
            PatternNodeKind::Value { .. } => None,
        }
    }
}

/// Label constraint of a pattern edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternLabel {
    /// A fixed label.
    Plain(LabelId),
    /// Any label admitted by the guard, optionally bound to a variable.
    Wildcard {
        /// Label variable.
        var: Option<PVarId>,
        /// Admitted labels.
        guard: Guard,
    },
    /// A path described by a regular expression.
    Regex(RegExpr),
}

/// A pattern edge.
#[derive(Clone, Debug)]
pub struct PatternEdge {
    /// Source node.
    pub source: PNodeId,
    /// Target node.
    pub target: PNodeId,
    /// Label constraint.
    pub label: PatternLabel,
    /// Whether the edge's image distinguishes matches.
    pub relevant: bool,
    /// Condition that owns the edge.
    pub owner: ConditionId,
}

/// What a variable ranges over.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VarKind {
    /// Edge labels, bound by wildcard edges.
    EdgeLabel,
    /// Node types, bound by typed nodes.
    NodeType,
}

/// A pattern variable.
#[derive(Clone, Debug)]
pub struct PatternVar {
    /// Display name.
    pub name: String,
    /// Range of the variable.
    pub kind: VarKind,
    /// Condition that owns the variable.
    pub owner: ConditionId,
}

/// A validated rule pattern: element arena plus condition tree.
#[derive(Debug)]
pub struct Pattern {
    types: Arc<TypeGraph>,
    nodes: Vec<PatternNode>,
    edges: Vec<PatternEdge>,
    vars: Vec<PatternVar>,
    conditions: Vec<Condition>,
    automata: Vec<Option<Arc<RegAut>>>,
}

impl Pattern {
    /// Start building a pattern over `types`.
    pub fn builder(types: Arc<TypeGraph>) -> PatternBuilder {
        PatternBuilder::new(types)
    }

    /// The type graph the pattern is typed by.
    pub fn types(&self) -> &Arc<TypeGraph> {
        &self.types
    }

    /// The root condition.
    pub const fn root(&self) -> ConditionId {
        ConditionId(0)
    }

    /// Number of pattern nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of pattern edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of pattern variables.
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Number of conditions, the root included.
    pub fn condition_count(&self) -> usize {
        self.conditions.len()
    }

    /// A pattern node.
    pub fn node(&self, id: PNodeId) -> &PatternNode {
        &self.nodes[id.index()]
    }

    /// A pattern edge.
    pub fn edge(&self, id: PEdgeId) -> &PatternEdge {
        &self.edges[id.index()]
    }

    /// A pattern variable.
    pub fn var(&self, id: PVarId) -> &PatternVar {
        &self.vars[id.index()]
    }

    /// A condition.
    pub fn condition(&self, id: ConditionId) -> &Condition {
        &self.conditions[id.index()]
    }

    /// All conditions in creation order (parents before children).
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Compiled automaton of a regular-expression edge.
    pub fn automaton(&self, id: PEdgeId) -> Option<&Arc<RegAut>> {
        self.automata[id.index()].as_ref()
    }

    /// Whether `ancestor` is `cond` or encloses it.
    pub fn encloses(&self, ancestor: ConditionId, cond: ConditionId) -> bool {
        let mut current = Some(cond);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.conditions[c.index()].parent;
        }
        false
    }

    /// Human-readable name of an edge label constraint.
    pub fn describe_label(&self, label: &PatternLabel) -> String {
        match label {
            PatternLabel::Plain(l) => self.types.name(*l).to_owned(),
            PatternLabel::Wildcard { var: Some(v), .. } => format!("?{}", self.var(*v).name),
            PatternLabel::Wildcard { var: None, .. } => "?".to_owned(),
            PatternLabel::Regex(expr) => format!("{expr}"),
        }
    }
}
