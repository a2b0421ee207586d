//! Match snapshots.

use std::collections::BTreeMap;
use std::fmt;

use gramatch_common::{ConditionId, EdgeId, LabelId, NodeImage, PEdgeId, PNodeId, PVarId};

/// How the sub-matches of a [`TreeMatch`] combine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchOp {
    /// A concrete match of one condition.
    Some,
    /// All sub-matches hold (universal quantifier).
    And,
    /// Some sub-match holds (existential quantifier).
    Or,
    /// Trivially satisfied, no sub-matches.
    True,
}

/// A match of a condition, with nested matches of its sub-conditions.
///
/// Produced fresh by every successful search step; independent of later
/// search state.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TreeMatch {
    /// The matched condition.
    pub condition: ConditionId,
    /// How `subs` combine.
    pub op: MatchOp,
    /// Node images, empty unless `op` is [`MatchOp::Some`].
    pub nodes: BTreeMap<PNodeId, NodeImage>,
    /// Edge images of plain and wildcard edges.
    pub edges: BTreeMap<PEdgeId, EdgeId>,
    /// Variable valuation.
    pub vars: BTreeMap<PVarId, LabelId>,
    /// Nested matches.
    pub subs: Vec<TreeMatch>,
}

impl TreeMatch {
    pub(crate) fn truth(condition: ConditionId) -> Self {
        Self::combine(condition, MatchOp::True, Vec::new())
    }

    pub(crate) fn combine(condition: ConditionId, op: MatchOp, subs: Vec<TreeMatch>) -> Self {
        Self {
            condition,
            op,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            vars: BTreeMap::new(),
            subs,
        }
    }

    /// Image of a pattern node.
    pub fn node(&self, node: PNodeId) -> Option<&NodeImage> {
        self.nodes.get(&node)
    }

    /// Image of a pattern edge.
    pub fn edge(&self, edge: PEdgeId) -> Option<EdgeId> {
        self.edges.get(&edge).copied()
    }

    /// Value of a variable.
    pub fn var(&self, var: PVarId) -> Option<LabelId> {
        self.vars.get(&var).copied()
    }

    /// The nested match of sub-condition `condition`, if any.
    pub fn sub(&self, condition: ConditionId) -> Option<&TreeMatch> {
        self.subs.iter().find(|m| m.condition == condition)
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        write!(f, "{pad}{} {:?}", self.condition, self.op)?;
        for (p, image) in &self.nodes {
            write!(f, " {p}={image}")?;
        }
        for (e, image) in &self.edges {
            write!(f, " {e}=#{}", image.0)?;
        }
        for (v, label) in &self.vars {
            write!(f, " {v}=#{}", label.0)?;
        }
        writeln!(f)?;
        for sub in &self.subs {
            sub.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for TreeMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
