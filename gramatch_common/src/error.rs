//! Errors raised while building the model: type graphs, host graphs, patterns
//! and configuration.

use thiserror::Error;

use crate::algebra::{Operator, Sort};
use crate::host::NodeId;
use crate::pattern::{ConditionId, PEdgeId, PNodeId, PVarId};
use crate::types::LabelId;

/// Type graph construction errors.
#[derive(Debug, Error)]
pub enum TypeError {
    #[error("Cyclic subtype relation through '{0}'")]
    CyclicSubtype(String),
}

/// Host graph construction errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),
    #[error("Label {0:?} is not a node type")]
    NotANodeType(LabelId),
    #[error("Label {0:?} is not an edge label")]
    NotAnEdgeLabel(LabelId),
    #[error("Unknown host node {0:?}")]
    UnknownNode(NodeId),
}

/// Pattern construction and validation errors.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Unknown condition {0}")]
    UnknownCondition(ConditionId),
    #[error("Unknown pattern node {0}")]
    UnknownNode(PNodeId),
    #[error("Unknown pattern edge {0}")]
    UnknownEdge(PEdgeId),
    #[error("Unknown variable {0}")]
    UnknownVar(PVarId),
    #[error("Unknown label '{0}'")]
    UnknownLabel(String),
    #[error("'{element}' is not visible from condition {condition}")]
    NotVisible {
        element: String,
        condition: ConditionId,
    },
    #[error("Variable '{0}' is used with the wrong kind")]
    VarKindMismatch(String),
    #[error("Pattern node {0} is not a value node")]
    NotAValueNode(PNodeId),
    #[error("Value node {0} cannot carry a type variable")]
    TypeVarOnValueNode(PNodeId),
    #[error("Operator {op:?} takes {expected} arguments, got {actual}")]
    ArityMismatch {
        op: Operator,
        expected: usize,
        actual: usize,
    },
    #[error("Node {node} has sort {actual:?}, expected {expected:?}")]
    SortMismatch {
        node: PNodeId,
        expected: Sort,
        actual: Sort,
    },
    #[error("Condition {child} is not a direct child of {parent}")]
    NotAChild {
        parent: ConditionId,
        child: ConditionId,
    },
    #[error("Cannot aggregate over negated condition {0}")]
    NegatedAggregate(ConditionId),
    #[error("Invalid count node '{0}'")]
    InvalidCountNode(String),
    #[error("Variable '{0}' is never bound in its own condition")]
    UnboundVariable(String),
    #[error("Value node '{0}' is never bound in its own condition")]
    UnboundValueNode(String),
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Label '{0}' is listed as both rare and common")]
    ConflictingPriority(String),
}
