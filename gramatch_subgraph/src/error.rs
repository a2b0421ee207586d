//! Plan compilation and search errors.
//!
//! Running out of matches is not an error: `Search::find` reports it as
//! `Ok(false)`. The variants here signal misuse or broken invariants.

use thiserror::Error;

use gramatch_common::ConditionId;

/// Errors raised while compiling a search plan.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Condition {condition}: no order satisfies the needs of {item}")]
    Unsatisfiable { condition: ConditionId, item: String },
    #[error("Condition {condition}: {element} is never bound")]
    Unbound {
        condition: ConditionId,
        element: String,
    },
    #[error("Unknown condition {0}")]
    UnknownCondition(ConditionId),
    #[error("Invalid anchor: {0}")]
    InvalidAnchor(String),
    #[error("Search plan is fixed and cannot be modified")]
    Fixed,
}

/// Errors raised while executing a search.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search invariant violated: {0}")]
    Invariant(String),
    #[error("Seed map misses anchored element {0}")]
    MissingSeed(String),
    #[error("Seed map binds {0}, which is not anchored")]
    UnexpectedSeed(String),
    #[error("Host graph and pattern use different type graphs")]
    TypeGraphMismatch,
    #[error("Plan error: {0}")]
    Plan(#[from] PlanError),
}

impl SearchError {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        SearchError::Invariant(message.into())
    }
}
