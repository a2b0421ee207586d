//! Shared model types for the gramatch workspace.
//!
//! This crate provides the type graph, data algebra, regular label
//! expressions, host graphs, rule patterns with nested conditions and the match
//! configuration consumed by the matching engine in `gramatch_subgraph`.

mod algebra;
mod config;
mod error;
mod host;
mod pattern;
mod regex;
mod types;

pub use crate::algebra::*;
pub use crate::config::*;
pub use crate::error::*;
pub use crate::host::*;
pub use crate::pattern::*;
pub use crate::regex::*;
pub use crate::types::*;
