//! Search-plan based subgraph matching of graph-transformation patterns.
//!
//! A pattern condition is compiled once into a [`SearchPlan`], an ordered list
//! of search items with dependency metadata, and executed by [`Search`] as a
//! pull-based backtracking iterator over a host graph. Nested quantified
//! conditions evaluate as recursive sub-searches.
//!
//! ```ignore
//! let factory = MatcherFactory::new(pattern, Arc::new(Config::default()));
//! let strategy = factory.root_matcher()?;
//! for m in strategy.find_all(&host, &SeedMap::new())? {
//!     println!("{m}");
//! }
//! ```

mod anchor;
mod error;
mod item;
mod matches;
mod plan;
mod record;
mod search;
mod state;
mod strategy;

pub mod profiling;

pub use anchor::{Anchor, SeedMap};
pub use error::{PlanError, SearchError};
pub use item::{ItemKind, Part, SearchItem};
pub use matches::{MatchOp, TreeMatch};
pub use plan::{Comparator, SearchPlan};
pub use search::Search;
pub use strategy::{Collect, Count, FnVisitor, MatcherFactory, SearchStrategy, Visitor};
