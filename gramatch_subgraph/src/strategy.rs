//! Caller-facing matching surface: compiled strategies and their factory.

use std::ops::ControlFlow;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use gramatch_common::{ConditionId, Config, HostGraph, Pattern};

use crate::anchor::{Anchor, SeedMap};
use crate::error::{PlanError, SearchError};
use crate::matches::TreeMatch;
use crate::plan::{Comparator, SearchPlan, compile};
use crate::search::Search;

/// Receives the matches of a traversal.
pub trait Visitor {
    /// Result of the traversal.
    type Output;

    /// Handle one match; `Break` stops the traversal.
    fn visit(&mut self, found: TreeMatch) -> ControlFlow<()>;

    /// Produce the result once the traversal has stopped.
    fn finish(self) -> Self::Output;
}

/// Collects every match.
#[derive(Clone, Debug, Default)]
pub struct Collect {
    matches: Vec<TreeMatch>,
    limit: Option<usize>,
}

impl Collect {
    /// Collect at most `limit` matches.
    pub fn limited(limit: usize) -> Self {
        Self {
            matches: Vec::new(),
            limit: Some(limit),
        }
    }
}

impl Visitor for Collect {
    type Output = Vec<TreeMatch>;

    fn visit(&mut self, found: TreeMatch) -> ControlFlow<()> {
        self.matches.push(found);
        match self.limit {
            Some(limit) if self.matches.len() >= limit => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn finish(self) -> Vec<TreeMatch> {
        self.matches
    }
}

/// Counts the matches.
#[derive(Clone, Copy, Debug, Default)]
pub struct Count(usize);

impl Visitor for Count {
    type Output = usize;

    fn visit(&mut self, _found: TreeMatch) -> ControlFlow<()> {
        self.0 += 1;
        ControlFlow::Continue(())
    }

    fn finish(self) -> usize {
        self.0
    }
}

/// Adapts a closure; the output is the number of matches visited.
pub struct FnVisitor<F> {
    f: F,
    visited: usize,
}

impl<F> FnVisitor<F>
where
    F: FnMut(TreeMatch) -> ControlFlow<()>,
{
    /// Wrap `f`.
    pub fn new(f: F) -> Self {
        Self { f, visited: 0 }
    }
}

impl<F> Visitor for FnVisitor<F>
where
    F: FnMut(TreeMatch) -> ControlFlow<()>,
{
    type Output = usize;

    fn visit(&mut self, found: TreeMatch) -> ControlFlow<()> {
        self.visited += 1;
        (self.f)(found)
    }

    fn finish(self) -> usize {
        self.visited
    }
}

/// A compiled plan ready to be searched on any host graph over its type graph.
#[derive(Debug)]
pub struct SearchStrategy {
    plan: Arc<SearchPlan>,
}

impl SearchStrategy {
    pub(crate) fn new(plan: Arc<SearchPlan>) -> Self {
        Self { plan }
    }

    /// The compiled plan.
    pub fn plan(&self) -> &SearchPlan {
        &self.plan
    }

    /// A fresh search on `host` for incremental control.
    pub fn search<'g>(&'g self, host: &'g HostGraph) -> Result<Search<'g>, SearchError> {
        Search::new(&self.plan, host)
    }

    /// Feed every match on `host` under `seeds` to `visitor` until it stops.
    pub fn traverse<V: Visitor>(
        &self,
        host: &HostGraph,
        seeds: &SeedMap,
        mut visitor: V,
    ) -> Result<V::Output, SearchError> {
        let mut search = self.search(host)?;
        search.initialise(seeds)?;
        let mut visited = 0usize;
        while search.find()? {
            let Some(found) = search.get_match() else {
                break;
            };
            visited += 1;
            if visitor.visit(found).is_break() {
                break;
            }
        }
        debug!("traversed {visited} matches of {}", self.plan.condition());
        Ok(visitor.finish())
    }

    /// All matches on `host` under `seeds`.
    pub fn find_all(&self, host: &HostGraph, seeds: &SeedMap) -> Result<Vec<TreeMatch>, SearchError> {
        self.traverse(host, seeds, Collect::default())
    }

    /// The first match on `host` under `seeds`.
    pub fn find_first(&self, host: &HostGraph, seeds: &SeedMap) -> Result<Option<TreeMatch>, SearchError> {
        Ok(self.traverse(host, seeds, Collect::limited(1))?.into_iter().next())
    }

    /// Number of matches on `host` under `seeds`.
    pub fn count(&self, host: &HostGraph, seeds: &SeedMap) -> Result<usize, SearchError> {
        self.traverse(host, seeds, Count::default())
    }

    /// All matches on each of `hosts`, searched concurrently with one search per host.
    #[cfg(feature = "rayon")]
    pub fn find_all_par(&self, hosts: &[&HostGraph], seeds: &SeedMap) -> Vec<Result<Vec<TreeMatch>, SearchError>> {
        hosts.par_iter().map(|host| self.find_all(host, seeds)).collect()
    }
}

/// Compiles and caches search strategies for the conditions of one pattern.
pub struct MatcherFactory {
    pattern: Arc<Pattern>,
    config: Arc<Config>,
    comparators: Vec<Comparator>,
    cache: DashMap<(ConditionId, Anchor), Arc<SearchStrategy>>,
}

impl MatcherFactory {
    /// A factory using the default comparator order.
    pub fn new(pattern: Arc<Pattern>, config: Arc<Config>) -> Self {
        Self {
            pattern,
            config,
            comparators: Comparator::DEFAULT.to_vec(),
            cache: DashMap::new(),
        }
    }

    /// Replace the comparator chain; clears the cache.
    pub fn with_comparators(mut self, comparators: impl IntoIterator<Item = Comparator>) -> Self {
        self.comparators = comparators.into_iter().collect();
        self.cache.clear();
        self
    }

    /// The pattern matched.
    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.pattern
    }

    /// The match options.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The strategy for `condition` with the elements of `anchor` pre-matched.
    pub fn create_matcher(&self, condition: ConditionId, anchor: Anchor) -> Result<Arc<SearchStrategy>, PlanError> {
        let key = (condition, anchor);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(Arc::clone(hit.value()));
        }
        let plan = compile(&self.pattern, &self.config, condition, key.1.clone(), &self.comparators)?;
        info!("caching strategy for {condition} ({} positions)", plan.len());
        let strategy = Arc::new(SearchStrategy::new(Arc::new(plan)));
        let entry = self.cache.entry(key).or_insert(strategy);
        Ok(Arc::clone(entry.value()))
    }

    /// The strategy for the whole pattern without pre-matched elements.
    pub fn root_matcher(&self) -> Result<Arc<SearchStrategy>, PlanError> {
        self.create_matcher(self.pattern.root(), Anchor::empty())
    }

    /// Number of cached strategies.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}
