//! Backtracking execution of a compiled plan over one host graph.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use gramatch_common::{DedupeMode, EdgeId, HostGraph, LabelId, NodeImage};

use crate::anchor::SeedMap;
use crate::error::SearchError;
use crate::matches::{MatchOp, TreeMatch};
use crate::plan::SearchPlan;
use crate::profiling::Timer;
use crate::record::Record;
use crate::state::State;

/// The relevant bindings of a match, used to suppress duplicates.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct Signature {
    nodes: Vec<Option<NodeImage>>,
    edges: Vec<Option<EdgeId>>,
    vars: Vec<Option<LabelId>>,
    slots: Vec<Option<TreeMatch>>,
}

/// One execution of a [`SearchPlan`] on a host graph.
///
/// `find` enumerates matches one at a time; `get_match` snapshots the current
/// one. A plan with a non-empty anchor must be seeded with
/// [`Search::initialise`] before the first `find`.
pub struct Search<'g> {
    plan: &'g SearchPlan,
    host: &'g HostGraph,
    state: State<'g>,
    records: Vec<Option<Box<dyn Record<'g> + 'g>>>,
    // Positions `0..=last_singular` jointly have at most one image.
    last_singular: isize,
    seeds: SeedMap,
    seeded: bool,
    found: bool,
    exhausted: bool,
    // Signatures of the reported matches, kept only when trailing rollback
    // alone cannot rule out duplicates.
    seen: Option<HashSet<Signature>>,
}

impl<'g> Search<'g> {
    /// Prepare a search of `plan` on `host`.
    #[contracts::debug_requires(plan.is_fixed())]
    pub fn new(plan: &'g SearchPlan, host: &'g HostGraph) -> Result<Self, SearchError> {
        if !Arc::ptr_eq(plan.pattern().types(), host.types()) {
            return Err(SearchError::TypeGraphMismatch);
        }

        let last_singular = plan
            .items()
            .iter()
            .take_while(|item| item.is_singular(host))
            .count() as isize
            - 1;

        // Only a position with several images that differ outside the
        // signature, followed by a relevant one, can repeat a match.
        let last_relevant = (0..plan.len()).rev().find(|&ix| plan.is_relevant(ix));
        let tracks_duplicates = plan.config().dedupe == DedupeMode::Relevant
            && last_relevant.is_some_and(|last| {
                (0..=last).any(|ix| plan.binds_irrelevant(ix) && !plan.items()[ix].is_singular(host))
            });

        Ok(Self {
            plan,
            host,
            state: State::new(host, plan.pattern(), plan.config()),
            records: (0..plan.len()).map(|_| None).collect(),
            last_singular,
            seeds: SeedMap::new(),
            seeded: plan.anchor().is_empty(),
            found: false,
            exhausted: false,
            seen: tracks_duplicates.then(HashSet::new),
        })
    }

    /// Let the nodes this search binds take the images of the seeded nodes.
    ///
    /// Negative conditions look for any extension of the outer match, so
    /// their fresh nodes are only kept apart from each other.
    pub(crate) fn sharing_seeds(mut self) -> Self {
        self.state.share_seeds();
        self
    }

    /// The plan being executed.
    pub fn plan(&self) -> &'g SearchPlan {
        self.plan
    }

    /// Install the images of the anchored elements and restart the search.
    pub fn initialise(&mut self, seeds: &SeedMap) -> Result<(), SearchError> {
        let anchor = self.plan.anchor();
        let pattern = self.plan.pattern();

        for &node in anchor.nodes() {
            let image = seeds
                .node(node)
                .ok_or_else(|| SearchError::MissingSeed(pattern.node(node).name.clone()))?;
            if !self.host.contains_image(image) {
                return Err(SearchError::UnexpectedSeed(format!("{node} -> {image}")));
            }
        }
        for &edge in anchor.edges() {
            let image = seeds
                .edge(edge)
                .ok_or_else(|| SearchError::MissingSeed(format!("{edge}")))?;
            if !self.host.contains_edge(image) {
                return Err(SearchError::UnexpectedSeed(format!("{edge} -> #{}", image.0)));
            }
        }
        for &var in anchor.vars() {
            if seeds.var(var).is_none() {
                return Err(SearchError::MissingSeed(pattern.var(var).name.clone()));
            }
        }
        if let Some((node, _)) = seeds.nodes().find(|(n, _)| !anchor.contains_node(*n)) {
            return Err(SearchError::UnexpectedSeed(format!("{node}")));
        }
        if let Some((edge, _)) = seeds.edges().find(|(e, _)| !anchor.contains_edge(*e)) {
            return Err(SearchError::UnexpectedSeed(format!("{edge}")));
        }
        if let Some((var, _)) = seeds.vars().find(|(v, _)| !anchor.contains_var(*v)) {
            return Err(SearchError::UnexpectedSeed(format!("{var}")));
        }

        self.seeds.clone_from(seeds);
        self.seeded = true;
        self.restart();
        Ok(())
    }

    /// Restart the search with the current seeds.
    pub fn reset(&mut self) {
        self.restart();
    }

    fn restart(&mut self) {
        for record in self.records.iter_mut().rev().flatten() {
            record.reset(&mut self.state);
        }
        self.state.clear();
        for (node, image) in self.seeds.nodes() {
            self.state.seed_node(node, image.clone());
        }
        for (edge, image) in self.seeds.edges() {
            self.state.seed_edge(edge, image);
        }
        for (var, label) in self.seeds.vars() {
            self.state.seed_var(var, label);
        }
        self.found = false;
        self.exhausted = false;
        if let Some(seen) = self.seen.as_mut() {
            seen.clear();
        }
    }

    /// Advance to the next match. `Ok(false)` once the search is exhausted,
    /// until the next `reset` or `initialise`.
    pub fn find(&mut self) -> Result<bool, SearchError> {
        let _t = Timer::new("search::find");
        if !self.seeded {
            let missing = self.plan.anchor().nodes().first().map_or_else(
                || "anchor".to_owned(),
                |n| self.plan.pattern().node(*n).name.clone(),
            );
            return Err(SearchError::MissingSeed(missing));
        }
        loop {
            if self.exhausted {
                return Ok(false);
            }
            let start = if self.found { self.rollback() } else { 0 };
            let resumed = self.found;
            self.found = false;
            if (resumed && start <= self.last_singular) || !self.drive(start)? {
                self.exhausted = true;
                trace!("search of {} exhausted", self.plan.condition());
                return Ok(false);
            }
            self.found = true;
            let fresh = match self.seen.is_some().then(|| self.signature()) {
                Some(signature) => self.seen.as_mut().is_some_and(|seen| seen.insert(signature)),
                None => true,
            };
            if fresh {
                return Ok(true);
            }
            trace!("duplicate match of {} suppressed", self.plan.condition());
        }
    }

    /// Release the trailing irrelevant positions of the last match, returning
    /// the position to advance.
    fn rollback(&mut self) -> isize {
        let mut position = self.plan.len() as isize - 1;
        if self.plan.config().dedupe == DedupeMode::Relevant {
            while position >= 0 && !self.plan.is_relevant(position as usize) {
                if let Some(record) = self.records[position as usize].as_mut() {
                    record.repeat(&mut self.state);
                }
                position -= 1;
            }
        }
        position
    }

    /// Drive the plan forward from `position` until a full match is bound
    /// (`true`) or the search space is exhausted (`false`).
    fn drive(&mut self, mut position: isize) -> Result<bool, SearchError> {
        let plan = self.plan;
        let host = self.host;
        let len = plan.len() as isize;
        loop {
            if position < 0 {
                return Ok(false);
            }
            if position == len {
                return Ok(true);
            }
            let ix = position as usize;
            let item = &plan.items()[ix];
            let record = self.records[ix].get_or_insert_with(|| item.create_record(host));
            let advanced = {
                let _t = Timer::new(item.kind().timer_label());
                record.next(&mut self.state)?
            };
            if advanced {
                for &j in plan.influence(ix) {
                    if let Some(later) = self.records[j].as_mut() {
                        later.reset(&mut self.state);
                    }
                }
                position += 1;
                continue;
            }

            let target = if record.is_empty() {
                plan.dependency(ix).map_or(-1, |d| d as isize)
            } else {
                position - 1
            };
            trace!("position {ix} failed, back to {target}");
            for j in (target + 1)..position {
                if let Some(skipped) = self.records[j as usize].as_mut() {
                    skipped.repeat(&mut self.state);
                }
            }
            if target <= self.last_singular {
                return Ok(false);
            }
            position = target;
        }
    }

    fn signature(&self) -> Signature {
        let pattern = self.plan.pattern();
        let cond = pattern.condition(self.plan.condition());
        Signature {
            nodes: cond
                .nodes
                .iter()
                .filter(|n| pattern.node(**n).relevant)
                .map(|n| self.state.node(*n).cloned())
                .collect(),
            edges: cond
                .edges
                .iter()
                .filter(|e| pattern.edge(**e).relevant)
                .map(|e| self.state.edge(*e))
                .collect(),
            vars: cond.vars.iter().map(|v| self.state.var(*v)).collect(),
            slots: cond
                .children
                .iter()
                .map(|c| self.state.slot(*c).cloned())
                .collect(),
        }
    }

    /// Number of match signatures held for duplicate suppression.
    pub fn tracked_signatures(&self) -> usize {
        self.seen.as_ref().map_or(0, HashSet::len)
    }

    /// Snapshot of the current match, `None` unless the last `find` succeeded.
    pub fn get_match(&self) -> Option<TreeMatch> {
        if !self.found || self.exhausted {
            return None;
        }
        let pattern = self.plan.pattern();
        let cond = pattern.condition(self.plan.condition());
        let mut result = TreeMatch::combine(cond.id, MatchOp::Some, Vec::new());
        for &node in cond.nodes.iter().chain(&cond.root_nodes) {
            if let Some(image) = self.state.node(node) {
                result.nodes.insert(node, image.clone());
            }
        }
        for &edge in &cond.edges {
            if let Some(image) = self.state.edge(edge) {
                result.edges.insert(edge, image);
            }
        }
        for &var in cond.vars.iter().chain(&cond.root_vars) {
            if let Some(label) = self.state.var(var) {
                result.vars.insert(var, label);
            }
        }
        result.subs = cond
            .children
            .iter()
            .filter_map(|c| self.state.slot(*c).cloned())
            .collect();
        Some(result)
    }
}
