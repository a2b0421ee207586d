//! Item comparators of the greedy plan compiler.

use std::cmp::Ordering;
use std::collections::HashMap;

use gramatch_common::{Config, LabelId, PNodeId, Pattern};

use crate::item::{Part, PartSet, SearchItem};

/// One criterion of the lexicographic item preference, most significant first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparator {
    /// Items whose needed parts are bound beat all others.
    NeededParts,
    /// Higher ranked item kinds first.
    Kind,
    /// Items introducing fewer unbound nodes first.
    ConnectedParts,
    /// Rare labels first, common labels last.
    Frequency,
    /// Edges from low indegree sources into high indegree targets first.
    Indegree,
}

impl Comparator {
    /// The order used by [`crate::MatcherFactory`].
    pub const DEFAULT: [Comparator; 5] = [
        Comparator::NeededParts,
        Comparator::Kind,
        Comparator::ConnectedParts,
        Comparator::Frequency,
        Comparator::Indegree,
    ];

    /// `Greater` when `a` should be scheduled before `b`.
    pub(crate) fn compare(self, ctx: &Context, a: &SearchItem, b: &SearchItem) -> Ordering {
        match self {
            Comparator::NeededParts => ctx.is_ready(a).cmp(&ctx.is_ready(b)),
            Comparator::Kind => a.kind().rank().cmp(&b.kind().rank()),
            Comparator::ConnectedParts => ctx.unbound_nodes(b).cmp(&ctx.unbound_nodes(a)),
            Comparator::Frequency => ctx.frequency(a).cmp(&ctx.frequency(b)),
            Comparator::Indegree => ctx.indegree_score(a).cmp(&ctx.indegree_score(b)),
        }
    }
}

/// Compiler-local state the comparators read.
pub(crate) struct Context {
    bound: PartSet,
    // Unscheduled edge-like items entering each pattern node.
    indegree: Vec<i64>,
    rare: HashMap<LabelId, i64>,
    common: HashMap<LabelId, i64>,
}

impl Context {
    pub(crate) fn new(pattern: &Pattern, config: &Config, candidates: &[SearchItem]) -> Self {
        let types = pattern.types();
        let ranked = |labels: &[String]| -> HashMap<LabelId, i64> {
            let len = labels.len() as i64;
            labels
                .iter()
                .enumerate()
                .filter_map(|(ix, name)| types.edge_label(name).map(|l| (l, len - ix as i64)))
                .collect()
        };

        let mut indegree = vec![0; pattern.node_count()];
        for item in candidates {
            if let Some((_, target)) = item.ends() {
                indegree[target.index()] += 1;
            }
        }

        Self {
            bound: PartSet::new(pattern),
            indegree,
            rare: ranked(&config.rare_labels),
            common: ranked(&config.common_labels),
        }
    }

    pub(crate) fn is_bound(&self, part: Part) -> bool {
        self.bound.contains(part)
    }

    pub(crate) fn is_ready(&self, item: &SearchItem) -> bool {
        item.needs().into_iter().all(|p| self.bound.contains(p))
    }

    fn unbound_nodes(&self, item: &SearchItem) -> usize {
        item.binds()
            .into_iter()
            .filter(|&p| matches!(p, Part::Node(_)) && !self.bound.contains(p))
            .count()
    }

    fn frequency(&self, item: &SearchItem) -> i64 {
        match item.label() {
            Some(label) => match (self.rare.get(&label), self.common.get(&label)) {
                (Some(rank), _) => *rank,
                (None, Some(rank)) => -rank,
                (None, None) => 0,
            },
            None => 0,
        }
    }

    fn indegree_of(&self, node: PNodeId) -> i64 {
        self.indegree[node.index()]
    }

    fn indegree_score(&self, item: &SearchItem) -> i64 {
        match item.ends() {
            Some((source, target)) => self.indegree_of(target) - self.indegree_of(source),
            None => 0,
        }
    }

    /// Record the selection of `item`: its parts are bound and its edge no
    /// longer counts towards the indegree of its target.
    pub(crate) fn select(&mut self, item: &SearchItem) {
        for part in item.binds() {
            self.bound.insert(part);
        }
        if let Some((_, target)) = item.ends() {
            self.indegree[target.index()] -= 1;
        }
    }
}
