//! Compiled search plans.
//!
//! A [`SearchPlan`] is the ordered list of search items of one condition,
//! together with the bookkeeping the search execution needs to backtrack
//! efficiently: the dependency of every position (where to jump when its
//! record runs empty) and the positions it influences (whose records must be
//! reset when it produces a new image).

mod comparator;
mod compiler;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use gramatch_common::{ConditionId, Config, Pattern, Quantifier};

pub use comparator::Comparator;
pub(crate) use compiler::compile;

use crate::anchor::Anchor;
use crate::error::PlanError;
use crate::item::{Part, SearchItem};

/// An ordered, append-only list of search items with dependency metadata.
#[derive(Debug)]
pub struct SearchPlan {
    pattern: Arc<Pattern>,
    config: Arc<Config>,
    condition: ConditionId,
    anchor: Anchor,
    items: Vec<SearchItem>,
    relevant: Vec<bool>,
    // Whether each position binds a part outside the match signature.
    binds_irrelevant: Vec<bool>,
    dependency: Vec<Option<usize>>,
    // Direct influence while appending; transitive once fixed.
    influence: Vec<Vec<usize>>,
    // Position of the item binding each part.
    binders: HashMap<Part, usize>,
    // Latest position binding a fresh non-value node.
    last_node_binder: Option<usize>,
    fixed: bool,
}

impl SearchPlan {
    pub(crate) fn new(pattern: Arc<Pattern>, config: Arc<Config>, condition: ConditionId, anchor: Anchor) -> Self {
        Self {
            pattern,
            config,
            condition,
            anchor,
            items: Vec::new(),
            relevant: Vec::new(),
            binds_irrelevant: Vec::new(),
            dependency: Vec::new(),
            influence: Vec::new(),
            binders: HashMap::new(),
            last_node_binder: None,
            fixed: false,
        }
    }

    /// Append `item`, activating it against the parts bound so far.
    ///
    /// Returns the position of the item.
    pub(crate) fn push(&mut self, mut item: SearchItem, relevant: bool) -> Result<usize, PlanError> {
        if self.fixed {
            return Err(PlanError::Fixed);
        }
        let position = self.items.len();
        item.activate(&|part| self.binders.contains_key(&part));

        let binds = item.binds();
        let reads = item
            .needs()
            .into_iter()
            .chain(binds.iter().copied().filter(|p| self.binders.contains_key(p)));
        let mut sources: Vec<usize> = reads.filter_map(|p| self.binders.get(&p).copied()).collect();

        let fresh: Vec<Part> = binds
            .into_iter()
            .filter(|p| !self.binders.contains_key(p))
            .collect();
        // Under injective matching any fresh node may collide with an earlier one.
        let binds_nodes = fresh.iter().any(|p| match p {
            Part::Node(n) => !self.pattern.node(*n).is_value(),
            _ => false,
        });
        let binds_irrelevant = fresh.iter().any(|&p| !part_is_relevant(&self.pattern, p));
        if self.config.injective && binds_nodes {
            sources.extend(self.last_node_binder);
        }
        sources.sort_unstable();
        sources.dedup();

        for &source in &sources {
            self.influence[source].push(position);
        }
        for part in fresh {
            self.binders.insert(part, position);
        }
        if binds_nodes {
            self.last_node_binder = Some(position);
        }

        self.dependency.push(sources.last().copied());
        self.influence.push(Vec::new());
        self.relevant.push(relevant);
        self.binds_irrelevant.push(binds_irrelevant);
        self.items.push(item);
        Ok(position)
    }

    /// Freeze the plan and close the influence relation transitively.
    pub(crate) fn fix(&mut self) -> Result<(), PlanError> {
        if self.fixed {
            return Err(PlanError::Fixed);
        }
        for position in (0..self.items.len()).rev() {
            let mut closure = self.influence[position].clone();
            for &next in &self.influence[position] {
                closure.extend(self.influence[next].iter().copied());
            }
            closure.sort_unstable();
            closure.dedup();
            self.influence[position] = closure;
        }
        self.fixed = true;
        Ok(())
    }

    /// The pattern this plan searches.
    pub fn pattern(&self) -> &Arc<Pattern> {
        &self.pattern
    }

    /// The match options the plan was compiled for.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The condition this plan searches.
    pub fn condition(&self) -> ConditionId {
        self.condition
    }

    /// Elements pre-matched by the caller.
    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Items in search order.
    pub fn items(&self) -> &[SearchItem] {
        &self.items
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the plan has no positions.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Nearest earlier position whose image the item at `position` reads.
    pub fn dependency(&self, position: usize) -> Option<usize> {
        self.dependency[position]
    }

    /// Later positions that must search afresh when `position` produces a new image.
    pub fn influence(&self, position: usize) -> &[usize] {
        &self.influence[position]
    }

    /// Whether the item at `position` binds an observable part of the match.
    pub fn is_relevant(&self, position: usize) -> bool {
        self.relevant[position]
    }

    /// Whether the item at `position` binds a part that no match signature
    /// records, so that two of its images may yield the same relevant match.
    pub fn binds_irrelevant(&self, position: usize) -> bool {
        self.binds_irrelevant[position]
    }

    /// Position of the item binding `part`.
    pub fn binder(&self, part: Part) -> Option<usize> {
        self.binders.get(&part).copied()
    }

    /// Whether the plan is frozen.
    pub fn is_fixed(&self) -> bool {
        self.fixed
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "    ".repeat(depth);
        let cond = self.pattern.condition(self.condition);
        writeln!(f, "{pad}plan {} ({}):", cond.name, self.condition)?;
        for (ix, item) in self.items.iter().enumerate() {
            let dep = self.dependency[ix].map_or_else(|| "-".to_owned(), |d| d.to_string());
            writeln!(
                f,
                "{pad}  {ix:>3} {:<10} dep={dep:<3} {}{} {}",
                format!("{:?}", item.kind()),
                if item.is_singular_on_simple_host() { "1" } else { "*" },
                if self.relevant[ix] { " " } else { "~" },
                item.describe(&self.pattern),
            )?;
            if let SearchItem::Condition(inner) = item {
                if let Some(plan) = inner.plan() {
                    plan.fmt_indented(f, depth + 1)?;
                }
            }
        }
        Ok(())
    }
}

/// Whether `part` is observable in a match signature.
pub(crate) fn part_is_relevant(pattern: &Pattern, part: Part) -> bool {
    match part {
        Part::Node(n) => pattern.node(n).relevant,
        Part::Edge(e) => pattern.edge(e).relevant,
        Part::Var(_) => true,
        Part::Slot(c) => matches!(
            pattern.condition(c).quantifier,
            Quantifier::Exists | Quantifier::Forall { .. }
        ),
    }
}

impl fmt::Display for SearchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use gramatch_common::TypeGraph;
    use rstest::rstest;

    use super::*;

    fn single_edge_plan(irrelevant_target: bool) -> SearchPlan {
        let mut tb = TypeGraph::builder();
        tb.node_type("T");
        tb.edge_label("r");
        let types = Arc::new(tb.build().unwrap());

        let mut b = Pattern::builder(types);
        let root = b.root();
        let x = b.node(root, "x", "T").unwrap();
        let y = b.node(root, "y", "T").unwrap();
        b.edge(root, x, "r", y).unwrap();
        if irrelevant_target {
            b.irrelevant_node(y).unwrap();
        }
        let pattern = b.build().unwrap();
        let config = Arc::new(Config::default());
        compile(&pattern, &config, pattern.root(), Anchor::empty(), &Comparator::DEFAULT).unwrap()
    }

    #[test]
    fn fixed_plans_reject_mutation() {
        let mut plan = single_edge_plan(false);
        assert!(plan.is_fixed());
        let item = plan.items()[0].clone();
        assert!(matches!(plan.push(item, true), Err(PlanError::Fixed)));
        assert!(matches!(plan.fix(), Err(PlanError::Fixed)));
        assert_eq!(plan.len(), 1);
    }

    #[rstest]
    #[case::all_relevant(false, false)]
    #[case::irrelevant_target(true, true)]
    fn irrelevant_bindings_are_recorded(#[case] irrelevant_target: bool, #[case] expected: bool) {
        let plan = single_edge_plan(irrelevant_target);
        assert!(plan.is_relevant(0));
        assert_eq!(plan.binds_irrelevant(0), expected);
    }
}
