//! Nested quantified conditions and negated items.
//!
//! A condition item owns the compiled plan of its sub-condition and, per
//! record, a lazily created sub-search. Each evaluation seeds the sub-search
//! with the current images of the condition's roots and drains it.

use std::sync::Arc;

use gramatch_common::{ConditionId, HostGraph, NodeImage, PNodeId, PVarId, Quantifier};

use super::{Part, SearchItem};
use crate::anchor::SeedMap;
use crate::error::SearchError;
use crate::matches::{MatchOp, TreeMatch};
use crate::plan::SearchPlan;
use crate::record::{Probe, Record, SingularProbe, SingularRecord};
use crate::search::Search;
use crate::state::State;

/// Evaluates a sub-condition and stores its combined match in the condition slot.
#[derive(Clone, Debug)]
pub struct ConditionItem {
    pub(crate) condition: ConditionId,
    pub(crate) quantifier: Quantifier,
    // `None` for trivially true conditions.
    plan: Option<Arc<SearchPlan>>,
    root_nodes: Vec<PNodeId>,
    root_vars: Vec<PVarId>,
    count: Option<PNodeId>,
    count_found: bool,
}

impl ConditionItem {
    pub(crate) fn new(
        condition: ConditionId,
        quantifier: Quantifier,
        plan: Option<Arc<SearchPlan>>,
        root_nodes: Vec<PNodeId>,
        root_vars: Vec<PVarId>,
        count: Option<PNodeId>,
    ) -> Self {
        Self {
            condition,
            quantifier,
            plan,
            root_nodes,
            root_vars,
            count,
            count_found: false,
        }
    }

    /// The compiled plan of the sub-condition.
    pub(crate) fn plan(&self) -> Option<&SearchPlan> {
        self.plan.as_deref()
    }

    pub(crate) fn roots(&self) -> Vec<Part> {
        if self.plan.is_none() {
            return Vec::new();
        }
        let nodes = self.root_nodes.iter().map(|&n| Part::Node(n));
        nodes.chain(self.root_vars.iter().map(|&v| Part::Var(v))).collect()
    }

    pub(crate) fn binds(&self) -> Vec<Part> {
        let mut parts = vec![Part::Slot(self.condition)];
        parts.extend(self.count.map(Part::Node));
        parts
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.count_found = self.count.is_some_and(|n| found(Part::Node(n)));
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(ConditionProbe {
            item: self,
            sub: None,
            seeds: SeedMap::new(),
        }))
    }
}

struct ConditionProbe<'g> {
    item: &'g ConditionItem,
    sub: Option<Search<'g>>,
    seeds: SeedMap,
}

impl<'g> ConditionProbe<'g> {
    /// Drain the sub-search seeded with the current root images.
    fn evaluate(&mut self, plan: &'g SearchPlan, state: &State<'g>) -> Result<Vec<TreeMatch>, SearchError> {
        let mut sub = match self.sub.take() {
            Some(sub) => sub,
            None if self.item.quantifier == Quantifier::Not => Search::new(plan, state.host)?.sharing_seeds(),
            None => Search::new(plan, state.host)?,
        };

        self.seeds.clear();
        for &node in plan.anchor().nodes() {
            self.seeds.insert_node(node, state.found_node(node)?.clone());
        }
        for &var in plan.anchor().vars() {
            self.seeds.insert_var(var, state.found_var(var)?);
        }
        sub.initialise(&self.seeds)?;

        let mut matches = Vec::new();
        while sub.find()? {
            matches.extend(sub.get_match());
            if self.item.quantifier == Quantifier::Not {
                break;
            }
        }
        self.sub = Some(sub);
        Ok(matches)
    }
}

impl<'g> Probe<'g> for ConditionProbe<'g> {
    type Image = (TreeMatch, Option<NodeImage>);

    fn write(&mut self, state: &mut State<'g>, image: &Self::Image) -> Result<bool, SearchError> {
        let (result, count) = image;
        if let (Some(node), Some(count)) = (self.item.count, count) {
            let written = if self.item.count_found {
                state.found_node(node)? == count
            } else {
                state.bind_node(node, count.clone())?
            };
            if !written {
                return Ok(false);
            }
        }
        state.set_slot(self.item.condition, result.clone());
        Ok(true)
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &Self::Image) {
        state.clear_slot(self.item.condition);
        if let Some(node) = self.item.count {
            if !self.item.count_found {
                state.unbind_node(node);
            }
        }
    }
}

impl<'g> SingularProbe<'g> for ConditionProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<Self::Image>, SearchError> {
        let item = self.item;
        let Some(plan) = item.plan.as_deref() else {
            return Ok(Some((TreeMatch::truth(item.condition), None)));
        };
        let matches = self.evaluate(plan, state)?;
        tracing::trace!("{} {}: {} sub-matches", item.quantifier.symbol(), item.condition, matches.len());

        let count = match item.count {
            Some(_) => match state.config.algebra.count(matches.len()) {
                Some(value) => Some(state.host.image_of_value(value)),
                None => return Ok(None),
            },
            None => None,
        };
        let result = match item.quantifier {
            Quantifier::True => TreeMatch::truth(item.condition),
            Quantifier::Not if matches.is_empty() => TreeMatch::truth(item.condition),
            Quantifier::Not => return Ok(None),
            Quantifier::Exists if matches.is_empty() => return Ok(None),
            Quantifier::Exists => TreeMatch::combine(item.condition, MatchOp::Or, matches),
            Quantifier::Forall { positive: true } if matches.is_empty() => return Ok(None),
            Quantifier::Forall { .. } => TreeMatch::combine(item.condition, MatchOp::And, matches),
        };
        Ok(Some((result, count)))
    }
}

/// Succeeds, binding nothing, iff the inner item has no image.
#[derive(Clone, Debug)]
pub struct NegatedItem {
    pub(crate) inner: Box<SearchItem>,
    needs: Vec<Part>,
}

impl NegatedItem {
    /// `needs` are the roots of the negated condition the inner item reads.
    pub(crate) fn new(inner: SearchItem, needs: Vec<Part>) -> Self {
        Self {
            inner: Box::new(inner),
            needs,
        }
    }

    pub(crate) fn needs(&self) -> Vec<Part> {
        self.needs.clone()
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.inner.activate(found);
    }

    pub(crate) fn create_record<'g>(&'g self, host: &'g HostGraph) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(NegatedProbe {
            item: self,
            host,
            inner: None,
        }))
    }
}

struct NegatedProbe<'g> {
    item: &'g NegatedItem,
    host: &'g HostGraph,
    inner: Option<Box<dyn Record<'g> + 'g>>,
}

impl<'g> Probe<'g> for NegatedProbe<'g> {
    type Image = ();

    fn write(&mut self, _state: &mut State<'g>, _image: &()) -> Result<bool, SearchError> {
        Ok(true)
    }

    fn erase(&mut self, _state: &mut State<'g>, _image: &()) {}
}

impl<'g> SingularProbe<'g> for NegatedProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<()>, SearchError> {
        let (item, host) = (self.item, self.host);
        let inner = self.inner.get_or_insert_with(|| item.inner.create_record(host));
        inner.reset(state);
        let found = inner.next(state)?;
        inner.reset(state);
        Ok((!found).then_some(()))
    }
}
