//! Regular expression edge items.

use std::sync::Arc;

use gramatch_common::{NodeImage, PEdgeId, PVarId, RegAut};

use super::{Ends, Part};
use crate::error::SearchError;
use crate::record::{MultipleProbe, MultipleRecord, Probe, Record, SingularProbe, SingularRecord};
use crate::state::State;

/// Matches a pair of node images connected by a path the automaton accepts.
#[derive(Clone, Debug)]
pub struct RegexItem {
    pub(crate) edge: PEdgeId,
    pub(crate) ends: Ends,
    automaton: Arc<RegAut>,
}

impl RegexItem {
    pub(crate) fn new(edge: PEdgeId, ends: Ends, automaton: Arc<RegAut>) -> Self {
        Self { edge, ends, automaton }
    }

    pub(crate) fn accepts_empty(&self) -> bool {
        self.automaton.accepts_empty()
    }

    pub(crate) fn vars(&self) -> &[PVarId] {
        self.automaton.vars()
    }

    pub(crate) fn parts(&self) -> Vec<Part> {
        let mut parts = self.ends.parts().to_vec();
        parts.push(Part::Edge(self.edge));
        parts
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.ends.activate(found);
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        let probe = RegexProbe { item: self };
        if self.ends.both_found() {
            Box::new(SingularRecord::new(probe))
        } else {
            Box::new(MultipleRecord::new(probe))
        }
    }
}

struct RegexProbe<'g> {
    item: &'g RegexItem,
}

impl RegexProbe<'_> {
    fn pairs(&self, state: &State<'_>) -> Result<Vec<(NodeImage, NodeImage)>, SearchError> {
        let sources = self.item.ends.found_source(state)?.cloned().map(|s| vec![s]);
        let targets = self.item.ends.found_target(state)?.cloned().map(|t| vec![t]);
        let valuation = |v: PVarId| state.var(v);
        Ok(self.item.automaton.matches(
            state.host,
            sources.as_deref(),
            targets.as_deref(),
            &valuation,
        ))
    }
}

impl<'g> Probe<'g> for RegexProbe<'g> {
    type Image = (NodeImage, NodeImage);

    fn write(&mut self, state: &mut State<'g>, image: &Self::Image) -> Result<bool, SearchError> {
        self.item.ends.write(state, image.0.clone(), image.1.clone())
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &Self::Image) {
        self.item.ends.erase(state);
    }
}

impl<'g> SingularProbe<'g> for RegexProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<Self::Image>, SearchError> {
        Ok(self.pairs(state)?.into_iter().next())
    }
}

impl<'g> MultipleProbe<'g> for RegexProbe<'g> {
    fn candidates(&mut self, state: &State<'g>) -> Result<Box<dyn Iterator<Item = Self::Image> + 'g>, SearchError> {
        // Path search is a product-graph traversal, so the pairs come at once.
        Ok(Box::new(self.pairs(state)?.into_iter()))
    }
}
