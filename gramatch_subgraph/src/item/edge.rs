//! Plain and wildcard edge items.

use gramatch_common::{EdgeId, Guard, HostGraph, LabelId, NodeImage, PEdgeId, PVarId};

use super::{Ends, Part};
use crate::error::SearchError;
use crate::record::{MultipleProbe, MultipleRecord, Probe, Record, SingularProbe, SingularRecord};
use crate::state::State;

/// Label constraint of an edge item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EdgeLabel {
    /// A plain label.
    Fixed(LabelId),
    /// Any label the guard admits, optionally bound to a variable.
    Wildcard { var: Option<PVarId>, guard: Guard },
}

/// Matches one host edge between the images of its ends.
#[derive(Clone, Debug)]
pub struct EdgeItem {
    pub(crate) edge: PEdgeId,
    pub(crate) ends: Ends,
    pub(crate) label: EdgeLabel,
    var_found: bool,
}

impl EdgeItem {
    pub(crate) fn new(edge: PEdgeId, ends: Ends, label: EdgeLabel) -> Self {
        Self {
            edge,
            ends,
            label,
            var_found: false,
        }
    }

    fn var(&self) -> Option<PVarId> {
        match self.label {
            EdgeLabel::Wildcard { var, .. } => var,
            EdgeLabel::Fixed(_) => None,
        }
    }

    pub(crate) fn parts(&self) -> Vec<Part> {
        let mut parts = self.ends.parts().to_vec();
        parts.push(Part::Edge(self.edge));
        parts.extend(self.var().map(Part::Var));
        parts
    }

    pub(crate) fn activate(&mut self, found: &dyn Fn(Part) -> bool) {
        self.ends.activate(found);
        self.var_found = self.var().is_some_and(|v| found(Part::Var(v)));
    }

    /// Whether the label is determined before the item runs.
    fn label_known(&self) -> bool {
        matches!(self.label, EdgeLabel::Fixed(_)) || self.var_found
    }

    /// At most one image exists when both ends and the label are known and
    /// the host has no parallel edges.
    pub(crate) fn is_singular_on_simple_host(&self) -> bool {
        self.ends.both_found() && self.label_known()
    }

    pub(crate) fn is_singular(&self, host: &HostGraph) -> bool {
        self.is_singular_on_simple_host() && host.is_simple()
    }

    pub(crate) fn create_record<'g>(&'g self, host: &'g HostGraph) -> Box<dyn Record<'g> + 'g> {
        let probe = EdgeProbe { item: self };
        if self.is_singular(host) {
            Box::new(SingularRecord::new(probe))
        } else {
            Box::new(MultipleRecord::new(probe))
        }
    }
}

struct EdgeProbe<'g> {
    item: &'g EdgeItem,
}

impl EdgeProbe<'_> {
    /// The label every image must carry, if known.
    fn known_label(&self, state: &State<'_>) -> Result<Option<LabelId>, SearchError> {
        match &self.item.label {
            EdgeLabel::Fixed(label) => Ok(Some(*label)),
            EdgeLabel::Wildcard { var: Some(v), .. } if self.item.var_found => state.found_var(*v).map(Some),
            EdgeLabel::Wildcard { .. } => Ok(None),
        }
    }

    fn admits_label(&self, state: &State<'_>, label: LabelId) -> bool {
        match &self.item.label {
            EdgeLabel::Fixed(fixed) => *fixed == label,
            EdgeLabel::Wildcard { var, guard } => {
                guard.admits(label)
                    && match var {
                        Some(v) if self.item.var_found => state.var(*v) == Some(label),
                        _ => true,
                    }
            }
        }
    }
}

impl<'g> Probe<'g> for EdgeProbe<'g> {
    type Image = EdgeId;

    fn write(&mut self, state: &mut State<'g>, image: &EdgeId) -> Result<bool, SearchError> {
        let edge = *state.host.edge(*image);
        if !self.admits_label(state, edge.label) {
            return Ok(false);
        }
        let ends = &self.item.ends;
        if !ends.write(state, NodeImage::Node(edge.source), NodeImage::Node(edge.target))? {
            return Ok(false);
        }
        if let Some(v) = self.item.var() {
            if !self.item.var_found {
                state.bind_var(v, edge.label);
            }
        }
        if let Err(err) = state.bind_edge(self.item.edge, *image) {
            ends.erase(state);
            return Err(err);
        }
        Ok(true)
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &EdgeId) {
        state.unbind_edge(self.item.edge);
        if let Some(v) = self.item.var() {
            if !self.item.var_found {
                state.unbind_var(v);
            }
        }
        self.item.ends.erase(state);
    }
}

impl<'g> SingularProbe<'g> for EdgeProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<EdgeId>, SearchError> {
        let label = self
            .known_label(state)?
            .ok_or_else(|| SearchError::invariant("singular edge item without a known label"))?;
        let source = state.found_node(self.item.ends.source)?;
        let target = state.found_node(self.item.ends.target)?;
        Ok(state.host.edges_between(source, label, target).first().copied())
    }
}

impl<'g> MultipleProbe<'g> for EdgeProbe<'g> {
    fn candidates(&mut self, state: &State<'g>) -> Result<Box<dyn Iterator<Item = EdgeId> + 'g>, SearchError> {
        let host = state.host;
        let label = self.known_label(state)?;
        let source = self.item.ends.found_source(state)?.cloned();
        let target = self.item.ends.found_target(state)?.cloned();

        // Enumerate the smallest of the applicable index sets.
        let mut options: Vec<&'g [EdgeId]> = Vec::with_capacity(3);
        if let Some(label) = label {
            options.push(host.edges_with_label(label));
        }
        if let Some(source) = &source {
            options.push(host.out_edges(source));
        }
        if let Some(target) = &target {
            options.push(host.in_edges(target));
        }

        let fits = move |id: &EdgeId| {
            let edge = host.edge(*id);
            label.is_none_or(|l| l == edge.label)
                && source.as_ref().is_none_or(|s| *s == NodeImage::Node(edge.source))
                && target.as_ref().is_none_or(|t| *t == NodeImage::Node(edge.target))
        };
        Ok(match options.into_iter().min_by_key(|set| set.len()) {
            Some(set) => Box::new(set.iter().copied().filter(fits)),
            None => Box::new((0..host.edge_count() as u32).map(EdgeId).filter(fits)),
        })
    }
}
