//! Items over node values: (in)equalities, operators and set operators.

use gramatch_common::{ConditionId, NodeImage, Operator, PNodeId, SetOperator, Value};

use crate::error::SearchError;
use crate::record::{Probe, Record, SingularProbe, SingularRecord};
use crate::state::State;

/// Tests whether two bound nodes have identical (or distinct) images.
#[derive(Clone, Debug)]
pub struct EqualityItem {
    pub(crate) left: PNodeId,
    pub(crate) right: PNodeId,
    pub(crate) equal: bool,
}

impl EqualityItem {
    pub(crate) fn new(left: PNodeId, right: PNodeId, equal: bool) -> Self {
        Self { left, right, equal }
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(EqualityProbe { item: self }))
    }
}

struct EqualityProbe<'g> {
    item: &'g EqualityItem,
}

impl<'g> Probe<'g> for EqualityProbe<'g> {
    type Image = ();

    fn write(&mut self, _state: &mut State<'g>, _image: &()) -> Result<bool, SearchError> {
        Ok(true)
    }

    fn erase(&mut self, _state: &mut State<'g>, _image: &()) {}
}

impl<'g> SingularProbe<'g> for EqualityProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<()>, SearchError> {
        let same = state.found_node(self.item.left)? == state.found_node(self.item.right)?;
        Ok((same == self.item.equal).then_some(()))
    }
}

/// Writes `image` to `target`, or compares it with the target's image when found.
fn write_target(
    state: &mut State<'_>,
    target: PNodeId,
    found: bool,
    image: &NodeImage,
) -> Result<bool, SearchError> {
    if found {
        Ok(state.found_node(target)? == image)
    } else {
        state.bind_node(target, image.clone())
    }
}

fn value_of(state: &State<'_>, node: PNodeId, image: &NodeImage) -> Result<Value, SearchError> {
    state
        .host
        .image_value(image)
        .cloned()
        .ok_or_else(|| SearchError::invariant(format!("image {image} of {node} carries no value")))
}

/// Evaluates an operator over bound arguments.
#[derive(Clone, Debug)]
pub struct OperatorItem {
    pub(crate) op: Operator,
    pub(crate) args: Vec<PNodeId>,
    pub(crate) target: PNodeId,
    pub(crate) target_found: bool,
}

impl OperatorItem {
    pub(crate) fn new(op: Operator, args: Vec<PNodeId>, target: PNodeId) -> Self {
        Self {
            op,
            args,
            target,
            target_found: false,
        }
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(OperatorProbe { item: self }))
    }
}

struct OperatorProbe<'g> {
    item: &'g OperatorItem,
}

impl<'g> Probe<'g> for OperatorProbe<'g> {
    type Image = NodeImage;

    fn write(&mut self, state: &mut State<'g>, image: &NodeImage) -> Result<bool, SearchError> {
        write_target(state, self.item.target, self.item.target_found, image)
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &NodeImage) {
        if !self.item.target_found {
            state.unbind_node(self.item.target);
        }
    }
}

impl<'g> SingularProbe<'g> for OperatorProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<NodeImage>, SearchError> {
        let args = self
            .item
            .args
            .iter()
            .map(|&arg| value_of(state, arg, state.found_node(arg)?))
            .collect::<Result<Vec<_>, _>>()?;
        let result = state.config.algebra.apply(self.item.op, &args);
        tracing::trace!("{:?}({:?}) = {:?}", self.item.op, args, result);
        Ok(result.map(|value| state.host.image_of_value(value)))
    }
}

/// Folds the argument values of the sub-matches of a sibling condition.
#[derive(Clone, Debug)]
pub struct SetOperatorItem {
    pub(crate) op: SetOperator,
    pub(crate) condition: ConditionId,
    pub(crate) arg: PNodeId,
    pub(crate) target: PNodeId,
    pub(crate) target_found: bool,
}

impl SetOperatorItem {
    pub(crate) fn new(op: SetOperator, condition: ConditionId, arg: PNodeId, target: PNodeId) -> Self {
        Self {
            op,
            condition,
            arg,
            target,
            target_found: false,
        }
    }

    pub(crate) fn create_record<'g>(&'g self) -> Box<dyn Record<'g> + 'g> {
        Box::new(SingularRecord::new(SetOperatorProbe { item: self }))
    }
}

struct SetOperatorProbe<'g> {
    item: &'g SetOperatorItem,
}

impl<'g> Probe<'g> for SetOperatorProbe<'g> {
    type Image = NodeImage;

    fn write(&mut self, state: &mut State<'g>, image: &NodeImage) -> Result<bool, SearchError> {
        write_target(state, self.item.target, self.item.target_found, image)
    }

    fn erase(&mut self, state: &mut State<'g>, _image: &NodeImage) {
        if !self.item.target_found {
            state.unbind_node(self.item.target);
        }
    }
}

impl<'g> SingularProbe<'g> for SetOperatorProbe<'g> {
    fn find(&mut self, state: &mut State<'g>) -> Result<Option<NodeImage>, SearchError> {
        let item = self.item;
        let slot = state.slot(item.condition).ok_or_else(|| {
            SearchError::invariant(format!("result of {} is expected to be bound", item.condition))
        })?;
        let values = slot
            .subs
            .iter()
            .map(|sub| {
                let image = sub.node(item.arg).ok_or_else(|| {
                    SearchError::invariant(format!("sub-match of {} lacks {}", item.condition, item.arg))
                })?;
                value_of(state, item.arg, image)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let result = state.config.algebra.fold(item.op, &values);
        Ok(result.map(|value| state.host.image_of_value(value)))
    }
}
