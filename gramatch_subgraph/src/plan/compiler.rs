//! Greedy plan compilation.
//!
//! The candidate items of a condition are scheduled one at a time: at every
//! step the best remaining item under the comparator chain is appended to the
//! plan, and the compiler-local comparator state is updated inline.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, info};

use gramatch_common::{
    Condition, ConditionId, Config, PEdgeId, PNodeId, Pattern, PatternLabel, PatternNodeKind, Quantifier,
};

use super::{SearchPlan, part_is_relevant};
use super::comparator::{Comparator, Context};
use crate::anchor::Anchor;
use crate::error::PlanError;
use crate::item::{
    ConditionItem, EdgeItem, EdgeLabel, Ends, EqualityItem, NegatedItem, NodeCheck, NodeTypeItem, OperatorItem,
    Part, RegexItem, SearchItem, SeedItem, SetOperatorItem, ValueItem,
};
use crate::profiling::Timer;

/// Compile the plan of `condition` for the pre-matched `anchor`.
pub(crate) fn compile(
    pattern: &Arc<Pattern>,
    config: &Arc<Config>,
    condition: ConditionId,
    anchor: Anchor,
    comparators: &[Comparator],
) -> Result<SearchPlan, PlanError> {
    let _t = Timer::new("plan::compile");
    if condition.index() >= pattern.condition_count() {
        return Err(PlanError::UnknownCondition(condition));
    }
    validate_anchor(pattern, condition, &anchor)?;

    let cond = pattern.condition(condition);
    let candidates = candidates(pattern, config, cond, &anchor, comparators)?;
    let mut ctx = Context::new(pattern, config, &candidates);
    let mut plan = SearchPlan::new(pattern.clone(), config.clone(), condition, anchor);

    let mut remaining: Vec<(usize, SearchItem)> = candidates.into_iter().enumerate().collect();
    while !remaining.is_empty() {
        let better = |a: &(usize, SearchItem), b: &(usize, SearchItem)| -> Ordering {
            comparators
                .iter()
                .map(|c| c.compare(&ctx, &a.1, &b.1))
                .find(|o| o.is_ne())
                .unwrap_or_else(|| b.1.rating().cmp(&a.1.rating()).then(b.0.cmp(&a.0)))
        };
        let best = (1..remaining.len()).fold(0, |best, ix| {
            if better(&remaining[ix], &remaining[best]) == Ordering::Greater {
                ix
            } else {
                best
            }
        });
        let (_, item) = remaining.swap_remove(best);

        if !ctx.is_ready(&item) {
            return Err(PlanError::Unsatisfiable {
                condition,
                item: item.describe(pattern),
            });
        }

        let relevant = !matches!(item, SearchItem::Seed(_))
            && item
                .binds()
                .into_iter()
                .any(|part| !ctx.is_bound(part) && part_is_relevant(pattern, part));
        debug!(
            "{}: selected {} ({:?}){}",
            cond.name,
            item.describe(pattern),
            item.kind(),
            if relevant { "" } else { ", irrelevant" }
        );
        ctx.select(&item);
        plan.push(item, relevant)?;
    }

    check_bound(pattern, cond, &ctx)?;
    plan.fix()?;
    info!("compiled plan for {} with {} items", cond.name, plan.len());
    debug!("\n{plan}");
    Ok(plan)
}

fn validate_anchor(pattern: &Pattern, condition: ConditionId, anchor: &Anchor) -> Result<(), PlanError> {
    let visible = |owner: ConditionId| pattern.encloses(owner, condition);
    for &node in anchor.nodes() {
        if node.index() >= pattern.node_count() || !visible(pattern.node(node).owner) {
            return Err(PlanError::InvalidAnchor(format!("node {node} is not visible")));
        }
    }
    for &var in anchor.vars() {
        if var.index() >= pattern.var_count() || !visible(pattern.var(var).owner) {
            return Err(PlanError::InvalidAnchor(format!("variable {var} is not visible")));
        }
    }
    for &edge in anchor.edges() {
        if edge.index() >= pattern.edge_count() || pattern.edge(edge).owner != condition {
            return Err(PlanError::InvalidAnchor(format!("edge {edge} is not owned by {condition}")));
        }
        let e = pattern.edge(edge);
        if !anchor.contains_node(e.source) || !anchor.contains_node(e.target) {
            return Err(PlanError::InvalidAnchor(format!("edge {edge} is anchored without its ends")));
        }
        match edge_label(&e.label) {
            Some(EdgeLabel::Wildcard { var: Some(v), .. }) if !anchor.contains_var(v) => {
                return Err(PlanError::InvalidAnchor(format!(
                    "edge {edge} is anchored without its variable {v}"
                )));
            }
            Some(_) => {}
            None => {
                return Err(PlanError::InvalidAnchor(format!(
                    "edge {edge} is a path expression and has no edge image"
                )));
            }
        }
    }
    Ok(())
}

/// The plain or wildcard label of an edge, simplifying single-step expressions.
fn edge_label(label: &PatternLabel) -> Option<EdgeLabel> {
    match label {
        PatternLabel::Plain(l) => Some(EdgeLabel::Fixed(*l)),
        PatternLabel::Wildcard { var, guard } => Some(EdgeLabel::Wildcard {
            var: *var,
            guard: guard.clone(),
        }),
        PatternLabel::Regex(expr) => expr.as_atom().map(EdgeLabel::Fixed).or_else(|| {
            expr.as_wildcard().map(|(var, guard)| EdgeLabel::Wildcard {
                var,
                guard: guard.clone(),
            })
        }),
    }
}

fn edge_item(pattern: &Pattern, config: &Config, edge: PEdgeId) -> Result<SearchItem, PlanError> {
    let e = pattern.edge(edge);
    let ends = Ends::new(pattern, config, e.source, e.target);
    match edge_label(&e.label) {
        Some(label) => Ok(SearchItem::Edge(EdgeItem::new(edge, ends, label))),
        None => {
            let automaton = pattern.automaton(edge).ok_or_else(|| PlanError::Unbound {
                condition: e.owner,
                element: format!("automaton of {edge}"),
            })?;
            Ok(SearchItem::Regex(RegexItem::new(edge, ends, automaton.clone())))
        }
    }
}

fn candidates(
    pattern: &Arc<Pattern>,
    config: &Arc<Config>,
    cond: &Condition,
    anchor: &Anchor,
    comparators: &[Comparator],
) -> Result<Vec<SearchItem>, PlanError> {
    let mut items = Vec::new();

    if !anchor.is_empty() {
        let checks = anchor
            .nodes()
            .iter()
            .map(|&n| (n, NodeCheck::for_node(pattern, config, n)))
            .collect();
        items.push(SearchItem::Seed(SeedItem::new(pattern, anchor.clone(), checks)));
    }

    // Nodes an edge item binds with a type check of its own.
    let mut edge_bound: Vec<PNodeId> = Vec::new();
    for &edge in &cond.edges {
        if anchor.contains_edge(edge) {
            continue;
        }
        let item = edge_item(pattern, config, edge)?;
        if let Some((source, target)) = item.ends() {
            if matches!(item, SearchItem::Edge(_)) {
                edge_bound.extend([source, target]);
            }
        }
        items.push(item);
    }

    for &node in &cond.nodes {
        let n = pattern.node(node);
        match &n.kind {
            PatternNodeKind::Value {
                constant: Some(value), ..
            } if !anchor.contains_node(node) => {
                let value = config.algebra.normalize(value.clone());
                items.push(SearchItem::Value(ValueItem::new(node, value)));
            }
            PatternNodeKind::Value { .. } => {}
            PatternNodeKind::Typed { type_var, .. } => {
                let var_pending = type_var.is_some_and(|v| !anchor.contains_var(v));
                let node_pending = !anchor.contains_node(node) && !edge_bound.contains(&node);
                if var_pending || node_pending {
                    let check = NodeCheck::for_node(pattern, config, node);
                    items.push(SearchItem::NodeType(NodeTypeItem::new(node, check, *type_var)));
                }
            }
        }
    }

    for eq in &cond.equations {
        items.push(SearchItem::Equality(EqualityItem::new(eq.left, eq.right, eq.equal)));
    }
    for op in &cond.operations {
        items.push(SearchItem::Operator(OperatorItem::new(op.op, op.args.clone(), op.target)));
    }
    for op in &cond.set_operations {
        items.push(SearchItem::SetOperator(SetOperatorItem::new(
            op.op,
            op.condition,
            op.arg,
            op.target,
        )));
    }

    for &child in &cond.children {
        items.push(child_item(pattern, config, pattern.condition(child), comparators)?);
    }
    Ok(items)
}

/// Whether `cond` holds exactly `edges` edges and `equations` equations, variables aside.
fn only(cond: &Condition, edges: usize, equations: usize) -> bool {
    cond.nodes.is_empty()
        && cond.edges.len() == edges
        && cond.equations.len() == equations
        && cond.operations.is_empty()
        && cond.set_operations.is_empty()
        && cond.children.is_empty()
        && cond.count_node.is_none()
}

fn child_item(
    pattern: &Arc<Pattern>,
    config: &Arc<Config>,
    child: &Condition,
    comparators: &[Comparator],
) -> Result<SearchItem, PlanError> {
    if child.quantifier == Quantifier::Not {
        // A negated single edge between roots becomes a negated edge test.
        if only(child, 1, 0) && edge_label(&pattern.edge(child.edges[0]).label).is_some() {
            let inner = edge_item(pattern, config, child.edges[0])?;
            let needs = child
                .root_nodes
                .iter()
                .map(|&n| Part::Node(n))
                .chain(child.root_vars.iter().map(|&v| Part::Var(v)))
                .collect();
            return Ok(SearchItem::Negated(NegatedItem::new(inner, needs)));
        }
        // A negated (in)equality flips into its opposite.
        if only(child, 0, 1) && child.vars.is_empty() {
            let eq = child.equations[0];
            return Ok(SearchItem::Equality(EqualityItem::new(eq.left, eq.right, !eq.equal)));
        }
    }

    let plan = match child.quantifier {
        Quantifier::True => None,
        _ => {
            let sub = compile(pattern, config, child.id, Anchor::roots(child), comparators)?;
            Some(Arc::new(sub))
        }
    };
    Ok(SearchItem::Condition(ConditionItem::new(
        child.id,
        child.quantifier,
        plan,
        child.root_nodes.clone(),
        child.root_vars.clone(),
        child.count_node,
    )))
}

fn check_bound(pattern: &Pattern, cond: &Condition, ctx: &Context) -> Result<(), PlanError> {
    let unbound = |element: String| PlanError::Unbound {
        condition: cond.id,
        element,
    };
    if let Some(&n) = cond.nodes.iter().find(|&&n| !ctx.is_bound(Part::Node(n))) {
        return Err(unbound(format!("node {}", pattern.node(n).name)));
    }
    if let Some(&e) = cond.edges.iter().find(|&&e| !ctx.is_bound(Part::Edge(e))) {
        return Err(unbound(format!("edge {e}")));
    }
    if let Some(&v) = cond.vars.iter().find(|&&v| !ctx.is_bound(Part::Var(v))) {
        return Err(unbound(format!("variable {}", pattern.var(v).name)));
    }
    Ok(())
}
