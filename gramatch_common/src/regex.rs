//! Regular label expressions and the automaton that evaluates them on a host graph.
//!
//! A [`RegExpr`] describes a set of label paths. It is compiled once into a
//! [`RegAut`] (a Thompson NFA with labelled and wildcard steps), which computes
//! the reachability relation between host nodes by a breadth-first search over
//! the product of host nodes and automaton states.

use std::collections::{HashSet, VecDeque};
use std::fmt;

use itertools::Itertools;

use crate::host::{HostGraph, NodeImage};
use crate::pattern::PVarId;
use crate::types::LabelId;

/// Restriction on the labels a wildcard may match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Guard {
    /// Every label is admitted.
    #[default]
    Any,
    /// Only the listed labels are admitted (sorted).
    Allow(Vec<LabelId>),
    /// Every label except the listed ones is admitted (sorted).
    Deny(Vec<LabelId>),
}

impl Guard {
    /// A guard admitting exactly `labels`.
    pub fn allow(labels: impl IntoIterator<Item = LabelId>) -> Self {
        Guard::Allow(labels.into_iter().sorted().dedup().collect())
    }

    /// A guard admitting everything but `labels`.
    pub fn deny(labels: impl IntoIterator<Item = LabelId>) -> Self {
        Guard::Deny(labels.into_iter().sorted().dedup().collect())
    }

    /// Whether `label` passes the guard.
    pub fn admits(&self, label: LabelId) -> bool {
        match self {
            Guard::Any => true,
            Guard::Allow(labels) => labels.binary_search(&label).is_ok(),
            Guard::Deny(labels) => labels.binary_search(&label).is_err(),
        }
    }
}

/// A regular expression over edge labels.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RegExpr {
    /// A single edge with the given label.
    Atom(LabelId),
    /// A single edge with any admitted label, optionally bound to a variable.
    Wildcard {
        /// Variable whose value fixes the label.
        var: Option<PVarId>,
        /// Labels the wildcard may match.
        guard: Guard,
    },
    /// The identity relation.
    Empty,
    /// The expression traversed against edge direction.
    Inverse(Box<RegExpr>),
    /// Concatenation.
    Seq(Vec<RegExpr>),
    /// Alternatives.
    Choice(Vec<RegExpr>),
    /// Zero or more repetitions.
    Star(Box<RegExpr>),
    /// One or more repetitions.
    Plus(Box<RegExpr>),
}

impl RegExpr {
    /// `e*`
    pub fn star(inner: RegExpr) -> Self {
        RegExpr::Star(Box::new(inner))
    }

    /// `e+`
    pub fn plus(inner: RegExpr) -> Self {
        RegExpr::Plus(Box::new(inner))
    }

    /// `-e`
    pub fn inverse(inner: RegExpr) -> Self {
        RegExpr::Inverse(Box::new(inner))
    }

    /// Variables occurring in this expression, in order of first occurrence.
    pub fn vars(&self) -> Vec<PVarId> {
        let mut out = Vec::new();
        self.collect_vars(&mut out);
        out.into_iter().unique().collect()
    }

    fn collect_vars(&self, out: &mut Vec<PVarId>) {
        match self {
            RegExpr::Wildcard { var: Some(v), .. } => out.push(*v),
            RegExpr::Atom(_) | RegExpr::Wildcard { .. } | RegExpr::Empty => {}
            RegExpr::Inverse(e) | RegExpr::Star(e) | RegExpr::Plus(e) => e.collect_vars(out),
            RegExpr::Seq(es) | RegExpr::Choice(es) => es.iter().for_each(|e| e.collect_vars(out)),
        }
    }

    /// The label, if this expression is a single forward atom.
    pub fn as_atom(&self) -> Option<LabelId> {
        match self {
            RegExpr::Atom(label) => Some(*label),
            RegExpr::Seq(es) | RegExpr::Choice(es) if es.len() == 1 => es[0].as_atom(),
            _ => None,
        }
    }

    /// Variable and guard, if this expression is a single forward wildcard.
    pub fn as_wildcard(&self) -> Option<(Option<PVarId>, &Guard)> {
        match self {
            RegExpr::Wildcard { var, guard } => Some((*var, guard)),
            RegExpr::Seq(es) | RegExpr::Choice(es) if es.len() == 1 => es[0].as_wildcard(),
            _ => None,
        }
    }
}

impl fmt::Display for RegExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegExpr::Atom(l) => write!(f, "#{}", l.0),
            RegExpr::Wildcard { var: Some(v), .. } => write!(f, "?{}", v.0),
            RegExpr::Wildcard { var: None, .. } => write!(f, "?"),
            RegExpr::Empty => write!(f, "="),
            RegExpr::Inverse(e) => write!(f, "-{e}"),
            RegExpr::Seq(es) => write!(f, "({})", es.iter().join(".")),
            RegExpr::Choice(es) => write!(f, "({})", es.iter().join("|")),
            RegExpr::Star(e) => write!(f, "{e}*"),
            RegExpr::Plus(e) => write!(f, "{e}+"),
        }
    }
}

/// A non-epsilon automaton step.
#[derive(Clone, Debug)]
enum Step {
    Label { label: LabelId, inverse: bool },
    Wild { var: Option<PVarId>, guard: Guard, inverse: bool },
}

impl Step {
    const fn inverse(&self) -> bool {
        match self {
            Step::Label { inverse, .. } | Step::Wild { inverse, .. } => *inverse,
        }
    }

    fn admits(&self, label: LabelId, valuation: &dyn Fn(PVarId) -> Option<LabelId>) -> bool {
        match self {
            Step::Label { label: expected, .. } => *expected == label,
            Step::Wild { var, guard, .. } => {
                guard.admits(label) && var.and_then(valuation).is_none_or(|bound| bound == label)
            }
        }
    }
}

/// Compiled automaton for a [`RegExpr`].
#[derive(Clone, Debug)]
pub struct RegAut {
    /// Forward transitions per state; `None` is an epsilon move.
    forward: Vec<Vec<(Option<Step>, usize)>>,
    /// Reversed transitions per state.
    backward: Vec<Vec<(Option<Step>, usize)>>,
    start: usize,
    accept: usize,
    accepts_empty: bool,
    vars: Vec<PVarId>,
}

impl RegAut {
    /// Compile an expression.
    pub fn compile(expr: &RegExpr) -> Self {
        let mut forward: Vec<Vec<(Option<Step>, usize)>> = Vec::new();
        let (start, accept) = thompson(expr, false, &mut forward);

        let mut backward: Vec<Vec<(Option<Step>, usize)>> = vec![Vec::new(); forward.len()];
        for (from, moves) in forward.iter().enumerate() {
            for (step, to) in moves {
                backward[*to].push((step.clone(), from));
            }
        }

        let mut aut = Self {
            forward,
            backward,
            start,
            accept,
            accepts_empty: false,
            vars: expr.vars(),
        };
        aut.accepts_empty = aut.epsilon_closure(start).contains(&accept);
        aut
    }

    /// Whether the empty path (identity) is accepted.
    pub const fn accepts_empty(&self) -> bool {
        self.accepts_empty
    }

    /// Variables the automaton reads.
    pub fn vars(&self) -> &[PVarId] {
        &self.vars
    }

    fn epsilon_closure(&self, state: usize) -> HashSet<usize> {
        let mut seen = HashSet::from([state]);
        let mut stack = vec![state];
        while let Some(q) = stack.pop() {
            for (step, to) in &self.forward[q] {
                if step.is_none() && seen.insert(*to) {
                    stack.push(*to);
                }
            }
        }
        seen
    }

    /// Compute all `(source, target)` pairs connected by an accepted path.
    ///
    /// `sources`/`targets` restrict the respective end when given. When only the
    /// targets are known the search runs backwards from them. Variables are
    /// resolved through `valuation`; an unresolved variable admits any label its
    /// guard admits. The result is sorted and free of duplicates.
    pub fn matches(
        &self,
        host: &HostGraph,
        sources: Option<&[NodeImage]>,
        targets: Option<&[NodeImage]>,
        valuation: &dyn Fn(PVarId) -> Option<LabelId>,
    ) -> Vec<(NodeImage, NodeImage)> {
        let all_nodes = || host.node_ids().map(NodeImage::Node).collect::<Vec<_>>();
        let mut pairs = match (sources, targets) {
            (Some(sources), _) => {
                let found = self.reach(host, sources, true, valuation);
                match targets {
                    Some(targets) => found
                        .into_iter()
                        .filter(|(_, t)| targets.contains(t))
                        .collect(),
                    None => found,
                }
            }
            (None, Some(targets)) => self
                .reach(host, targets, false, valuation)
                .into_iter()
                .map(|(t, s)| (s, t))
                .collect(),
            (None, None) => self.reach(host, &all_nodes(), true, valuation),
        };
        pairs.sort_unstable();
        pairs.dedup();
        pairs
    }

    /// Breadth-first product search from each of `starts`. Returns
    /// `(start, reached)` pairs.
    fn reach(
        &self,
        host: &HostGraph,
        starts: &[NodeImage],
        forward: bool,
        valuation: &dyn Fn(PVarId) -> Option<LabelId>,
    ) -> Vec<(NodeImage, NodeImage)> {
        let (moves, initial, final_state) = if forward {
            (&self.forward, self.start, self.accept)
        } else {
            (&self.backward, self.accept, self.start)
        };

        let mut out = Vec::new();
        for start in starts {
            let mut seen: HashSet<(NodeImage, usize)> = HashSet::new();
            let mut queue: VecDeque<(NodeImage, usize)> = VecDeque::new();
            seen.insert((start.clone(), initial));
            queue.push_back((start.clone(), initial));

            while let Some((node, state)) = queue.pop_front() {
                if state == final_state {
                    out.push((start.clone(), node.clone()));
                }
                for (step, to) in &moves[state] {
                    let Some(step) = step else {
                        if seen.insert((node.clone(), *to)) {
                            queue.push_back((node.clone(), *to));
                        }
                        continue;
                    };
                    // Traverse host edges along the step's direction, flipped for
                    // backward searches.
                    let along = step.inverse() != forward;
                    let edges = if along {
                        host.out_edges(&node)
                    } else {
                        host.in_edges(&node)
                    };
                    for &edge_id in edges {
                        let edge = host.edge(edge_id);
                        if !step.admits(edge.label, valuation) {
                            continue;
                        }
                        let next = NodeImage::Node(if along { edge.target } else { edge.source });
                        if seen.insert((next.clone(), *to)) {
                            queue.push_back((next, *to));
                        }
                    }
                }
            }
        }
        out
    }
}

fn new_state(states: &mut Vec<Vec<(Option<Step>, usize)>>) -> usize {
    states.push(Vec::new());
    states.len() - 1
}

/// Thompson construction; `inverse` pushes inversion down to the leaves.
fn thompson(
    expr: &RegExpr,
    inverse: bool,
    states: &mut Vec<Vec<(Option<Step>, usize)>>,
) -> (usize, usize) {
    match expr {
        RegExpr::Atom(label) => {
            let (s, e) = (new_state(states), new_state(states));
            states[s].push((
                Some(Step::Label {
                    label: *label,
                    inverse,
                }),
                e,
            ));
            (s, e)
        }
        RegExpr::Wildcard { var, guard } => {
            let (s, e) = (new_state(states), new_state(states));
            states[s].push((
                Some(Step::Wild {
                    var: *var,
                    guard: guard.clone(),
                    inverse,
                }),
                e,
            ));
            (s, e)
        }
        RegExpr::Empty => {
            let s = new_state(states);
            (s, s)
        }
        RegExpr::Inverse(inner) => thompson(inner, !inverse, states),
        RegExpr::Seq(parts) => {
            let start = new_state(states);
            let mut last = start;
            // Inverting a sequence reverses it.
            let ordered: Vec<&RegExpr> = if inverse {
                parts.iter().rev().collect()
            } else {
                parts.iter().collect()
            };
            for part in ordered {
                let (s, e) = thompson(part, inverse, states);
                states[last].push((None, s));
                last = e;
            }
            (start, last)
        }
        RegExpr::Choice(parts) => {
            let (start, end) = (new_state(states), new_state(states));
            for part in parts {
                let (s, e) = thompson(part, inverse, states);
                states[start].push((None, s));
                states[e].push((None, end));
            }
            (start, end)
        }
        RegExpr::Star(inner) => {
            let (start, end) = (new_state(states), new_state(states));
            let (s, e) = thompson(inner, inverse, states);
            states[start].push((None, s));
            states[start].push((None, end));
            states[e].push((None, s));
            states[e].push((None, end));
            (start, end)
        }
        RegExpr::Plus(inner) => {
            let (start, end) = (new_state(states), new_state(states));
            let (s, e) = thompson(inner, inverse, states);
            states[start].push((None, s));
            states[e].push((None, s));
            states[e].push((None, end));
            (start, end)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::host::NodeId;
    use crate::types::TypeGraph;

    /// `a -r-> b -r-> c -s-> d`
    fn chain() -> (HostGraph, LabelId, LabelId, Vec<NodeId>) {
        let mut tb = TypeGraph::builder();
        tb.node_type("T");
        let r = tb.edge_label("r");
        let s = tb.edge_label("s");
        let types = Arc::new(tb.build().unwrap());
        let mut b = HostGraph::builder(types);
        let nodes: Vec<NodeId> = (0..4).map(|_| b.node("T").unwrap()).collect();
        b.add_edge(nodes[0], r, nodes[1]).unwrap();
        b.add_edge(nodes[1], r, nodes[2]).unwrap();
        b.add_edge(nodes[2], s, nodes[3]).unwrap();
        (b.build(), r, s, nodes)
    }

    fn no_vars(_: PVarId) -> Option<LabelId> {
        None
    }

    #[test]
    fn star_accepts_empty_and_reaches_transitively() {
        let (host, r, _, nodes) = chain();
        let aut = RegAut::compile(&RegExpr::star(RegExpr::Atom(r)));
        assert!(aut.accepts_empty());
        let from_a = [NodeImage::Node(nodes[0])];
        let reached: Vec<_> = aut
            .matches(&host, Some(&from_a), None, &no_vars)
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(
            reached,
            vec![
                NodeImage::Node(nodes[0]),
                NodeImage::Node(nodes[1]),
                NodeImage::Node(nodes[2])
            ]
        );
    }

    #[test]
    fn sequence_and_inverse() {
        let (host, r, s, nodes) = chain();
        let expr = RegExpr::Seq(vec![RegExpr::Atom(r), RegExpr::Atom(s)]);
        let aut = RegAut::compile(&expr);
        assert!(!aut.accepts_empty());
        let all = aut.matches(&host, None, None, &no_vars);
        assert_eq!(all, vec![(NodeImage::Node(nodes[1]), NodeImage::Node(nodes[3]))]);

        let inv = RegAut::compile(&RegExpr::inverse(expr));
        let all = inv.matches(&host, None, None, &no_vars);
        assert_eq!(all, vec![(NodeImage::Node(nodes[3]), NodeImage::Node(nodes[1]))]);
    }

    #[test]
    fn backward_search_from_targets() {
        let (host, r, _, nodes) = chain();
        let aut = RegAut::compile(&RegExpr::plus(RegExpr::Atom(r)));
        let target = [NodeImage::Node(nodes[2])];
        let found = aut.matches(&host, None, Some(&target), &no_vars);
        assert_eq!(
            found,
            vec![
                (NodeImage::Node(nodes[0]), NodeImage::Node(nodes[2])),
                (NodeImage::Node(nodes[1]), NodeImage::Node(nodes[2]))
            ]
        );
    }

    #[test]
    fn wildcard_respects_guard_and_valuation() {
        let (host, r, s, nodes) = chain();
        let var = PVarId(0);
        let expr = RegExpr::plus(RegExpr::Wildcard {
            var: Some(var),
            guard: Guard::Any,
        });
        let aut = RegAut::compile(&expr);
        let from_b = [NodeImage::Node(nodes[1])];
        let only_s = move |_: PVarId| Some(s);
        assert!(aut.matches(&host, Some(&from_b), None, &only_s).is_empty());
        let only_r = move |_: PVarId| Some(r);
        assert_eq!(aut.matches(&host, Some(&from_b), None, &only_r).len(), 1);
        let denied = RegAut::compile(&RegExpr::Wildcard {
            var: None,
            guard: Guard::deny([r]),
        });
        assert_eq!(denied.matches(&host, None, None, &no_vars).len(), 1);
    }
}
