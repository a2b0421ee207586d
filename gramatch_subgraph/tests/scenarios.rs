mod common;

use std::collections::BTreeSet;
use std::ops::ControlFlow;
use std::sync::Arc;

use rstest::rstest;

use gramatch_common::{
    Config, DedupeMode, Guard, HostGraph, NodeImage, Operator, Pattern, Quantifier, RegExpr, SetOperator, Sort,
    TypeGraph, Value,
};
use gramatch_subgraph::{
    Anchor, Comparator, FnVisitor, MatchOp, MatcherFactory, PlanError, SearchError, SeedMap,
};

use common::{TYPES, config, init_test_logger};

fn two_nodes_and_an_edge() -> (HostGraph, [gramatch_common::NodeId; 3]) {
    let mut b = HostGraph::builder(TYPES.clone());
    let n1 = b.node("T").unwrap();
    let n2 = b.node("T").unwrap();
    let n3 = b.node("T").unwrap();
    b.edge(n1, "r", n2).unwrap();
    (b.build(), [n1, n2, n3])
}

#[test]
fn single_edge_has_exactly_one_match() {
    init_test_logger();
    let (host, [n1, n2, _]) = two_nodes_and_an_edge();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let a = b.node(root, "a", "T").unwrap();
    let c = b.node(root, "b", "T").unwrap();
    let e = b.edge(root, a, "r", c).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let strategy = factory.root_matcher().unwrap();
    let mut search = strategy.search(&host).unwrap();

    assert!(search.find().unwrap());
    let found = search.get_match().unwrap();
    assert_eq!(found.node(a), Some(&NodeImage::Node(n1)));
    assert_eq!(found.node(c), Some(&NodeImage::Node(n2)));
    assert!(found.edge(e).is_some());
    assert!(!search.find().unwrap());
    assert!(search.get_match().is_none());
    assert!(!search.find().unwrap());
}

#[test]
fn negated_edge_rejects_nodes_with_an_outgoing_edge() {
    init_test_logger();
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let a = b.node(root, "a", "T").unwrap();
    let neg = b.condition(root, "no-r", Quantifier::Not).unwrap();
    let other = b.node(neg, "b", "T").unwrap();
    b.edge(neg, a, "r", other).unwrap();
    let pattern = b.build().unwrap();
    let factory = MatcherFactory::new(pattern.clone(), config(true));

    let mut hb = HostGraph::builder(TYPES.clone());
    let lonely = hb.node("T").unwrap();
    let alone = hb.build();
    let all = factory.root_matcher().unwrap().find_all(&alone, &SeedMap::new()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].node(a), Some(&NodeImage::Node(lonely)));
    assert_eq!(all[0].sub(neg).map(|s| s.op), Some(MatchOp::True));

    let (host, [n1, n2, n3]) = two_nodes_and_an_edge();
    let seeded = factory
        .create_matcher(pattern.root(), Anchor::new([a], [], []))
        .unwrap();
    let seeds = SeedMap::new().with_node(a, NodeImage::Node(n1));
    let mut search = seeded.search(&host).unwrap();
    search.initialise(&seeds).unwrap();
    assert!(!search.find().unwrap());

    let unseeded: Vec<_> = factory
        .root_matcher()
        .unwrap()
        .find_all(&host, &SeedMap::new())
        .unwrap()
        .into_iter()
        .filter_map(|m| m.node(a).cloned())
        .collect();
    assert_eq!(unseeded, vec![NodeImage::Node(n2), NodeImage::Node(n3)]);
}

#[rstest]
#[case::injective(true, 2)]
#[case::non_injective(false, 4)]
fn unconnected_nodes(#[case] injective: bool, #[case] expected: usize) {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    hb.node("T").unwrap();
    hb.node("T").unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    b.node(root, "x", "T").unwrap();
    b.node(root, "y", "T").unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(injective));
    assert_eq!(factory.root_matcher().unwrap().count(&host, &SeedMap::new()).unwrap(), expected);
}

/// Persons with ages and a `knows` relation.
fn people(ages: &[i64], knows: &[(usize, usize)]) -> (HostGraph, Vec<gramatch_common::NodeId>) {
    let mut b = HostGraph::builder(TYPES.clone());
    let persons: Vec<_> = ages
        .iter()
        .map(|&age| {
            let p = b.node("A").unwrap();
            let v = b.value_node(Value::Int(age));
            b.edge(p, "age", v).unwrap();
            p
        })
        .collect();
    for &(s, t) in knows {
        b.edge(persons[s], "knows", persons[t]).unwrap();
    }
    (b.build(), persons)
}

#[test]
fn operator_filters_on_computed_values() {
    init_test_logger();
    let (host, persons) = people(&[10, 20, 30], &[]);

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.sharp_node(root, "p", "A").unwrap();
    let age = b.value_node(root, "age", Sort::Int).unwrap();
    b.edge(root, p, "age", age).unwrap();
    let limit = b.constant(root, "limit", Value::Int(18)).unwrap();
    let yes = b.constant(root, "yes", Value::Bool(true)).unwrap();
    b.operation(root, Operator::IntGt, &[age, limit], yes).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let found: Vec<_> = factory
        .root_matcher()
        .unwrap()
        .find_all(&host, &SeedMap::new())
        .unwrap()
        .into_iter()
        .filter_map(|m| m.node(p).cloned())
        .collect();
    assert_eq!(found, vec![NodeImage::Node(persons[1]), NodeImage::Node(persons[2])]);
}

#[test]
fn forall_counts_and_sums_sub_matches() {
    init_test_logger();
    let (host, persons) = people(&[40, 30, 30, 25], &[(0, 1), (0, 2), (1, 3)]);

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.sharp_node(root, "p", "A").unwrap();
    let friends = b.value_node(root, "friends", Sort::Int).unwrap();
    let total = b.value_node(root, "total", Sort::Int).unwrap();
    let each = b
        .condition(root, "friend", Quantifier::Forall { positive: false })
        .unwrap();
    let f = b.sharp_node(each, "f", "A").unwrap();
    let age = b.value_node(each, "age", Sort::Int).unwrap();
    b.edge(each, p, "knows", f).unwrap();
    b.edge(each, f, "age", age).unwrap();
    b.count(each, friends).unwrap();
    b.set_operation(root, SetOperator::IntSum, each, age, total).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let strategy = factory.root_matcher().unwrap();
    let seeds = SeedMap::new();
    let mut results = Vec::new();
    let visited = strategy
        .traverse(
            &host,
            &seeds,
            FnVisitor::new(|m| {
                let value = |n| match m.node(n) {
                    Some(image) => host.image_value(image).cloned(),
                    None => None,
                };
                results.push((m.node(p).cloned(), value(friends), value(total)));
                ControlFlow::Continue(())
            }),
        )
        .unwrap();
    assert_eq!(visited, 4);

    let expect = |ix: usize, count: i64, sum: i64| {
        (
            Some(NodeImage::Node(persons[ix])),
            Some(Value::Int(count)),
            Some(Value::Int(sum)),
        )
    };
    results.sort();
    assert_eq!(
        results,
        vec![expect(0, 2, 60), expect(1, 1, 25), expect(2, 0, 0), expect(3, 0, 0)]
    );
}

#[test]
fn exists_collects_every_witness() {
    init_test_logger();
    let (host, persons) = people(&[1, 2, 3], &[(0, 1), (0, 2)]);

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.sharp_node(root, "p", "A").unwrap();
    let some = b.condition(root, "some", Quantifier::Exists).unwrap();
    let f = b.sharp_node(some, "f", "A").unwrap();
    b.edge(some, p, "knows", f).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let found = factory.root_matcher().unwrap().find_all(&host, &SeedMap::new()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].node(p), Some(&NodeImage::Node(persons[0])));
    let witnesses = found[0].sub(some).unwrap();
    assert_eq!(witnesses.op, MatchOp::Or);
    assert_eq!(witnesses.subs.len(), 2);
}

#[rstest]
#[case::with_label_var(true)]
#[case::anonymous(false)]
fn wildcard_edges_match_any_label(#[case] bind: bool) {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    let n1 = hb.node("T").unwrap();
    let n2 = hb.node("T").unwrap();
    hb.edge(n1, "r", n2).unwrap();
    hb.edge(n1, "s", n2).unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let var = bind.then(|| b.label_var(root, "l").unwrap());
    b.wildcard_edge(root, x, var, Guard::default(), y).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let found = factory.root_matcher().unwrap().find_all(&host, &SeedMap::new()).unwrap();
    assert_eq!(found.len(), 2);
    if let Some(var) = var {
        let mut labels: Vec<_> = found.iter().filter_map(|m| m.var(var)).collect();
        labels.sort();
        assert_eq!(labels, vec![TYPES.edge_label("r").unwrap(), TYPES.edge_label("s").unwrap()]);
    }
}

#[test]
fn regex_edges_follow_paths() {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    let n1 = hb.node("T").unwrap();
    let n2 = hb.node("T").unwrap();
    let n3 = hb.node("T").unwrap();
    hb.edge(n1, "r", n2).unwrap();
    hb.edge(n2, "r", n3).unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let r = TYPES.edge_label("r").unwrap();
    b.regex_edge(root, x, RegExpr::plus(RegExpr::Atom(r)), y).unwrap();
    let pattern = b.build().unwrap();

    let factory = MatcherFactory::new(pattern, config(true));
    let mut pairs: Vec<_> = factory
        .root_matcher()
        .unwrap()
        .find_all(&host, &SeedMap::new())
        .unwrap()
        .into_iter()
        .map(|m| (m.node(x).cloned(), m.node(y).cloned()))
        .collect();
    pairs.sort();
    let img = |n| Some(NodeImage::Node(n));
    assert_eq!(pairs, vec![(img(n1), img(n2)), (img(n1), img(n3)), (img(n2), img(n3))]);
}

#[rstest]
#[case::relevant(DedupeMode::Relevant, 1)]
#[case::none(DedupeMode::None, 2)]
fn irrelevant_parts_do_not_distinguish_matches(#[case] dedupe: DedupeMode, #[case] expected: usize) {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    let n1 = hb.node("T").unwrap();
    let n2 = hb.node("T").unwrap();
    let n3 = hb.node("T").unwrap();
    hb.edge(n1, "r", n2).unwrap();
    hb.edge(n1, "r", n3).unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let e = b.edge(root, x, "r", y).unwrap();
    b.irrelevant_node(y).unwrap();
    b.irrelevant_edge(e).unwrap();
    let pattern = b.build().unwrap();

    let config = Arc::new(Config::builder().dedupe(dedupe).build());
    let factory = MatcherFactory::new(pattern, config);
    let found = factory.root_matcher().unwrap().find_all(&host, &SeedMap::new()).unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|m| m.node(x) == Some(&NodeImage::Node(n1))));
}

#[test]
fn factory_caches_strategies_per_anchor() {
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let pattern = b.build().unwrap();
    let factory = MatcherFactory::new(pattern, config(true));

    let first = factory.root_matcher().unwrap();
    let again = factory.root_matcher().unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    factory.create_matcher(root, Anchor::new([x], [], [])).unwrap();
    assert_eq!(factory.cached_count(), 2);
}

#[test]
fn seeding_is_validated() {
    let (host, [n1, ..]) = two_nodes_and_an_edge();
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let pattern = b.build().unwrap();
    let factory = MatcherFactory::new(pattern, config(true));

    let seeded = factory.create_matcher(root, Anchor::new([x], [], [])).unwrap();
    let mut search = seeded.search(&host).unwrap();
    assert!(matches!(search.find(), Err(SearchError::MissingSeed(_))));
    assert!(matches!(
        search.initialise(&SeedMap::new()),
        Err(SearchError::MissingSeed(_))
    ));
    let stray = SeedMap::new()
        .with_node(x, NodeImage::Node(n1))
        .with_node(y, NodeImage::Node(n1));
    assert!(matches!(search.initialise(&stray), Err(SearchError::UnexpectedSeed(_))));

    let unseeded = factory.root_matcher().unwrap();
    let mut search = unseeded.search(&host).unwrap();
    let seeds = SeedMap::new().with_node(x, NodeImage::Node(n1));
    assert!(matches!(search.initialise(&seeds), Err(SearchError::UnexpectedSeed(_))));
}

#[test]
fn foreign_type_graphs_are_rejected() {
    let mut tb = TypeGraph::builder();
    tb.node_type("T");
    let other = Arc::new(tb.build().unwrap());
    let mut hb = HostGraph::builder(other);
    hb.node("T").unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    b.node(root, "x", "T").unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    let strategy = factory.root_matcher().unwrap();
    assert!(matches!(strategy.search(&host), Err(SearchError::TypeGraphMismatch)));
}

#[test]
fn invalid_anchors_are_rejected() {
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let sub = b.condition(root, "sub", Quantifier::Exists).unwrap();
    let inner = b.node(sub, "inner", "T").unwrap();
    let e = b.edge(sub, x, "r", inner).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));

    // `inner` lives below the root and is invisible to it.
    assert!(matches!(
        factory.create_matcher(root, Anchor::new([inner], [], [])),
        Err(PlanError::InvalidAnchor(_))
    ));
    // An anchored edge needs both ends anchored.
    assert!(matches!(
        factory.create_matcher(sub, Anchor::new([x], [e], [])),
        Err(PlanError::InvalidAnchor(_))
    ));
    assert!(factory.create_matcher(sub, Anchor::new([x, inner], [e], [])).is_ok());
}

#[test]
fn plans_print_their_positions() {
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    b.edge(root, x, "r", y).unwrap();
    let neg = b.condition(root, "loop", Quantifier::Not).unwrap();
    b.edge(neg, y, "s", y).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    let strategy = factory.root_matcher().unwrap();

    let plan = strategy.plan();
    assert_eq!(plan.len(), 2);
    assert!(plan.is_fixed());
    assert_eq!(plan.dependency(0), None);
    assert_eq!(plan.dependency(1), Some(0));
    assert!(plan.influence(0).contains(&1));
    let printed = plan.to_string();
    assert!(printed.lines().count() >= 2, "{printed}");
}

#[test]
fn type_variables_bind_the_actual_type() {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    let plain = hb.node("A").unwrap();
    let sub = hb.node("B").unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "A").unwrap();
    let t = b.type_var(root, "t").unwrap();
    b.bind_type(x, t).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));

    let mut bound: Vec<_> = factory
        .root_matcher()
        .unwrap()
        .find_all(&host, &SeedMap::new())
        .unwrap()
        .iter()
        .map(|m| (m.node(x).cloned(), m.var(t)))
        .collect();
    bound.sort();
    assert_eq!(
        bound,
        vec![
            (Some(NodeImage::Node(plain)), TYPES.node_type("A")),
            (Some(NodeImage::Node(sub)), TYPES.node_type("B")),
        ]
    );
}

#[test]
fn seeded_edges_pin_the_match() {
    let mut hb = HostGraph::builder(TYPES.clone());
    let n1 = hb.node("T").unwrap();
    let n2 = hb.node("T").unwrap();
    let n3 = hb.node("T").unwrap();
    let to_n2 = hb.edge(n1, "r", n2).unwrap();
    hb.edge(n1, "r", n3).unwrap();
    let mislabelled = hb.edge(n1, "s", n3).unwrap();
    let host = hb.build();

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let e = b.edge(root, x, "r", y).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    let strategy = factory.create_matcher(root, Anchor::new([x, y], [e], [])).unwrap();

    let seeds = SeedMap::new()
        .with_node(x, NodeImage::Node(n1))
        .with_node(y, NodeImage::Node(n2))
        .with_edge(e, to_n2);
    let found = strategy.find_first(&host, &seeds).unwrap().unwrap();
    assert_eq!(found.edge(e), Some(to_n2));

    let wrong = SeedMap::new()
        .with_node(x, NodeImage::Node(n1))
        .with_node(y, NodeImage::Node(n3))
        .with_edge(e, mislabelled);
    assert!(strategy.find_first(&host, &wrong).unwrap().is_none());
}

#[rstest]
#[case::default(Comparator::DEFAULT.to_vec())]
#[case::indegree_only(vec![Comparator::Indegree])]
#[case::none(Vec::new())]
fn comparator_order_does_not_change_matches(#[case] comparators: Vec<Comparator>) {
    let (host, _) = people(&[20, 30, 40, 50], &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 1)]);
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.node(root, "p", "A").unwrap();
    let q = b.node(root, "q", "A").unwrap();
    let r = b.node(root, "r", "A").unwrap();
    b.edge(root, p, "knows", q).unwrap();
    b.edge(root, q, "knows", r).unwrap();
    b.edge(root, r, "knows", p).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true)).with_comparators(comparators);

    // Each of the two cycles is found once per rotation.
    assert_eq!(factory.root_matcher().unwrap().count(&host, &SeedMap::new()).unwrap(), 6);
}

/// `a` with an `r`-edge into a node of `inner`, quantified by `quantifier`.
fn edge_from_a(quantifier: Quantifier) -> (Arc<Pattern>, gramatch_common::PNodeId) {
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let a = b.node(root, "a", "T").unwrap();
    let inner = b.condition(root, "inner", quantifier).unwrap();
    let other = b.node(inner, "b", "T").unwrap();
    b.edge(inner, a, "r", other).unwrap();
    (b.build().unwrap(), a)
}

#[rstest]
#[case::lonely_injective(false, true, 1)]
#[case::self_loop_injective(true, true, 0)]
#[case::self_loop_non_injective(true, false, 0)]
fn negation_sees_edges_back_into_the_root(#[case] self_loop: bool, #[case] injective: bool, #[case] expected: usize) {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    let n = hb.node("T").unwrap();
    if self_loop {
        hb.edge(n, "r", n).unwrap();
    }
    let host = hb.build();

    let (pattern, a) = edge_from_a(Quantifier::Not);
    let factory = MatcherFactory::new(pattern, config(injective));
    let found = factory.root_matcher().unwrap().find_all(&host, &SeedMap::new()).unwrap();
    assert_eq!(found.len(), expected);
    assert!(found.iter().all(|m| m.node(a) == Some(&NodeImage::Node(n))));
}

#[rstest]
#[case::injective(true, 0)]
#[case::non_injective(false, 1)]
fn positive_conditions_keep_fresh_nodes_apart_from_roots(#[case] injective: bool, #[case] expected: usize) {
    let mut hb = HostGraph::builder(TYPES.clone());
    let n = hb.node("T").unwrap();
    hb.edge(n, "r", n).unwrap();
    let host = hb.build();

    let (pattern, _) = edge_from_a(Quantifier::Exists);
    let factory = MatcherFactory::new(pattern, config(injective));
    assert_eq!(factory.root_matcher().unwrap().count(&host, &SeedMap::new()).unwrap(), expected);
}

#[rstest]
#[case::positive(true, 0)]
#[case::vacuous(false, 1)]
fn forall_without_sub_matches(#[case] positive: bool, #[case] expected: usize) {
    let (host, _) = people(&[30], &[]);
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.sharp_node(root, "p", "A").unwrap();
    let each = b.condition(root, "friend", Quantifier::Forall { positive }).unwrap();
    let f = b.sharp_node(each, "f", "A").unwrap();
    b.edge(each, p, "knows", f).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    assert_eq!(factory.root_matcher().unwrap().count(&host, &SeedMap::new()).unwrap(), expected);
}

#[rstest]
#[case::simple(false, 1)]
#[case::multigraph(true, 4)]
fn parallel_edges_between_bound_ends(#[case] multigraph: bool, #[case] expected: usize) {
    init_test_logger();
    let mut hb = HostGraph::builder(TYPES.clone());
    if multigraph {
        hb = hb.multigraph();
    }
    let n1 = hb.node("T").unwrap();
    let n2 = hb.node("T").unwrap();
    hb.edge(n1, "r", n2).unwrap();
    hb.edge(n1, "r", n2).unwrap();
    let host = hb.build();
    assert_eq!(host.is_simple(), !multigraph);

    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let x = b.node(root, "x", "T").unwrap();
    let y = b.node(root, "y", "T").unwrap();
    let first = b.edge(root, x, "r", y).unwrap();
    let second = b.edge(root, x, "r", y).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    let strategy = factory.root_matcher().unwrap();

    // The second edge runs with both ends bound.
    assert_eq!(strategy.plan().items()[1].is_singular(&host), !multigraph);
    let found = strategy.find_all(&host, &SeedMap::new()).unwrap();
    let pairs: BTreeSet<_> = found.iter().map(|m| (m.edge(first), m.edge(second))).collect();
    assert_eq!(pairs.len(), expected);
}

#[test]
fn relevant_plans_keep_no_signatures() {
    let (host, _) = people(&[20, 30, 40], &[(0, 1), (1, 2), (0, 2)]);
    let mut b = Pattern::builder(TYPES.clone());
    let root = b.root();
    let p = b.sharp_node(root, "p", "A").unwrap();
    let q = b.sharp_node(root, "q", "A").unwrap();
    b.edge(root, p, "knows", q).unwrap();
    let factory = MatcherFactory::new(b.build().unwrap(), config(true));
    let strategy = factory.root_matcher().unwrap();

    let mut search = strategy.search(&host).unwrap();
    let mut found = 0;
    while search.find().unwrap() {
        found += 1;
        assert_eq!(search.tracked_signatures(), 0);
    }
    assert_eq!(found, 3);
}
