//! Synthetic social host graphs and the canned patterns matched against them.

use std::sync::Arc;

use gramatch_common::{
    GraphError, HostGraph, Operator, Pattern, PatternError, Quantifier, RegExpr, SetOperator, Sort, TypeError,
    TypeGraph, Value,
};

use crate::args::PatternArg;

/// `Person` nodes with an integer `age` and a `knows` relation.
pub fn social_types() -> Result<Arc<TypeGraph>, TypeError> {
    let mut tb = TypeGraph::builder();
    tb.node_type("Entity");
    tb.subtype("Person", "Entity");
    tb.edge_label("knows");
    tb.edge_label("age");
    Ok(Arc::new(tb.build()?))
}

/// A deterministic host graph; `variant` shifts ages and acquaintances.
pub fn social_host(
    types: &Arc<TypeGraph>,
    persons: usize,
    degree: usize,
    variant: usize,
) -> Result<HostGraph, GraphError> {
    let mut b = HostGraph::builder(types.clone());
    let ids = (0..persons)
        .map(|_| b.node("Person"))
        .collect::<Result<Vec<_>, _>>()?;
    for (ix, &person) in ids.iter().enumerate() {
        let age = 18 + ((ix * 37 + variant * 11) % 60) as i64;
        let value = b.value_node(Value::Int(age));
        b.edge(person, "age", value)?;
        for step in 0..degree {
            let other = (ix * 7 + step * 13 + 1 + variant) % persons;
            b.edge(person, "knows", ids[other])?;
        }
    }
    Ok(b.build())
}

/// Build the canned pattern `which` over `types`.
pub fn pattern(types: &Arc<TypeGraph>, which: PatternArg) -> Result<Arc<Pattern>, PatternError> {
    let mut b = Pattern::builder(types.clone());
    let root = b.root();
    match which {
        PatternArg::Edge => {
            let a = b.node(root, "a", "Person")?;
            let c = b.node(root, "b", "Person")?;
            b.edge(root, a, "knows", c)?;
        }
        PatternArg::Triangle => {
            let a = b.node(root, "a", "Person")?;
            let c = b.node(root, "b", "Person")?;
            let d = b.node(root, "c", "Person")?;
            b.edge(root, a, "knows", c)?;
            b.edge(root, c, "knows", d)?;
            b.edge(root, d, "knows", a)?;
        }
        PatternArg::Eldest => {
            let p = b.node(root, "p", "Person")?;
            let age = b.value_node(root, "age", Sort::Int)?;
            b.edge(root, p, "age", age)?;
            let older = b.condition(root, "older", Quantifier::Not)?;
            let q = b.node(older, "q", "Person")?;
            let q_age = b.value_node(older, "q_age", Sort::Int)?;
            let yes = b.constant(older, "yes", Value::Bool(true))?;
            b.edge(older, p, "knows", q)?;
            b.edge(older, q, "age", q_age)?;
            b.operation(older, Operator::IntGt, &[q_age, age], yes)?;
        }
        PatternArg::Reach => {
            let x = b.node(root, "x", "Person")?;
            let y = b.node(root, "y", "Person")?;
            let knows = types
                .edge_label("knows")
                .ok_or_else(|| PatternError::UnknownLabel("knows".to_owned()))?;
            b.regex_edge(root, x, RegExpr::plus(RegExpr::Atom(knows)), y)?;
        }
        PatternArg::Popular => {
            let p = b.node(root, "p", "Person")?;
            let friends = b.value_node(root, "friends", Sort::Int)?;
            let total = b.value_node(root, "total_age", Sort::Int)?;
            let each = b.condition(root, "friend", Quantifier::Forall { positive: false })?;
            let f = b.node(each, "f", "Person")?;
            let age = b.value_node(each, "age", Sort::Int)?;
            b.edge(each, p, "knows", f)?;
            b.edge(each, f, "age", age)?;
            b.count(each, friends)?;
            b.set_operation(root, SetOperator::IntSum, each, age, total)?;
        }
    }
    b.build()
}

#[cfg(test)]
mod tests {
    use gramatch_common::Config;
    use gramatch_subgraph::{MatcherFactory, SeedMap};
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::edge(PatternArg::Edge)]
    #[case::triangle(PatternArg::Triangle)]
    #[case::eldest(PatternArg::Eldest)]
    #[case::reach(PatternArg::Reach)]
    #[case::popular(PatternArg::Popular)]
    fn canned_patterns_compile_and_run(#[case] which: PatternArg) {
        let types = social_types().unwrap();
        let host = social_host(&types, 12, 2, 0).unwrap();
        let factory = MatcherFactory::new(pattern(&types, which).unwrap(), Arc::new(Config::default()));
        let strategy = factory.root_matcher().unwrap();
        strategy.count(&host, &SeedMap::new()).unwrap();
    }

    #[test]
    fn every_person_is_counted_once_by_popular() {
        let types = social_types().unwrap();
        let host = social_host(&types, 10, 3, 1).unwrap();
        let factory = MatcherFactory::new(
            pattern(&types, PatternArg::Popular).unwrap(),
            Arc::new(Config::default()),
        );
        let count = factory.root_matcher().unwrap().count(&host, &SeedMap::new()).unwrap();
        assert_eq!(count, 10);
    }
}
