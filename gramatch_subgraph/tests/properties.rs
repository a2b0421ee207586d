mod common;

use std::collections::BTreeSet;

use quickcheck::quickcheck;

use gramatch_common::{NodeImage, PNodeId};
use gramatch_subgraph::{Anchor, MatcherFactory, Search, SeedMap, TreeMatch};

use common::{Flat, Scenario, brute_force, config, flatten, init_test_logger};

fn drain(search: &mut Search<'_>) -> Vec<TreeMatch> {
    let mut out = Vec::new();
    while search.find().expect("find") {
        out.push(search.get_match().expect("current match"));
    }
    out
}

fn search_all(scenario: &Scenario) -> Vec<Flat> {
    let pattern = scenario.pattern();
    let host = scenario.host();
    let factory = MatcherFactory::new(pattern.clone(), config(scenario.injective));
    let strategy = factory.root_matcher().expect("plan compiles");
    strategy
        .find_all(&host, &SeedMap::new())
        .expect("search runs")
        .iter()
        .map(|m| flatten(&pattern, m))
        .collect()
}

quickcheck! {
    fn prop_matches_agree_with_enumeration(scenario: Scenario) -> bool {
        init_test_logger();
        let found: BTreeSet<Flat> = search_all(&scenario).into_iter().collect();
        found == brute_force(&scenario.pattern(), &scenario.host(), scenario.injective)
    }

    fn prop_no_match_is_reported_twice(scenario: Scenario) -> bool {
        let found = search_all(&scenario);
        let unique: BTreeSet<&Flat> = found.iter().collect();
        unique.len() == found.len()
    }

    fn prop_injective_images_are_distinct(scenario: Scenario) -> bool {
        if !scenario.injective {
            return true;
        }
        search_all(&scenario).into_iter().all(|(nodes, _)| {
            let distinct: BTreeSet<_> = nodes.iter().collect();
            distinct.len() == nodes.len()
        })
    }

    fn prop_seeded_search_respects_and_covers(scenario: Scenario) -> bool {
        let pattern = scenario.pattern();
        let host = scenario.host();
        let factory = MatcherFactory::new(pattern.clone(), config(scenario.injective));
        let first = PNodeId(0);
        let strategy = factory
            .create_matcher(pattern.root(), Anchor::new([first], [], []))
            .expect("seeded plan compiles");

        let mut union = BTreeSet::new();
        for image in host.node_ids() {
            let seeds = SeedMap::new().with_node(first, NodeImage::Node(image));
            let Ok(found) = strategy.find_all(&host, &seeds) else {
                return false;
            };
            for m in &found {
                if m.node(first) != Some(&NodeImage::Node(image)) {
                    return false;
                }
                union.insert(flatten(&pattern, m));
            }
        }
        union == search_all(&scenario).into_iter().collect()
    }

    fn prop_reset_replays_the_same_sequence(scenario: Scenario) -> bool {
        let pattern = scenario.pattern();
        let host = scenario.host();
        let factory = MatcherFactory::new(pattern.clone(), config(scenario.injective));
        let strategy = factory.root_matcher().expect("plan compiles");
        let mut search = strategy.search(&host).expect("search starts");

        let first = drain(&mut search);
        search.reset();
        let second = drain(&mut search);
        first == second && !search.find().expect("find after exhaustion")
    }

    fn prop_negation_excludes_exactly_the_extensible_matches(scenario: Scenario) -> bool {
        let Some((source, is_s, Some(target))) = scenario.negated else {
            return true;
        };
        let host = scenario.host();
        let negated: BTreeSet<Flat> = search_all(&scenario).into_iter().collect();

        let plain = scenario.pattern_with(false);
        let factory = MatcherFactory::new(plain.clone(), config(scenario.injective));
        let positive: BTreeSet<Flat> = factory
            .root_matcher()
            .expect("plan compiles")
            .find_all(&host, &SeedMap::new())
            .expect("search runs")
            .iter()
            .map(|m| flatten(&plain, m))
            .collect();

        let label = host.types().edge_label(if is_s { "s" } else { "r" }).expect("label");
        let expected: BTreeSet<Flat> = positive
            .into_iter()
            .filter(|(nodes, _)| {
                let (s, t) = (NodeImage::Node(nodes[source]), NodeImage::Node(nodes[target]));
                host.edges_between(&s, label, &t).is_empty()
            })
            .collect();
        negated == expected
    }
}
