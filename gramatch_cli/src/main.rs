//! gramatch command-line driver
//!
//! Builds synthetic host graphs and one of the canned patterns, compiles the
//! search plan, prints it, and enumerates the matches.

mod args;
mod fixtures;

use std::ops::ControlFlow;
use std::sync::Arc;

use clap::Parser;
use itertools::Itertools;
use tracing::info;

use gramatch_subgraph::{FnVisitor, MatcherFactory, SeedMap, profiling};

use args::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let config = Arc::new(args.to_config()?);
    let types = fixtures::social_types()?;
    let pattern = fixtures::pattern(&types, args.pattern)?;

    info!("Building {} host graph(s) with {} persons", args.hosts.max(1), args.nodes);
    let hosts = (0..args.hosts.max(1))
        .map(|variant| fixtures::social_host(&types, args.nodes.max(1), args.degree, variant))
        .collect::<Result<Vec<_>, _>>()?;

    let factory = MatcherFactory::new(pattern, config);
    let strategy = factory.root_matcher()?;
    println!("=== Search plan ({:?}) ===", args.pattern);
    println!("{}", strategy.plan());

    let seeds = SeedMap::new();
    if let [host] = hosts.as_slice() {
        let mut printed = 0usize;
        let total = strategy.traverse(
            host,
            &seeds,
            FnVisitor::new(|found| {
                if printed < args.limit {
                    println!("{found}");
                    printed += 1;
                }
                ControlFlow::Continue(())
            }),
        )?;
        println!("=== {total} match(es) ===");
    } else {
        let refs = hosts.iter().collect::<Vec<_>>();
        let counts = strategy
            .find_all_par(&refs, &seeds)
            .into_iter()
            .map(|found| found.map(|matches| matches.len()))
            .collect::<Result<Vec<_>, _>>()?;
        println!(
            "=== {} match(es) over {} hosts: [{}] ===",
            counts.iter().sum::<usize>(),
            counts.len(),
            counts.iter().join(", ")
        );
    }

    profiling::report();
    Ok(())
}
