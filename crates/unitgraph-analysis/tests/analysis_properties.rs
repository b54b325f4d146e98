//! Property tests for the analyzer's characterisations.

use std::collections::BTreeSet;

use proptest::prelude::*;
use unitgraph_analysis::{GraphAnalyzer, cycles::canonicalize};
use unitgraph_core::{AnalysisConfig, DependencyGraph, UnitKind, UnitRecord};

const IDS: [&str; 7] = ["A", "B", "C", "D", "E", "F", "G"];

fn arb_unit() -> impl Strategy<Value = UnitRecord> {
    (
        0..IDS.len(),
        prop::sample::select(vec![UnitKind::Model, UnitKind::Service, UnitKind::Framework]),
        prop::collection::vec(0..IDS.len() + 2, 0..4),
    )
        .prop_map(|(id, kind, targets)| {
            targets.into_iter().fold(UnitRecord::new(IDS[id], kind), |u, t| {
                // Indices past IDS become dangling targets.
                let target = IDS.get(t).map_or_else(|| format!("Ext{t}"), |s| (*s).to_string());
                u.depends_on(target, "method_call")
            })
        })
}

fn arb_graph() -> impl Strategy<Value = DependencyGraph> {
    prop::collection::vec(arb_unit(), 0..16).prop_map(|units| {
        let mut graph = DependencyGraph::new();
        graph.register_all(units).expect("valid units");
        graph
    })
}

fn config() -> AnalysisConfig {
    AnalysisConfig::default().with_seed(99)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn orphans_are_exactly_unreferenced_non_vendored_units(graph in arb_graph()) {
        let orphans: BTreeSet<String> =
            GraphAnalyzer::new(&graph, config()).orphans().into_iter().collect();

        for node in graph.nodes() {
            let expected =
                graph.dependents_of(node.identifier).is_empty() && !node.kind.is_vendored();
            prop_assert_eq!(orphans.contains(node.identifier), expected, "{}", node.identifier);
        }
    }

    #[test]
    fn dead_ends_are_exactly_units_without_dependencies(graph in arb_graph()) {
        let dead_ends: BTreeSet<String> =
            GraphAnalyzer::new(&graph, config()).dead_ends().into_iter().collect();

        for node in graph.nodes() {
            prop_assert_eq!(
                dead_ends.contains(node.identifier),
                graph.dependencies_of(node.identifier).is_empty()
            );
        }
    }

    #[test]
    fn hubs_are_sorted_and_bounded(graph in arb_graph(), limit in 0usize..6) {
        let hubs = GraphAnalyzer::new(&graph, config()).hubs(limit);

        prop_assert!(hubs.len() <= limit);
        for pair in hubs.windows(2) {
            prop_assert!(
                pair[0].dependent_count > pair[1].dependent_count
                    || (pair[0].dependent_count == pair[1].dependent_count
                        && pair[0].identifier < pair[1].identifier)
            );
        }
        for hub in &hubs {
            prop_assert_eq!(hub.dependent_count, graph.dependents_of(&hub.identifier).len());
        }
    }

    #[test]
    fn cycles_are_closed_canonical_and_distinct(graph in arb_graph()) {
        let cycles = GraphAnalyzer::new(&graph, config()).cycles();

        let distinct: BTreeSet<&Vec<String>> = cycles.iter().collect();
        prop_assert_eq!(distinct.len(), cycles.len());

        for cycle in &cycles {
            prop_assert!(cycle.len() >= 2);
            prop_assert_eq!(cycle.first(), cycle.last());
            prop_assert_eq!(&canonicalize(cycle), cycle);
            for step in cycle.windows(2) {
                prop_assert!(graph.dependencies_of(&step[0]).contains(step[1].as_str()));
            }
        }
    }

    #[test]
    fn rotations_canonicalize_identically(
        body in prop::sample::subsequence((0u8..20).collect::<Vec<u8>>(), 1..8).prop_shuffle(),
        shift in 0usize..8,
    ) {
        let mut rotated = body.clone();
        rotated.rotate_left(shift % body.len());
        prop_assert_eq!(canonicalize(&body), canonicalize(&rotated));
    }

    #[test]
    fn bridges_never_name_placeholders(graph in arb_graph()) {
        let analyzer = GraphAnalyzer::new(&graph, config());
        for bridge in analyzer.bridges(10, 500) {
            prop_assert!(graph.contains(&bridge.identifier));
            prop_assert!(bridge.count > 0);
        }
    }
}

#[test]
fn acyclic_layers_have_no_cycles() {
    let mut graph = DependencyGraph::new();
    for layer in 0..5 {
        for i in 0..5 {
            let mut unit = UnitRecord::new(format!("L{layer}N{i}"), UnitKind::Service);
            if layer < 4 {
                for j in 0..5 {
                    unit = unit.depends_on(format!("L{}N{j}", layer + 1), "method_call");
                }
            }
            graph.register(unit).expect("register");
        }
    }

    assert!(GraphAnalyzer::new(&graph, config()).cycles().is_empty());
}
