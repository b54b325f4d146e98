//! Property tests for dependency graph bookkeeping.
//!
//! Random unit batches (with dangling targets, self-edges, and repeated
//! registrations) must keep forward and reverse indices consistent and
//! survive a snapshot round trip.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;
use unitgraph_core::{DependencyGraph, UnitKind, UnitRecord};

const IDS: [&str; 8] = ["A", "B", "C", "D", "E", "F", "G", "H"];

fn arb_unit() -> impl Strategy<Value = UnitRecord> {
    (
        0..6usize,
        prop::sample::select(UnitKind::ALL.to_vec()),
        prop::collection::vec(0..IDS.len(), 0..5),
    )
        .prop_map(|(id, kind, targets)| {
            targets.into_iter().fold(UnitRecord::new(IDS[id], kind), |u, t| {
                u.depends_on(IDS[t], "method_call")
            })
        })
}

fn arb_batch() -> impl Strategy<Value = Vec<UnitRecord>> {
    prop::collection::vec(arb_unit(), 0..20)
}

fn build(units: &[UnitRecord]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph.register_all(units.iter().cloned()).expect("valid units");
    graph
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn reverse_index_mirrors_forward_edges(units in arb_batch()) {
        let graph = build(&units);

        for source in IDS {
            for target in graph.dependencies_of(source) {
                prop_assert!(graph.dependents_of(target).contains(source));
            }
            for dependent in graph.dependents_of(source) {
                prop_assert!(graph.dependencies_of(dependent).contains(source));
            }
        }
    }

    #[test]
    fn last_registration_wins(units in arb_batch()) {
        let graph = build(&units);

        let mut last: BTreeMap<&str, &UnitRecord> = BTreeMap::new();
        for unit in &units {
            last.insert(unit.identifier.as_str(), unit);
        }
        let only_last: Vec<UnitRecord> = last.values().map(|u| (*u).clone()).collect();
        let expected = build(&only_last);

        for id in IDS {
            prop_assert_eq!(graph.dependents_of(id), expected.dependents_of(id));
            prop_assert_eq!(graph.dependencies_of(id), expected.dependencies_of(id));
            prop_assert_eq!(graph.is_placeholder(id), expected.is_placeholder(id));
        }
        prop_assert_eq!(graph.node_count(), last.len());
    }

    #[test]
    fn snapshot_round_trip_preserves_adjacency(units in arb_batch()) {
        let graph = build(&units);
        let snapshot = graph.to_snapshot();
        let rebuilt = DependencyGraph::from_snapshot(&snapshot).expect("rebuild");

        for id in IDS {
            prop_assert_eq!(graph.dependents_of(id), rebuilt.dependents_of(id));
            prop_assert_eq!(graph.dependencies_of(id), rebuilt.dependencies_of(id));
        }
        prop_assert_eq!(&rebuilt.to_snapshot(), &snapshot);
    }

    #[test]
    fn nodes_exclude_placeholders(units in arb_batch()) {
        let graph = build(&units);
        let registered: BTreeSet<&str> = units.iter().map(|u| u.identifier.as_str()).collect();
        let listed: BTreeSet<&str> = graph.nodes().iter().map(|n| n.identifier).collect();

        prop_assert_eq!(listed, registered);
        for id in IDS {
            prop_assert!(!(graph.contains(id) && graph.is_placeholder(id)));
        }
    }
}

#[test]
fn json_batch_registration_rejects_malformed_unit() {
    let batch: Vec<serde_json::Value> = serde_json::from_str(
        r#"[
            {"identifier": "User", "type": "model", "dependencies": []},
            {"identifier": "Order", "type": "model", "dependencies": {"target": "User"}}
        ]"#,
    )
    .expect("json");

    let mut graph = DependencyGraph::new();
    let mut errors = Vec::new();
    for value in batch {
        match UnitRecord::from_value(value) {
            Ok(unit) => graph.register(unit).expect("register"),
            Err(err) => errors.push(err),
        }
    }

    assert_eq!(graph.node_count(), 1);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Order"));
}
