//! Property-based tests for cycle detection

use proptest::prelude::*;
use rivet_graph::Graph;

fn key(i: usize) -> String {
    format!("svc{}", i)
}

/// Edges always point from a higher index to a lower one, so the graph is a DAG
fn arb_dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2usize..24).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(0..i, 0..4).boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

proptest! {
    #[test]
    fn test_dag_registration_never_fails(dag in arb_dag()) {
        let mut graph = Graph::new();
        for (i, deps) in dag.iter().enumerate() {
            let deps: Vec<String> = deps.iter().map(|&d| key(d)).collect();
            prop_assert!(graph.add_and_verify(&key(i), deps).is_ok());
        }
        prop_assert!(!graph.has_cycle());
    }

    #[test]
    fn test_back_edge_is_rejected_and_rolled_back(dag in arb_dag()) {
        let mut graph = Graph::new();
        for (i, deps) in dag.iter().enumerate() {
            let deps: Vec<String> = deps.iter().map(|&d| key(d)).collect();
            graph.add_and_verify(&key(i), deps).unwrap();
        }

        // find any edge i -> d and try to close it with d -> i
        if let Some((i, d)) = dag
            .iter()
            .enumerate()
            .find_map(|(i, deps)| deps.first().map(|&d| (i, d)))
        {
            let before = graph.successors(&key(d));
            let result = graph.add_and_verify(&key(d), [key(i)]);
            prop_assert!(result.is_err());
            prop_assert!(!graph.has_cycle());
            prop_assert_eq!(graph.successors(&key(d)), before);
        }
    }

    #[test]
    fn test_clone_matches_original(dag in arb_dag()) {
        let mut graph = Graph::new();
        for (i, deps) in dag.iter().enumerate() {
            let deps: Vec<String> = deps.iter().map(|&d| key(d)).collect();
            graph.add(&key(i), deps);
        }

        let copy = graph.clone();
        for i in 0..dag.len() {
            prop_assert_eq!(copy.successors(&key(i)), graph.successors(&key(i)));
            prop_assert_eq!(copy.descendants(&key(i)), graph.descendants(&key(i)));
        }
    }
}
