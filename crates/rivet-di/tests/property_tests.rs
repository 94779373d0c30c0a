//! Property-based tests for registration and resolution behavior

use proptest::prelude::*;
use rivet_di::*;

fn key(i: usize) -> String {
    format!("svc{}", i)
}

/// Dependencies always point at lower indices, so every layout is acyclic
fn arb_layout() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..16).prop_flat_map(|n| {
        (0..n)
            .map(|i| {
                if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::btree_set(0..i, 0..4)
                        .prop_map(|deps| deps.into_iter().collect::<Vec<_>>())
                        .boxed()
                }
            })
            .collect::<Vec<_>>()
    })
}

/// Each service builds to the number of dependencies it received
fn service(i: usize, deps: &[usize]) -> TypeInfo {
    deps.iter()
        .fold(TypeInfo::builder(key(i)), |info, &d| info.param(key(d), key(d)))
        .construct(|args| Ok(Instance::new(args.len())))
        .build()
        .unwrap()
}

fn populated(layout: &[Vec<usize>], lifetime: LifetimeKind) -> Container {
    let container = Container::builder()
        .default_lifetime(lifetime)
        .trace_events(false)
        .build()
        .unwrap();
    for (i, deps) in layout.iter().enumerate() {
        container
            .register_type_info(service(i, deps), RegistrationOptions::default())
            .unwrap();
    }
    container
}

proptest! {
    #[test]
    fn test_acyclic_layouts_always_resolve(layout in arb_layout()) {
        let container = populated(&layout, LifetimeKind::Transient);

        for (i, deps) in layout.iter().enumerate() {
            let built = container.resolve_sync_as::<usize>(&key(i)).unwrap();
            prop_assert_eq!(*built, deps.len());
        }
    }

    #[test]
    fn test_closing_any_edge_is_rejected(layout in arb_layout()) {
        let container = populated(&layout, LifetimeKind::Transient);

        if let Some((i, d)) = layout
            .iter()
            .enumerate()
            .find_map(|(i, deps)| deps.first().map(|&d| (i, d)))
        {
            let keys_before = container.keys();
            let back_edge = service(d, &[i]);
            let result = container.register_type_info(back_edge, RegistrationOptions::default());

            prop_assert!(
                matches!(result, Err(DIError::CyclicDependency { .. })),
                "closing the edge should be rejected"
            );
            prop_assert_eq!(container.keys(), keys_before);
            // the original registration is still usable
            prop_assert!(container.resolve_sync(&key(d)).is_ok());
        }
    }

    #[test]
    fn test_memory_lifetime_returns_one_instance(layout in arb_layout(), repeats in 2usize..5) {
        let container = populated(&layout, LifetimeKind::Memory);
        let last = key(layout.len() - 1);

        let first = container.resolve_sync(&last).unwrap();
        for _ in 0..repeats {
            prop_assert!(container.resolve_sync(&last).unwrap().ptr_eq(&first));
        }
    }

    #[test]
    fn test_missing_key_message_names_key(name in "[A-Za-z][A-Za-z0-9]{0,12}") {
        let container = Container::new();
        prop_assume!(name != CONTAINER_KEY);

        let err = container.resolve_sync(&name).unwrap_err();
        prop_assert_eq!(
            err.to_string(),
            format!("Nothing with key \"{}\" is registered in the container", name)
        );
    }
}
