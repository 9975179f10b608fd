//! End-to-end construction tests: property validation, topology generation,
//! weight bounds, and the self-loop policy.

use pretty_assertions::assert_eq;
use snee::{Error, Network, Properties};

fn net(props: Properties) -> Network {
    Network::new(props).expect("construction should succeed")
}

#[test]
fn default_network_is_empty_undirected_simple() {
    let n = net(Properties::new());
    assert_eq!(n.node_count(), 0);
    assert_eq!(n.edge_count(), 0);
    assert!(n.is_graph());
    assert!(!n.is_digraph());
    assert!(!n.is_multigraph());
    assert!(!n.is_multidigraph());
}

#[test]
fn shape_flags_pick_the_four_kinds() {
    assert!(net(Properties::new().with("directed", true)).is_digraph());
    assert!(net(Properties::new().with("multiedge", true)).is_multigraph());
    assert!(
        net(Properties::new().with("directed", true).with("multiedge", true)).is_multidigraph()
    );
}

#[test]
fn nodes_iterate_in_order() {
    let n = net(Properties::new().with("n", 5));
    assert_eq!(n.node_count(), 5);
    assert_eq!(n.nodes().collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
}

#[test]
fn random_normal_weights_stay_in_bounds() {
    let n = net(
        Properties::new()
            .with("n", 100)
            .with("topology", "random")
            .with("weight_dist", "normal")
            .with("weight_min", -1.0)
            .with("weight_max", 1.0)
            .with("seed", 11),
    );
    assert!(n.edge_count() > 0);
    for edge in n.edges() {
        assert!(
            (-1.0..=1.0).contains(&edge.weight),
            "edge ({}, {}) weight {} out of bounds",
            edge.src,
            edge.dst,
            edge.weight
        );
    }
}

#[test]
fn uniform_weights_stay_in_bounds() {
    let n = net(
        Properties::new()
            .with("n", 50)
            .with("topology", "random")
            .with("saturation", 0.3)
            .with("weight_dist", "uniform")
            .with("weight_min", 0.25)
            .with("weight_max", 0.75)
            .with("seed", 12),
    );
    for edge in n.edges() {
        assert!((0.25..=0.75).contains(&edge.weight));
    }
}

#[test]
fn constant_weight_applies_to_every_edge() {
    let n = net(
        Properties::new()
            .with("n", 10)
            .with("topology", "complete")
            .with("weight_const", 3.5)
            .with("seed", 13),
    );
    for edge in n.edges() {
        assert_eq!(edge.weight, 3.5);
    }
}

#[test]
fn mandated_selfloops_connect_every_node() {
    let n = net(Properties::new().with("n", 6).with("topology", "cycle").with("seed", 1));
    for i in 0..6 {
        assert!(n.neighbors(i).unwrap().contains(&i), "node {i} should self-loop");
    }
}

#[test]
fn disabled_selfloops_never_appear_and_connect_is_noop() {
    let mut n = net(
        Properties::new()
            .with("n", 6)
            .with("topology", "complete")
            .with("selfloops", false)
            .with("seed", 1),
    );
    for i in 0..6 {
        assert!(!n.neighbors(i).unwrap().contains(&i));
    }
    assert_eq!(n.connect(2, 2).unwrap(), vec![]);
    assert!(!n.neighbors(2).unwrap().contains(&2));
}

#[test]
fn disconnecting_a_mandated_selfloop_is_a_noop() {
    let mut n = net(Properties::new().with("n", 3).with("seed", 1));
    assert_eq!(n.disconnect(1, 1).unwrap(), vec![]);
    assert!(n.neighbors(1).unwrap().contains(&1));
}

#[test]
fn barbell_construction_survives_tiny_networks() {
    // Too few nodes for two bells and a bridge: falls back to a complete
    // graph instead of failing, even for a single node.
    for n in [1usize, 2, 5] {
        let g = net(
            Properties::new()
                .with("n", n)
                .with("topology", "barbell")
                .with("selfloops", false)
                .with("seed", 8),
        );
        assert_eq!(g.edge_count(), n * (n - 1) / 2, "n = {n}");
    }
}

#[test]
fn complete_topology_links_every_pair() {
    let n = net(
        Properties::new()
            .with("n", 8)
            .with("topology", "complete")
            .with("selfloops", false)
            .with("seed", 2),
    );
    assert_eq!(n.edge_count(), 8 * 7 / 2);
    for u in 0..8 {
        assert_eq!(n.neighbors(u).unwrap().len(), 7);
    }
}

#[test]
fn star_topology_centers_on_node_zero() {
    let n = net(
        Properties::new()
            .with("n", 7)
            .with("topology", "star")
            .with("selfloops", false)
            .with("seed", 3),
    );
    assert_eq!(n.neighbors(0).unwrap().len(), 6);
    for u in 1..7 {
        assert_eq!(n.neighbors(u).unwrap(), vec![0]);
    }
}

#[test]
fn directed_symmetric_random_mirrors_every_edge() {
    let n = net(
        Properties::new()
            .with("n", 30)
            .with("topology", "random")
            .with("saturation", 0.2)
            .with("directed", true)
            .with("symmetric", true)
            .with("selfloops", false)
            .with("seed", 4),
    );
    for edge in n.edges() {
        assert!(n.has_edge(edge.dst, edge.src), "({}, {}) not mirrored", edge.src, edge.dst);
    }
}

#[test]
fn construction_fails_on_contradictory_bounds() {
    let bad = Properties::new()
        .with("weight_dist", "normal")
        .with("weight_min", 1.0)
        .with("weight_max", -1.0);
    assert!(matches!(Network::new(bad), Err(Error::IncompatibleProperty(_))));

    let bad = Properties::new().with("weight_dist", "normal").with("weight_min", 0.0);
    assert!(matches!(Network::new(bad), Err(Error::IncompatibleProperty(_))));
}

#[test]
fn construction_fails_on_unknown_enumerated_value() {
    let bad = Properties::new().with("topology", "torus");
    assert!(matches!(Network::new(bad), Err(Error::InvalidProperty { .. })));
}

#[test]
fn unknown_keys_survive_to_the_bag() {
    let n = net(Properties::new().with("n", 2).with("renderer_hint", "fast"));
    assert_eq!(n.prop("renderer_hint").unwrap().as_str(), Some("fast"));
    assert!(matches!(n.prop("never_set"), Err(Error::UndefinedProperty(_))));
}

#[test]
fn binary_diffusion_is_balanced_and_extreme() {
    let n = net(Properties::new().with("n", 40).with("dimensions", 3).with("seed", 5));
    let mut positive = 0;
    for i in 0..40 {
        for &x in n.diffusion(i).unwrap() {
            assert!(x == 1.0 || x == -1.0);
        }
        if n.diffusion(i).unwrap()[0] == 1.0 {
            positive += 1;
        }
    }
    // Even n splits exactly in half per dimension.
    assert_eq!(positive, 20);
}

#[test]
fn free_continuous_diffusion_stays_in_range() {
    let n = net(
        Properties::new()
            .with("n", 30)
            .with("diffusion_space", "continuous")
            .with("init_extremes", false)
            .with("dimensions", 2)
            .with("seed", 6),
    );
    for i in 0..30 {
        for &x in n.diffusion(i).unwrap() {
            assert!((-1.0..=1.0).contains(&x));
        }
    }
}

#[test]
fn categorical_diffusion_draws_from_the_table() {
    use snee::Value;
    let n = net(
        Properties::new()
            .with("n", 20)
            .with("diffusion_space", "categorical")
            .with("category_dist", Value::from_iter([("a", 0.5), ("b", 0.5)]))
            .with("update_method", "plurality")
            .with("seed", 7),
    );
    // Categories are stored 1-based in sorted-name order: a = 1, b = 2.
    let mut counts = [0usize; 2];
    for i in 0..20 {
        let x = n.diffusion(i).unwrap()[0];
        assert!(x == 1.0 || x == 2.0);
        counts[x as usize - 1] += 1;
    }
    assert_eq!(counts, [10, 10]);
}

#[test]
fn categorical_without_table_is_rejected() {
    let bad = Properties::new().with("n", 5).with("diffusion_space", "categorical");
    assert!(matches!(Network::new(bad), Err(Error::IncompatibleProperty(_))));
}

#[test]
fn averaging_on_a_categorical_space_is_rejected() {
    use snee::Value;
    // Interpolating category labels would produce values off the table, so
    // both averaging rules are refused at construction.
    for method in ["average", "wt. avg."] {
        let bad = Properties::new()
            .with("n", 5)
            .with("diffusion_space", "categorical")
            .with("category_dist", Value::from_iter([("a", 0.5), ("b", 0.5)]))
            .with("update_method", method);
        assert!(matches!(Network::new(bad), Err(Error::IncompatibleProperty(_))));
    }
    // Adoption-style rules remain valid.
    let ok = Properties::new()
        .with("n", 5)
        .with("diffusion_space", "categorical")
        .with("category_dist", Value::from_iter([("a", 0.5), ("b", 0.5)]))
        .with("update_method", "majority")
        .with("seed", 9);
    assert!(Network::new(ok).is_ok());
}

#[test]
fn seeded_construction_is_reproducible() {
    let props = || {
        Properties::new()
            .with("n", 25)
            .with("topology", "random")
            .with("saturation", 0.3)
            .with("weight_dist", "uniform")
            .with("seed", 99)
    };
    let a = net(props());
    let b = net(props());
    assert_eq!(a.edges(), b.edges());
    for i in 0..25 {
        assert_eq!(a.diffusion(i).unwrap(), b.diffusion(i).unwrap());
    }
}

#[test]
fn node_out_of_range_is_reported() {
    let mut n = net(Properties::new().with("n", 3));
    assert!(matches!(n.connect(0, 9), Err(Error::NodeOutOfRange(9, 3))));
    assert!(matches!(n.neighbors(7), Err(Error::NodeOutOfRange(7, 3))));
}

mod derivation {
    use proptest::prelude::*;
    use snee::Properties;

    proptest! {
        #[test]
        fn derived_mean_always_inside_bounds(
            lo in -100.0f64..100.0,
            span in 0.001f64..100.0,
        ) {
            let hi = lo + span;
            let props = snee::properties::validate(
                Properties::new()
                    .with("weight_dist", "normal")
                    .with("weight_min", lo)
                    .with("weight_max", hi),
            )
            .unwrap();
            let mean = props.get_f64("weight_mean").unwrap();
            let stdev = props.get_f64("weight_stdev").unwrap();
            prop_assert!((lo..=hi).contains(&mean));
            prop_assert!((stdev - span / 10.0).abs() < 1e-9);
        }

        #[test]
        fn uniform_weights_respect_arbitrary_bounds(
            lo in -10.0f64..10.0,
            span in 0.01f64..10.0,
            seed in 0u64..1000,
        ) {
            let hi = lo + span;
            let n = snee::Network::new(
                Properties::new()
                    .with("n", 10)
                    .with("topology", "complete")
                    .with("weight_dist", "uniform")
                    .with("weight_min", lo)
                    .with("weight_max", hi)
                    .with("seed", seed as i64),
            )
            .unwrap();
            for edge in n.edges() {
                prop_assert!((lo..=hi).contains(&edge.weight));
            }
        }
    }
}
