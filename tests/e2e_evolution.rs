//! End-to-end evolution tests: update rules, the tick ordering, and
//! reward-driven rewiring.

use pretty_assertions::assert_eq;
use snee::{Network, Properties, Value};

#[test]
fn binary_average_keeps_values_extreme() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 12)
            .with("topology", "complete")
            .with("update_method", "average")
            .with("seed", 41),
    )
    .unwrap();
    for _ in 0..5 {
        net.step().unwrap();
    }
    for i in 0..12 {
        for &x in net.diffusion(i).unwrap() {
            assert!(x == 1.0 || x == -1.0, "binary value drifted to {x}");
        }
    }
}

#[test]
fn continuous_average_stays_clamped_and_contracts() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 10)
            .with("topology", "complete")
            .with("diffusion_space", "continuous")
            .with("selfloops", false)
            .with("update_method", "average")
            .with("seed", 42),
    )
    .unwrap();

    let spread = |net: &Network| {
        let xs: Vec<f64> = (0..10).map(|i| net.diffusion(i).unwrap()[0]).collect();
        let max = xs.iter().cloned().fold(f64::MIN, f64::max);
        let min = xs.iter().cloned().fold(f64::MAX, f64::min);
        max - min
    };

    let before = spread(&net);
    for _ in 0..20 {
        net.step().unwrap();
    }
    let after = spread(&net);
    assert!(after <= before, "averaging must not widen the spread");
    for i in 0..10 {
        let x = net.diffusion(i).unwrap()[0];
        assert!((-1.0..=1.0).contains(&x));
    }
}

#[test]
fn weighted_average_follows_normalized_weights() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 3)
            .with("diffusion_space", "continuous")
            .with("init_extremes", false)
            .with("update_method", "wt. avg.")
            .with("normalize", true)
            .with("selfloops", false)
            .with("weight_dist", "uniform")
            .with("weight_min", 0.25)
            .with("weight_max", 1.0)
            .with("seed", 53),
    )
    .unwrap();
    net.connect(0, 1).unwrap();
    net.connect(0, 2).unwrap();

    let x0 = net.diffusion(0).unwrap()[0];
    let x1 = net.diffusion(1).unwrap()[0];
    let x2 = net.diffusion(2).unwrap()[0];
    let w1 = net.normalized_weight(0, 1).unwrap();
    let w2 = net.normalized_weight(0, 2).unwrap();
    let gravity = net.agent_type_of(0).unwrap().gravity;

    // The normalized row sums to 1, so the weighted mean is w1*x1 + w2*x2.
    let mean = w1 * x1 + w2 * x2;
    let expected = (x0 + gravity * (mean - x0)).clamp(-1.0, 1.0);

    net.step().unwrap();
    assert!((net.diffusion(0).unwrap()[0] - expected).abs() < 1e-12);
}

#[test]
fn confidence_bound_excludes_dissimilar_influencers() {
    fn minority_node(net: &Network) -> usize {
        let xs: Vec<f64> = (0..3).map(|i| net.diffusion(i).unwrap()[0]).collect();
        (0..3).find(|&i| xs.iter().filter(|&&x| x == xs[i]).count() == 1).unwrap()
    }
    // The dissenter links to both majority nodes; every reward across those
    // edges is 0 on a single disagreeing binary dimension.
    let build = |confidence: f64| {
        let mut net = Network::new(
            Properties::new()
                .with("n", 3)
                .with("update_method", "majority")
                .with("confidence_bound", true)
                .with("confidence_const", confidence)
                .with("selfloops", false)
                .with("seed", 54),
        )
        .unwrap();
        let m = minority_node(&net);
        for v in 0..3 {
            if v != m {
                net.connect(m, v).unwrap();
            }
        }
        net
    };

    // Bound 1 - 0.5 = 0.5: reward 0 falls below it, the influencer set
    // empties, and the dissenter holds its opinion.
    let mut strict = build(0.5);
    let m = minority_node(&strict);
    let before = strict.diffusion(m).unwrap()[0];
    strict.step().unwrap();
    assert_eq!(strict.diffusion(m).unwrap()[0], before);

    // Bound 1 - 1.0 = 0: everyone qualifies and the majority flips it.
    let mut open = build(1.0);
    let m = minority_node(&open);
    let before = open.diffusion(m).unwrap()[0];
    open.step().unwrap();
    assert_eq!(open.diffusion(m).unwrap()[0], -before);
}

#[test]
fn rebels_move_away_and_resistance_gates_the_pull() {
    let base = |resistance: f64| {
        Properties::new()
            .with("n", 2)
            .with("diffusion_space", "continuous")
            .with("init_extremes", false)
            .with("selfloops", false)
            .with(
                "agent_types",
                Value::from_iter([(
                    "contrarian",
                    Value::from_iter([
                        ("conformity", Value::from("rebelling")),
                        ("gravity", Value::from(0.5)),
                    ]),
                )]),
            )
            .with("type_dist", Value::from_iter([("contrarian", 1.0)]))
            .with("resistance_const", resistance)
            .with("seed", 55)
    };

    // No resistance: the rebel steps away from its neighbor's value.
    let mut net = Network::new(base(0.0)).unwrap();
    net.connect(0, 1).unwrap();
    let x0 = net.diffusion(0).unwrap()[0];
    let x1 = net.diffusion(1).unwrap()[0];
    let expected = (x0 - 0.5 * (x1 - x0)).clamp(-1.0, 1.0);
    net.step().unwrap();
    assert!((net.diffusion(0).unwrap()[0] - expected).abs() < 1e-12);

    // Full resistance outweighs any sub-extreme neighborhood mean.
    let mut net = Network::new(base(1.0)).unwrap();
    net.connect(0, 1).unwrap();
    let before = net.diffusion(0).unwrap()[0];
    net.step().unwrap();
    assert_eq!(net.diffusion(0).unwrap()[0], before);
}

#[test]
fn majority_on_a_complete_graph_converges_in_one_tick() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 5)
            .with("topology", "complete")
            .with("update_method", "majority")
            .with("seed", 43),
    )
    .unwrap();

    // n = 5 splits 2/2 with one random extra, so one side always holds 3.
    let ones = (0..5).filter(|&i| net.diffusion(i).unwrap()[0] == 1.0).count();
    let majority = if ones >= 3 { 1.0 } else { -1.0 };

    net.step().unwrap();
    for i in 0..5 {
        assert_eq!(net.diffusion(i).unwrap()[0], majority);
    }
}

#[test]
fn voter_requires_unanimity() {
    // Node 2 is linked to two disagreeing nodes: it must not move.
    let mut net = Network::new(
        Properties::new()
            .with("n", 3)
            .with("update_method", "voter")
            .with("selfloops", false)
            .with("p_update", 1.0)
            .with("seed", 44),
    )
    .unwrap();
    let split = (0..3).any(|i| net.diffusion(i).unwrap()[0] != net.diffusion(0).unwrap()[0]);
    assert!(split, "n = 3 always has a 2/1 split");

    net.connect(0, 1).unwrap();
    net.connect(0, 2).unwrap();
    if net.diffusion(1).unwrap()[0] != net.diffusion(2).unwrap()[0] {
        let before = net.diffusion(0).unwrap()[0];
        net.step().unwrap();
        assert_eq!(net.diffusion(0).unwrap()[0], before, "no unanimity, no move");
    }
}

#[test]
fn transmission_spreads_through_contact() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 10)
            .with("topology", "complete")
            .with("diffusion_space", "categorical")
            .with("category_dist", Value::from_iter([("infected", 0.5), ("susceptible", 0.5)]))
            .with("update_method", "transmission")
            .with("transmission", Value::from_iter([(
                "susceptible",
                Value::from_iter([("infected", 1.0)]),
            )]))
            .with("seed", 45),
    )
    .unwrap();

    // Sorted category order: infected = 1, susceptible = 2. Certain
    // transmission on a complete graph converts everyone in one tick.
    net.step().unwrap();
    for i in 0..10 {
        assert_eq!(net.diffusion(i).unwrap()[0], 1.0, "node {i} still susceptible");
    }
}

#[test]
fn auto_transmission_fires_without_contact() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 6)
            .with("diffusion_space", "categorical")
            .with("category_dist", Value::from_iter([("recovered", 0.0), ("sick", 1.0)]))
            .with("update_method", "transmission")
            .with("auto_transmission", Value::from_iter([(
                "sick",
                Value::from_iter([("recovered", 1.0)]),
            )]))
            .with("selfloops", false)
            .with("seed", 46),
    )
    .unwrap();

    // No edges at all: only the unconditional transition can act.
    net.step().unwrap();
    // Influencer sets are empty on an edgeless graph, so nothing updates —
    // connect a pair and verify the fallback fires for them.
    net.connect(0, 1).unwrap();
    net.step().unwrap();
    assert_eq!(net.diffusion(0).unwrap()[0], 1.0);
    assert_eq!(net.diffusion(1).unwrap()[0], 1.0);
}

#[test]
fn low_similarity_edges_are_dropped() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 4)
            .with("topology", "complete")
            .with("selfloops", false)
            .with("p_update", 0.0)
            .with("p_disconnect", 1.0)
            .with("thresh_disconnect", 0.5)
            .with("num_disconnections", 10)
            .with("seed", 47),
    )
    .unwrap();

    let (removed, added) = net.step().unwrap();
    assert!(added.is_empty(), "p_connect defaults to 0");
    assert!(!removed.is_empty());

    // Every surviving edge links agreeing nodes; every removed one did not.
    for edge in net.edges() {
        assert_eq!(net.diffusion(edge.src).unwrap(), net.diffusion(edge.dst).unwrap());
    }
    for edge in &removed {
        assert_ne!(net.diffusion(edge.src).unwrap(), net.diffusion(edge.dst).unwrap());
    }
    // Complete graph on 2+2 opinions: the 4 cross-opinion edges go, 2 stay.
    assert_eq!(net.edge_count(), 2);
}

#[test]
fn high_similarity_nonneighbors_are_joined() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 4)
            .with("selfloops", false)
            .with("p_update", 0.0)
            .with("p_connect", 1.0)
            .with("thresh_connect", 0.5)
            .with("num_connections", 10)
            .with("seed", 48),
    )
    .unwrap();

    // Edgeless start: the connect pass pairs up agreeing nodes.
    let (removed, added) = net.step().unwrap();
    assert!(removed.is_empty());
    assert!(!added.is_empty());
    for edge in &added {
        assert_eq!(net.diffusion(edge.src).unwrap(), net.diffusion(edge.dst).unwrap());
    }
    // 2 nodes per opinion: exactly one edge per agreeing pair.
    assert_eq!(net.edge_count(), 2);
}

#[test]
fn zero_probability_rewiring_is_inert() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 8)
            .with("topology", "cycle")
            .with("p_update", 0.0)
            .with("seed", 49),
    )
    .unwrap();
    let before = net.edge_count();
    let (removed, added) = net.step().unwrap();
    assert!(removed.is_empty());
    assert!(added.is_empty());
    assert_eq!(net.edge_count(), before);
}

#[test]
fn selfloops_survive_stepping() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 6)
            .with("topology", "random")
            .with("saturation", 0.5)
            .with("p_disconnect", 1.0)
            .with("thresh_disconnect", 1.0) // every disagreeing neighbor qualifies
            .with("num_disconnections", 10)
            .with("seed", 50),
    )
    .unwrap();
    net.step().unwrap();
    for i in 0..6 {
        assert!(net.neighbors(i).unwrap().contains(&i), "self-loop on {i} was removed");
    }
}

#[test]
fn num_influencers_caps_the_set_without_breaking_updates() {
    let mut net = Network::new(
        Properties::new()
            .with("n", 20)
            .with("topology", "complete")
            .with("update_method", "average")
            .with("num_influencers", 3)
            .with("seed", 51),
    )
    .unwrap();
    net.step().unwrap();
    for i in 0..20 {
        let x = net.diffusion(i).unwrap()[0];
        assert!(x == 1.0 || x == -1.0);
    }
}

#[test]
fn seeded_evolution_is_reproducible() {
    let build = || {
        Network::new(
            Properties::new()
                .with("n", 15)
                .with("topology", "random")
                .with("saturation", 0.4)
                .with("diffusion_space", "continuous")
                .with("update_method", "average")
                .with("p_connect", 0.3)
                .with("p_disconnect", 0.3)
                .with("seed", 52),
        )
        .unwrap()
    };
    let mut a = build();
    let mut b = build();
    for _ in 0..5 {
        let (ra, aa) = a.step().unwrap();
        let (rb, ab) = b.step().unwrap();
        assert_eq!(ra, rb);
        assert_eq!(aa, ab);
    }
    for i in 0..15 {
        assert_eq!(a.diffusion(i).unwrap(), b.diffusion(i).unwrap());
    }
}
