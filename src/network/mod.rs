//! # Network
//!
//! The single owner of all simulation state: graph store, validated property
//! bag, diffusion matrix, visibility masks, node scalars, normalized-weight
//! table, agent registry, and the per-instance PRNG.
//!
//! Construction runs the full pipeline: validate properties, build the
//! graph store, generate topology edges through the canonical [`connect`]
//! path, initialize diffusion vectors and node scalars, assign agent types.
//! After that, `connect`/`disconnect` are the only edge mutators and
//! [`step`] drives the simulation one tick at a time.
//!
//! [`connect`]: Network::connect
//! [`step`]: Network::step

mod rewire;
mod update;
mod views;

use std::collections::BTreeMap;

use hashbrown::HashMap;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;
use tracing::debug;

use crate::distribution::{self, Dist, DistParams};
use crate::graph::{GraphKind, GraphStore};
use crate::model::{
    AgentRegistry, AgentType, DiffusionSpace, Edge, UpdateMethod, Value, VisibilityPolicy,
};
use crate::properties::{self, Properties};
use crate::topology::Topology;
use crate::{metrics, Error, Result};

/// Per-(observer, observed) visibility flags, one per dimension.
pub type Mask = SmallVec<[u8; 16]>;

// ============================================================================
// Network
// ============================================================================

pub struct Network {
    props: Properties,
    store: GraphStore,

    // Cached at construction; the property bag stays authoritative for
    // anything not listed here.
    n: usize,
    dims: usize,
    directed: bool,
    symmetric: bool,
    selfloops: bool,
    normalize: bool,
    space: DiffusionSpace,
    visibility: VisibilityPolicy,
    method: UpdateMethod,
    weight_params: DistParams,

    // Mutable simulation state.
    diffusion: Vec<Vec<f64>>,
    masks: HashMap<(usize, usize), Mask>,
    norm_weights: Vec<HashMap<usize, f64>>,
    resistance: Vec<f64>,
    certainty: Vec<f64>,
    confidence: Vec<f64>,
    agents: AgentRegistry,
    /// Category names in index order; diffusion stores index + 1 so a masked
    /// entry (0) is never a valid category.
    categories: Vec<String>,
    rng: SmallRng,
}

impl Network {
    /// Build a network from a raw property bag. Validation failures abort
    /// construction entirely; there is no partially-built network.
    pub fn new(props: Properties) -> Result<Self> {
        let props = properties::validate(props)?;

        let n = props.get_usize("n")?;
        let dims = props.get_usize("dimensions")?;
        let directed = props.get_bool("directed")?;
        let symmetric = props.get_bool("symmetric")?;
        let selfloops = props.get_bool("selfloops")?;
        let normalize = props.get_bool("normalize")?;
        let multiedge = props.get_bool("multiedge")?;
        let space = parse_cached(DiffusionSpace::parse, &props, "diffusion_space")?;
        let visibility = parse_cached(VisibilityPolicy::parse, &props, "visibility")?;
        let method = parse_cached(UpdateMethod::parse, &props, "update_method")?;
        let weight_params = DistParams::from_props(&props, "weight", 1.0)?;

        let mut rng = match props.try_get("seed") {
            Some(v) => {
                let seed = v.as_int().ok_or_else(|| Error::InvalidProperty {
                    key: "seed".to_string(),
                    message: format!("expected an integer, got {v}"),
                })?;
                SmallRng::seed_from_u64(seed as u64)
            }
            None => SmallRng::from_entropy(),
        };

        let categories = category_names(&props)?;
        let diffusion = init_diffusion(&props, n, dims, space, &categories, &mut rng)?;
        let agents = assign_agents(&props, n, &mut rng)?;
        let resistance =
            node_scalar(&props, "resistance", n, &agents, |t| t.resistance, &mut rng)?;
        let certainty = node_scalar(&props, "certainty", n, &agents, |_| 1.0, &mut rng)?;
        let confidence =
            node_scalar(&props, "confidence", n, &agents, |t| t.confidence, &mut rng)?;

        let mut net = Self {
            store: GraphStore::new(GraphKind::from_flags(directed, multiedge)),
            n,
            dims,
            directed,
            symmetric,
            selfloops,
            normalize,
            space,
            visibility,
            method,
            weight_params,
            diffusion,
            masks: HashMap::new(),
            norm_weights: vec![HashMap::new(); n],
            resistance,
            certainty,
            confidence,
            agents,
            categories,
            rng,
            props,
        };
        net.build_topology()?;
        Ok(net)
    }

    fn build_topology(&mut self) -> Result<()> {
        let topology = parse_cached(Topology::parse, &self.props, "topology")?;
        let saturation = self.props.get_f64("saturation")?;
        let rewire = self.props.get_f64("rewire")?;
        let pairs =
            topology.generate(self.n, saturation, rewire, self.directed, self.symmetric, &mut self.rng);
        for (u, v) in pairs {
            self.connect(u, v)?;
        }
        if self.selfloops {
            for i in 0..self.n {
                self.connect(i, i)?;
            }
        }
        debug!(
            nodes = self.n,
            edges = self.store.edge_count(),
            topology = ?topology,
            "topology built"
        );
        Ok(())
    }

    // ========================================================================
    // Mutation protocol
    // ========================================================================

    /// Add an edge between `u` and `v`, sampling a fresh weight from the
    /// configured distribution. Duplicate simple edges and disallowed
    /// self-loops are no-ops (empty result).
    pub fn connect(&mut self, u: usize, v: usize) -> Result<Vec<Edge>> {
        self.connect_with(u, v, None, 1.0)
    }

    /// `connect` with an edge label (meaningful on multi-edge shapes only).
    pub fn connect_labeled(&mut self, u: usize, v: usize, label: &str) -> Result<Vec<Edge>> {
        self.connect_with(u, v, Some(label), 1.0)
    }

    /// The full connect path: canonical node order, Bernoulli gate on `p`,
    /// fresh weight, symmetric mirroring, mask creation, normalized-weight
    /// maintenance. Returns the edges actually added.
    pub fn connect_with(
        &mut self,
        u: usize,
        v: usize,
        label: Option<&str>,
        p: f64,
    ) -> Result<Vec<Edge>> {
        self.check_node(u)?;
        self.check_node(v)?;
        if u == v && !self.selfloops {
            return Ok(Vec::new());
        }
        if p <= 0.0 || (p < 1.0 && !self.rng.gen_bool(p)) {
            return Ok(Vec::new());
        }

        let (u, v) = self.canonical(u, v);
        let weight = distribution::edge_weight(&mut self.rng, &self.weight_params);
        if !self.store.add(u, v, label.map(String::from), weight) {
            return Ok(Vec::new());
        }
        let mut added = vec![Edge { src: u, dst: v, label: label.map(String::from), weight }];

        if self.symmetric && self.directed && u != v && !self.store.has_edge(v, u) {
            let back = distribution::edge_weight(&mut self.rng, &self.weight_params);
            if self.store.add(v, u, label.map(String::from), back) {
                added.push(Edge { src: v, dst: u, label: label.map(String::from), weight: back });
            }
        }

        self.reset_view(u, v);
        self.refresh_norm_row(u);
        self.refresh_norm_row(v);
        Ok(added)
    }

    /// Remove the edge between `u` and `v`. Fails with [`Error::NotFound`]
    /// when no such edge (or no such label) exists; removing a mandated
    /// self-loop is a no-op.
    pub fn disconnect(&mut self, u: usize, v: usize) -> Result<Vec<Edge>> {
        self.disconnect_with(u, v, None, 1.0)
    }

    /// `disconnect` restricted to one labeled multi-edge.
    pub fn disconnect_labeled(&mut self, u: usize, v: usize, label: &str) -> Result<Vec<Edge>> {
        self.disconnect_with(u, v, Some(label), 1.0)
    }

    /// The full disconnect path. Removes the edge(s), the corresponding
    /// masks once the last edge between the pair is gone, and refreshes the
    /// normalized-weight rows of both endpoints.
    pub fn disconnect_with(
        &mut self,
        u: usize,
        v: usize,
        label: Option<&str>,
        p: f64,
    ) -> Result<Vec<Edge>> {
        self.check_node(u)?;
        self.check_node(v)?;
        // Mandated self-loops may never be removed; absent ones don't exist.
        if u == v {
            return Ok(Vec::new());
        }
        if p <= 0.0 || (p < 1.0 && !self.rng.gen_bool(p)) {
            return Ok(Vec::new());
        }

        let (u, v) = self.canonical(u, v);
        let records = self.store.remove(u, v, label).ok_or_else(|| match label {
            Some(l) => Error::NotFound(format!("no edge ({u}, {v}) labeled [{l}]")),
            None => Error::NotFound(format!("no edge ({u}, {v})")),
        })?;
        let mut removed: Vec<Edge> = records
            .into_iter()
            .map(|r| Edge { src: u, dst: v, label: r.label, weight: r.weight })
            .collect();

        if self.symmetric && self.directed {
            if let Some(back) = self.store.remove(v, u, label) {
                removed.extend(
                    back.into_iter()
                        .map(|r| Edge { src: v, dst: u, label: r.label, weight: r.weight }),
                );
            }
        }

        self.drop_orphan_masks(u, v);
        self.refresh_norm_row(u);
        self.refresh_norm_row(v);
        Ok(removed)
    }

    /// One simulation tick: disconnect pass, update pass, connect pass.
    /// Returns the edges removed and added, for incremental rendering.
    pub fn step(&mut self) -> Result<(Vec<Edge>, Vec<Edge>)> {
        let removed = self.get_disconnections()?;
        let updated = self.update()?;
        let added = self.get_connections()?;
        debug!(
            removed = removed.len(),
            updated = updated.len(),
            added = added.len(),
            "tick complete"
        );
        Ok((removed, added))
    }

    // ========================================================================
    // Inspection protocol
    // ========================================================================

    pub fn node_count(&self) -> usize {
        self.n
    }

    pub fn nodes(&self) -> impl Iterator<Item = usize> {
        0..self.n
    }

    /// Nodes `u` observes (its out-neighbors), sorted.
    pub fn neighbors(&self, u: usize) -> Result<Vec<usize>> {
        self.check_node(u)?;
        Ok(self.store.out_neighbors(u))
    }

    /// Weight of the edge u→v (the first parallel record on multi shapes).
    pub fn edge_weight(&self, u: usize, v: usize) -> Result<f64> {
        self.check_node(u)?;
        self.check_node(v)?;
        self.store
            .weight(u, v)
            .ok_or_else(|| Error::NotFound(format!("no edge ({u}, {v})")))
    }

    /// Weight of the labeled multi-edge u→v. On simple shapes the label is
    /// ignored and the plain edge weight is returned.
    pub fn edge_weight_labeled(&self, u: usize, v: usize, label: &str) -> Result<f64> {
        self.check_node(u)?;
        self.check_node(v)?;
        self.store
            .weight_labeled(u, v, label)
            .ok_or_else(|| Error::NotFound(format!("no edge ({u}, {v}) labeled [{label}]")))
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.store.has_edge(u, v)
    }

    /// Every edge currently stored (undirected pairs reported once).
    pub fn edges(&self) -> Vec<Edge> {
        self.store
            .edges()
            .into_iter()
            .map(|(src, dst, label, weight)| Edge { src, dst, label, weight })
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    pub fn kind(&self) -> GraphKind {
        self.store.kind()
    }

    pub fn is_graph(&self) -> bool {
        self.kind() == GraphKind::Graph
    }

    pub fn is_digraph(&self) -> bool {
        self.kind() == GraphKind::DiGraph
    }

    pub fn is_multigraph(&self) -> bool {
        self.kind() == GraphKind::MultiGraph
    }

    pub fn is_multidigraph(&self) -> bool {
        self.kind() == GraphKind::MultiDiGraph
    }

    pub fn props(&self) -> &Properties {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Result<&Value> {
        self.props.get(key)
    }

    /// Node `u`'s true (unmasked) diffusion vector.
    pub fn diffusion(&self, u: usize) -> Result<&[f64]> {
        self.check_node(u)?;
        Ok(&self.diffusion[u])
    }

    pub fn agent_type_of(&self, u: usize) -> Result<&AgentType> {
        self.check_node(u)?;
        Ok(self.agents.type_of(u))
    }

    pub fn resistance(&self, u: usize) -> Result<f64> {
        self.check_node(u)?;
        Ok(self.resistance[u])
    }

    pub fn certainty(&self, u: usize) -> Result<f64> {
        self.check_node(u)?;
        Ok(self.certainty[u])
    }

    pub fn confidence(&self, u: usize) -> Result<f64> {
        self.check_node(u)?;
        Ok(self.confidence[u])
    }

    /// `v`'s share of `u`'s total inbound weight, when normalization is on.
    pub fn normalized_weight(&self, u: usize, v: usize) -> Option<f64> {
        self.norm_weights.get(u)?.get(&v).copied()
    }

    // ========================================================================
    // On-demand metrics (never cached)
    // ========================================================================

    pub fn degree_centrality(&self) -> Vec<f64> {
        metrics::degree_centrality(&self.store, self.n)
    }

    pub fn closeness_centrality(&self) -> Vec<f64> {
        metrics::closeness_centrality(&self.store, self.n)
    }

    pub fn betweenness_centrality(&self) -> Vec<f64> {
        metrics::betweenness_centrality(&self.store, self.n)
    }

    pub fn clustering_coefficient(&self) -> Vec<f64> {
        metrics::clustering_coefficient(&self.store, self.n)
    }

    // ========================================================================
    // Internals shared across the submodules
    // ========================================================================

    fn check_node(&self, u: usize) -> Result<()> {
        if u < self.n {
            Ok(())
        } else {
            Err(Error::NodeOutOfRange(u, self.n))
        }
    }

    /// Undirected pairs are stored and reported with u <= v.
    fn canonical(&self, u: usize, v: usize) -> (usize, usize) {
        if !self.directed && u > v { (v, u) } else { (u, v) }
    }

    /// Whether visibility between the endpoints is mutual: always for
    /// undirected graphs, and for directed graphs only under symmetry.
    fn mutual_visibility(&self) -> bool {
        !self.directed || self.symmetric
    }

    /// Recompute node `u`'s inbound normalized-weight row.
    fn refresh_norm_row(&mut self, u: usize) {
        if !self.normalize {
            return;
        }
        let inbound = self.store.in_weights(u);
        let row = &mut self.norm_weights[u];
        row.clear();
        if inbound.is_empty() {
            return;
        }
        let total: f64 = inbound.iter().map(|(_, w)| w).sum();
        if total == 0.0 {
            // Degenerate cancellation: fall back to equal shares.
            let share = 1.0 / inbound.len() as f64;
            row.extend(inbound.into_iter().map(|(k, _)| (k, share)));
        } else {
            row.extend(inbound.into_iter().map(|(k, w)| (k, w / total)));
        }
    }
}

impl std::fmt::Debug for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Network")
            .field("kind", &self.store.kind())
            .field("n", &self.n)
            .field("edges", &self.store.edge_count())
            .field("dimensions", &self.dims)
            .field("space", &self.space)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Construction helpers
// ============================================================================

fn parse_cached<T>(
    parse: impl Fn(&str) -> Option<T>,
    props: &Properties,
    key: &str,
) -> Result<T> {
    let s = props.get_str(key)?;
    parse(s).ok_or_else(|| Error::InvalidProperty {
        key: key.to_string(),
        message: format!("unrecognized value [{s}]"),
    })
}

/// Category names in deterministic (BTreeMap) order.
fn category_names(props: &Properties) -> Result<Vec<String>> {
    let map = props.get("category_dist")?.as_map().ok_or_else(|| Error::InvalidProperty {
        key: "category_dist".to_string(),
        message: "expected a map".to_string(),
    })?;
    Ok(map.keys().cloned().collect())
}

/// Build the initial diffusion matrix per the configured space.
fn init_diffusion(
    props: &Properties,
    n: usize,
    dims: usize,
    space: DiffusionSpace,
    categories: &[String],
    rng: &mut SmallRng,
) -> Result<Vec<Vec<f64>>> {
    use rand::seq::SliceRandom;

    let init_extremes = props.get_bool("init_extremes")?;
    let mut matrix = vec![vec![0.0; dims]; n];

    match space {
        // Free continuous mode: uniform draw per entry.
        DiffusionSpace::Continuous if !init_extremes => {
            for row in &mut matrix {
                for x in row.iter_mut() {
                    *x = rng.gen_range(-1.0..=1.0);
                }
            }
        }
        // Binary, and extremes-initialized continuous: balanced polarization.
        // Half +1, half -1, remainder random, shuffled per dimension.
        DiffusionSpace::Binary | DiffusionSpace::Continuous => {
            for d in 0..dims {
                let mut column: Vec<f64> = Vec::with_capacity(n);
                column.extend(std::iter::repeat_n(1.0, n / 2));
                column.extend(std::iter::repeat_n(-1.0, n / 2));
                while column.len() < n {
                    column.push(if rng.gen_bool(0.5) { 1.0 } else { -1.0 });
                }
                column.shuffle(rng);
                for (i, x) in column.into_iter().enumerate() {
                    matrix[i][d] = x;
                }
            }
        }
        DiffusionSpace::Categorical => {
            let dist = props.get("category_dist")?.as_map().ok_or_else(|| {
                Error::InvalidProperty {
                    key: "category_dist".to_string(),
                    message: "expected a map".to_string(),
                }
            })?;
            for d in 0..dims {
                // Proportional assignment list, same floor-and-top-up scheme
                // the agent registry uses. Categories are stored 1-based.
                let mut column: Vec<f64> = Vec::with_capacity(n);
                let mut largest = 1.0;
                let mut largest_count = 0usize;
                for (idx, name) in categories.iter().enumerate() {
                    let p = dist.get(name).and_then(Value::as_float).unwrap_or(0.0);
                    let count = (p * n as f64).floor() as usize;
                    if count > largest_count {
                        largest_count = count;
                        largest = (idx + 1) as f64;
                    }
                    column.extend(std::iter::repeat_n((idx + 1) as f64, count));
                }
                while column.len() < n {
                    column.push(largest);
                }
                column.shuffle(rng);
                for (i, x) in column.into_iter().enumerate() {
                    matrix[i][d] = x;
                }
            }
        }
    }

    Ok(matrix)
}

fn assign_agents(props: &Properties, n: usize, rng: &mut SmallRng) -> Result<AgentRegistry> {
    let raw_types = props.get("agent_types")?.as_map().ok_or_else(|| Error::InvalidProperty {
        key: "agent_types".to_string(),
        message: "expected a map".to_string(),
    })?;
    let mut types = BTreeMap::new();
    for (name, record) in raw_types {
        types.insert(name.clone(), AgentType::from_value(name, record)?);
    }

    let raw_dist = props.get("type_dist")?.as_map().ok_or_else(|| Error::InvalidProperty {
        key: "type_dist".to_string(),
        message: "expected a map".to_string(),
    })?;
    let mut proportions = BTreeMap::new();
    for (name, p) in raw_dist {
        let p = p.as_float().ok_or_else(|| Error::InvalidProperty {
            key: "type_dist".to_string(),
            message: format!("proportion for [{name}] must be a number"),
        })?;
        proportions.insert(name.clone(), p);
    }

    AgentRegistry::assign(types, &proportions, n, rng)
}

/// Draw one per-node scalar column. A blank distribution falls back to the
/// per-node agent-type value.
fn node_scalar(
    props: &Properties,
    tag: &str,
    n: usize,
    agents: &AgentRegistry,
    fallback: impl Fn(&AgentType) -> f64,
    rng: &mut SmallRng,
) -> Result<Vec<f64>> {
    let params = DistParams::from_props(props, tag, 1.0)?;
    if params.dist == Dist::Blank {
        return Ok((0..n).map(|i| fallback(agents.type_of(i))).collect());
    }
    Ok(distribution::node_scalars(rng, &params, n))
}
