//! # Topology Builder
//!
//! Turns a topology name plus density knobs into an initial edge list.
//! Generators only produce node pairs; the network feeds every pair through
//! its canonical `connect` path so weight sampling, masking, and weight
//! normalization behave identically for generated and hand-added edges.
//!
//! | Name | Generator |
//! |------|-----------|
//! | `""` | no edges |
//! | `"random"` | Erdős–Rényi, density = saturation |
//! | `"scale free"` | Barabási–Albert preferential attachment |
//! | `"small world"` | Watts–Strogatz ring lattice with rewiring |
//! | `"star"` | hub node 0 |
//! | `"complete"` | every pair |
//! | `"cycle"` | ring |
//! | `"barbell"` | two cliques joined by a bridge path |

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use hashbrown::HashSet;

/// Named initial-topology generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topology {
    Blank,
    Complete,
    Cycle,
    Random,
    ScaleFree,
    SmallWorld,
    Star,
    Barbell,
}

impl Topology {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Blank),
            "complete" => Some(Self::Complete),
            "cycle" => Some(Self::Cycle),
            "random" => Some(Self::Random),
            "scale free" => Some(Self::ScaleFree),
            "small world" => Some(Self::SmallWorld),
            "star" => Some(Self::Star),
            "barbell" => Some(Self::Barbell),
            _ => None,
        }
    }

    pub const DOMAIN: &'static [&'static str] =
        &["", "complete", "cycle", "random", "scale free", "small world", "star", "barbell"];

    /// Generate the initial edge list for `n` nodes.
    ///
    /// Undirected generators emit each pair once with u < v; the caller is
    /// responsible for mirroring when the graph is symmetric and directed.
    /// Only `random` is directedness-aware (it draws ordered pairs on
    /// directed graphs, with density halved under symmetric+directed so the
    /// mirrored insert does not double the effective density).
    pub fn generate(
        self,
        n: usize,
        saturation: f64,
        rewire: f64,
        directed: bool,
        symmetric: bool,
        rng: &mut SmallRng,
    ) -> Vec<(usize, usize)> {
        if n == 0 {
            return Vec::new();
        }
        match self {
            Self::Blank => Vec::new(),
            Self::Complete => complete(n),
            Self::Cycle => cycle(n),
            Self::Star => star(n),
            Self::Barbell => barbell(n),
            Self::Random => {
                let p = if symmetric && directed { saturation / 2.0 } else { saturation };
                erdos_renyi(n, p, directed, rng)
            }
            Self::ScaleFree => scale_free(n, saturation, rng),
            Self::SmallWorld => {
                let k = if directed {
                    ((saturation * n as f64 * 2.0) as usize).max(2)
                } else {
                    ((saturation * n as f64) as usize).max(2)
                };
                watts_strogatz(n, k, rewire, rng)
            }
        }
    }
}

// ============================================================================
// Generators
// ============================================================================

fn complete(n: usize) -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(n * (n - 1) / 2);
    for u in 0..n {
        for v in (u + 1)..n {
            edges.push((u, v));
        }
    }
    edges
}

fn cycle(n: usize) -> Vec<(usize, usize)> {
    match n {
        0 | 1 => Vec::new(),
        2 => vec![(0, 1)],
        _ => (0..n).map(|i| (i, (i + 1) % n)).collect(),
    }
}

fn star(n: usize) -> Vec<(usize, usize)> {
    (1..n).map(|v| (0, v)).collect()
}

/// Two cliques of size n/2 - 1 at either end, remaining nodes forming a
/// bridge path between them. Degenerates to a complete graph when n is too
/// small to hold two cliques and a bridge.
fn barbell(n: usize) -> Vec<(usize, usize)> {
    // Two bells of size n/2 - 1 plus a bridge need at least 6 nodes.
    if n < 6 {
        return complete(n);
    }
    let bell = n / 2 - 1;
    let mut edges = Vec::new();
    // Left bell: 0..bell, right bell: n-bell..n.
    for u in 0..bell {
        for v in (u + 1)..bell {
            edges.push((u, v));
        }
    }
    for u in (n - bell)..n {
        for v in (u + 1)..n {
            edges.push((u, v));
        }
    }
    // Bridge path through the middle nodes.
    for i in (bell - 1)..(n - bell) {
        edges.push((i, i + 1));
    }
    edges
}

fn erdos_renyi(n: usize, p: f64, directed: bool, rng: &mut SmallRng) -> Vec<(usize, usize)> {
    let mut edges = Vec::new();
    if p <= 0.0 {
        return edges;
    }
    if directed {
        for u in 0..n {
            for v in 0..n {
                if u != v && rng.gen_bool(p.min(1.0)) {
                    edges.push((u, v));
                }
            }
        }
    } else {
        for u in 0..n {
            for v in (u + 1)..n {
                if rng.gen_bool(p.min(1.0)) {
                    edges.push((u, v));
                }
            }
        }
    }
    edges
}

/// Barabási–Albert preferential attachment: each arriving node attaches to
/// `m` distinct existing nodes chosen proportionally to current degree.
fn scale_free(n: usize, saturation: f64, rng: &mut SmallRng) -> Vec<(usize, usize)> {
    let m = (((saturation * n as f64) / 2.0) as usize).clamp(1, n.saturating_sub(1).max(1));
    if n < 2 {
        return Vec::new();
    }
    let mut edges = Vec::new();
    // Degree-weighted urn: every edge endpoint appears once.
    let mut urn: Vec<usize> = Vec::new();
    let mut targets: Vec<usize> = (0..m.min(n)).collect();
    for v in m.min(n)..n {
        for &t in &targets {
            edges.push((t, v));
            urn.push(t);
            urn.push(v);
        }
        targets = distinct_draws(&urn, m, rng);
    }
    edges
}

/// Draw up to `m` distinct values from the urn (degree-proportional because
/// nodes repeat once per incident edge).
fn distinct_draws(urn: &[usize], m: usize, rng: &mut SmallRng) -> Vec<usize> {
    let mut picked = HashSet::new();
    let mut out = Vec::with_capacity(m);
    // The urn holds at most this many distinct nodes; bail out once every
    // attempt keeps hitting duplicates.
    let mut attempts = 0;
    while out.len() < m && attempts < urn.len() * 4 {
        attempts += 1;
        if let Some(&t) = urn.choose(rng) {
            if picked.insert(t) {
                out.push(t);
            }
        } else {
            break;
        }
    }
    out
}

/// Watts–Strogatz: ring lattice with k/2 neighbors on each side, then each
/// lattice edge is rewired to a uniform random endpoint with probability
/// `rewire` (skipping self-loops and duplicates).
fn watts_strogatz(n: usize, k: usize, rewire: f64, rng: &mut SmallRng) -> Vec<(usize, usize)> {
    let half = (k / 2).min(n.saturating_sub(1) / 2).max(1);
    if n < 3 {
        return if n == 2 { vec![(0, 1)] } else { Vec::new() };
    }
    let mut present: HashSet<(usize, usize)> = HashSet::new();
    let canon = |u: usize, v: usize| if u <= v { (u, v) } else { (v, u) };
    for j in 1..=half {
        for i in 0..n {
            present.insert(canon(i, (i + j) % n));
        }
    }
    for j in 1..=half {
        for i in 0..n {
            let old = canon(i, (i + j) % n);
            if !present.contains(&old) || !rng.gen_bool(rewire.clamp(0.0, 1.0)) {
                continue;
            }
            let w = rng.gen_range(0..n);
            if w == i || present.contains(&canon(i, w)) {
                continue;
            }
            present.remove(&old);
            present.insert(canon(i, w));
        }
    }
    let mut edges: Vec<(usize, usize)> = present.into_iter().collect();
    edges.sort_unstable();
    edges
}

// ============================================================================
// Tests
// ============================================================================
