//! Simple-graph storage: at most one edge per ordered pair.
//!
//! Both adjacency directions are maintained so inbound-neighbor queries
//! (normalized weights) never scan. Undirected graphs mirror every entry,
//! so `adj` and `radj` hold identical content there.

use hashbrown::HashMap;

/// Adjacency storage for `Graph` / `DiGraph` shapes.
#[derive(Debug, Clone, Default)]
pub struct SimpleStore {
    /// u → (v → weight) for edges u→v.
    adj: HashMap<usize, HashMap<usize, f64>>,
    /// v → (u → weight) for edges u→v.
    radj: HashMap<usize, HashMap<usize, f64>>,
    edge_count: usize,
}

impl SimpleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj.get(&u).is_some_and(|m| m.contains_key(&v))
    }

    /// Insert edge u→v (mirrored when undirected). Returns false on duplicate.
    pub fn add(&mut self, u: usize, v: usize, weight: f64, directed: bool) -> bool {
        if self.has_edge(u, v) {
            return false;
        }
        self.adj.entry(u).or_default().insert(v, weight);
        self.radj.entry(v).or_default().insert(u, weight);
        if !directed && u != v {
            self.adj.entry(v).or_default().insert(u, weight);
            self.radj.entry(u).or_default().insert(v, weight);
        }
        self.edge_count += 1;
        true
    }

    /// Remove edge u→v. Returns the weight, or None if absent.
    pub fn remove(&mut self, u: usize, v: usize, directed: bool) -> Option<f64> {
        let weight = self.adj.get_mut(&u)?.remove(&v)?;
        self.radj.get_mut(&v).map(|m| m.remove(&u));
        if !directed && u != v {
            self.adj.get_mut(&v).map(|m| m.remove(&u));
            self.radj.get_mut(&u).map(|m| m.remove(&v));
        }
        self.edge_count -= 1;
        Some(weight)
    }

    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        self.adj.get(&u)?.get(&v).copied()
    }

    pub fn out_neighbors(&self, u: usize) -> Vec<usize> {
        let mut out: Vec<usize> = self.adj.get(&u).map_or_else(Vec::new, |m| m.keys().copied().collect());
        out.sort_unstable();
        out
    }

    pub fn in_neighbors(&self, u: usize) -> Vec<usize> {
        let mut out: Vec<usize> =
            self.radj.get(&u).map_or_else(Vec::new, |m| m.keys().copied().collect());
        out.sort_unstable();
        out
    }

    /// Inbound (neighbor, weight) pairs for node u.
    pub fn in_weights(&self, u: usize) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> =
            self.radj.get(&u).map_or_else(Vec::new, |m| m.iter().map(|(k, w)| (*k, *w)).collect());
        out.sort_unstable_by_key(|(k, _)| *k);
        out
    }

    /// Every stored edge as (u, v, weight). Undirected edges are reported
    /// once, with u <= v.
    pub fn edges(&self, directed: bool) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (u, m) in &self.adj {
            for (v, w) in m {
                if directed || u <= v {
                    out.push((*u, *v, *w));
                }
            }
        }
        out.sort_unstable_by_key(|(u, v, _)| (*u, *v));
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
