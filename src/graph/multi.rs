//! Multi-graph storage: parallel edges per pair, each optionally labeled.
//!
//! Edge identity in the multi shapes is (pair, label, position): removing
//! with a label takes out the first record carrying it; removing without a
//! label takes out every parallel record between the pair.

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::EdgeRecord;

type Parallel = SmallVec<[EdgeRecord; 2]>;

/// Adjacency storage for `MultiGraph` / `MultiDiGraph` shapes.
#[derive(Debug, Clone, Default)]
pub struct MultiStore {
    adj: HashMap<usize, HashMap<usize, Parallel>>,
    radj: HashMap<usize, HashMap<usize, Parallel>>,
    edge_count: usize,
}

impl MultiStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.adj.get(&u).is_some_and(|m| m.contains_key(&v))
    }

    pub fn has_labeled_edge(&self, u: usize, v: usize, label: &str) -> bool {
        self.adj
            .get(&u)
            .and_then(|m| m.get(&v))
            .is_some_and(|recs| recs.iter().any(|r| r.label.as_deref() == Some(label)))
    }

    /// Append a parallel edge u→v (mirrored when undirected). Always succeeds.
    pub fn add(&mut self, u: usize, v: usize, record: EdgeRecord, directed: bool) {
        self.adj.entry(u).or_default().entry(v).or_default().push(record.clone());
        self.radj.entry(v).or_default().entry(u).or_default().push(record.clone());
        if !directed && u != v {
            self.adj.entry(v).or_default().entry(u).or_default().push(record.clone());
            self.radj.entry(u).or_default().entry(v).or_default().push(record);
        }
        self.edge_count += 1;
    }

    /// Remove parallel edges u→v.
    ///
    /// With a label: the first record carrying it (None if no such label).
    /// Without: every record between the pair. Mirrored when undirected.
    pub fn remove(
        &mut self,
        u: usize,
        v: usize,
        label: Option<&str>,
        directed: bool,
    ) -> Option<Vec<EdgeRecord>> {
        let removed = Self::take(&mut self.adj, u, v, label)?;
        Self::take(&mut self.radj, v, u, label);
        if !directed && u != v {
            Self::take(&mut self.adj, v, u, label);
            Self::take(&mut self.radj, u, v, label);
        }
        self.edge_count -= removed.len();
        Some(removed)
    }

    fn take(
        side: &mut HashMap<usize, HashMap<usize, Parallel>>,
        u: usize,
        v: usize,
        label: Option<&str>,
    ) -> Option<Vec<EdgeRecord>> {
        let inner = side.get_mut(&u)?;
        let recs = inner.get_mut(&v)?;
        let removed = match label {
            None => recs.drain(..).collect::<Vec<_>>(),
            Some(l) => {
                let pos = recs.iter().position(|r| r.label.as_deref() == Some(l))?;
                vec![recs.remove(pos)]
            }
        };
        if recs.is_empty() {
            inner.remove(&v);
        }
        Some(removed)
    }

    /// Weight of the first parallel record for the pair.
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        self.adj.get(&u)?.get(&v)?.first().map(|r| r.weight)
    }

    pub fn weight_labeled(&self, u: usize, v: usize, label: &str) -> Option<f64> {
        self.adj
            .get(&u)?
            .get(&v)?
            .iter()
            .find(|r| r.label.as_deref() == Some(label))
            .map(|r| r.weight)
    }

    pub fn out_neighbors(&self, u: usize) -> Vec<usize> {
        let mut out: Vec<usize> =
            self.adj.get(&u).map_or_else(Vec::new, |m| m.keys().copied().collect());
        out.sort_unstable();
        out
    }

    pub fn in_neighbors(&self, u: usize) -> Vec<usize> {
        let mut out: Vec<usize> =
            self.radj.get(&u).map_or_else(Vec::new, |m| m.keys().copied().collect());
        out.sort_unstable();
        out
    }

    /// Inbound (neighbor, summed parallel weight) pairs for node u.
    pub fn in_weights(&self, u: usize) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> = self.radj.get(&u).map_or_else(Vec::new, |m| {
            m.iter().map(|(k, recs)| (*k, recs.iter().map(|r| r.weight).sum())).collect()
        });
        out.sort_unstable_by_key(|(k, _)| *k);
        out
    }

    /// Every stored record as (u, v, label, weight). Undirected records are
    /// reported once, with u <= v.
    pub fn edges(&self, directed: bool) -> Vec<(usize, usize, Option<String>, f64)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for (u, m) in &self.adj {
            for (v, recs) in m {
                if directed || u <= v {
                    for r in recs {
                        out.push((*u, *v, r.label.clone(), r.weight));
                    }
                }
            }
        }
        out.sort_unstable_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
