//! Rewiring engine: per-tick probabilistic edge addition and removal driven
//! by the reward (similarity) function.

use rand::seq::SliceRandom;

use super::Network;
use crate::model::Edge;
use crate::Result;

impl Network {
    /// Connect pass: sample up to `num_nodes_connect` nodes; for each, find
    /// non-neighbors whose similarity meets `thresh_connect`, keep up to
    /// `num_connections` of them at random, and connect each through a
    /// Bernoulli gate on `p_connect`. Returns the edges actually added.
    pub fn get_connections(&mut self) -> Result<Vec<Edge>> {
        let p_connect = self.props.get_f64("p_connect")?;
        if p_connect <= 0.0 || self.n == 0 {
            return Ok(Vec::new());
        }
        let node_cap = self.props.get_usize("num_nodes_connect")?.min(self.n);
        let per_node = self.props.get_usize("num_connections")?;
        let thresh = self.props.get_f64("thresh_connect")?;

        let mut added = Vec::new();
        let sampled = rand::seq::index::sample(&mut self.rng, self.n, node_cap).into_vec();
        for i in sampled {
            let neighbors = self.store.out_neighbors(i);
            let mut candidates: Vec<usize> = (0..self.n)
                .filter(|&c| c != i && !neighbors.contains(&c))
                .filter(|&c| self.raw_reward(i, c) >= thresh)
                .collect();
            if candidates.len() > per_node {
                candidates.shuffle(&mut self.rng);
                candidates.truncate(per_node);
            }
            for c in candidates {
                added.extend(self.connect_with(i, c, None, p_connect)?);
            }
        }
        Ok(added)
    }

    /// Disconnect pass: sample up to `num_nodes_disconnect` nodes; for each,
    /// find neighbors whose similarity falls below `thresh_disconnect`, keep
    /// up to `num_disconnections` of them at random, and disconnect each
    /// through a Bernoulli gate on `p_disconnect`. Mandated self-loops are
    /// never candidates. Returns the edges actually removed.
    pub fn get_disconnections(&mut self) -> Result<Vec<Edge>> {
        let p_disconnect = self.props.get_f64("p_disconnect")?;
        if p_disconnect <= 0.0 || self.n == 0 {
            return Ok(Vec::new());
        }
        let node_cap = self.props.get_usize("num_nodes_disconnect")?.min(self.n);
        let per_node = self.props.get_usize("num_disconnections")?;
        let thresh = self.props.get_f64("thresh_disconnect")?;

        let mut removed = Vec::new();
        let sampled = rand::seq::index::sample(&mut self.rng, self.n, node_cap).into_vec();
        for i in sampled {
            let mut candidates: Vec<usize> = self
                .store
                .out_neighbors(i)
                .into_iter()
                .filter(|&v| v != i)
                .filter(|&v| self.raw_reward(i, v) < thresh)
                .collect();
            if candidates.len() > per_node {
                candidates.shuffle(&mut self.rng);
                candidates.truncate(per_node);
            }
            for v in candidates {
                // A symmetric mirror removal earlier in the pass may already
                // have taken this edge out.
                if !self.store.has_edge(i, v) {
                    continue;
                }
                removed.extend(self.disconnect_with(i, v, None, p_disconnect)?);
            }
        }
        Ok(removed)
    }
}
