//! Update engine: per-tick opinion-state transitions.
//!
//! Every selected node computes its next state from a snapshot of the
//! pre-tick diffusion matrix, and all next states are committed together
//! after the pass (simultaneous update, not sequential).

use rand::seq::SliceRandom;
use rand::Rng;

use super::Network;
use crate::model::{Conformity, DiffusionSpace, UpdateMethod};
use crate::{Error, Result};

impl Network {
    /// Run one update pass. Returns the nodes whose state was recomputed.
    pub(super) fn update(&mut self) -> Result<Vec<usize>> {
        let cap = self.props.get_usize("num_nodes_update")?.min(self.n);
        let p_update = self.props.get_f64("p_update")?;
        if cap == 0 || p_update <= 0.0 {
            return Ok(Vec::new());
        }

        let snapshot = self.diffusion.clone();
        let selected = rand::seq::index::sample(&mut self.rng, self.n, cap).into_vec();

        let mut commits: Vec<(usize, Vec<f64>)> = Vec::new();
        for i in selected {
            if p_update < 1.0 && !self.rng.gen_bool(p_update) {
                continue;
            }
            let influencers = self.influencer_set(i)?;
            if influencers.is_empty() {
                continue;
            }
            let next = self.next_state(i, &influencers, &snapshot)?;
            commits.push((i, next));
        }

        let updated: Vec<usize> = commits.iter().map(|(i, _)| *i).collect();
        for (i, row) in commits {
            self.diffusion[i] = row;
        }
        Ok(updated)
    }

    /// Assemble node `i`'s influencer set: its current neighbors, minus
    /// itself, optionally filtered by the confidence bound, capped at
    /// `num_influencers`, with the self-view re-added last when self-loops
    /// are mandated.
    fn influencer_set(&mut self, i: usize) -> Result<Vec<usize>> {
        let mut set: Vec<usize> =
            self.store.out_neighbors(i).into_iter().filter(|&v| v != i).collect();

        if self.props.get_bool("confidence_bound")? {
            let bound = 1.0 - self.confidence[i];
            set.retain(|&v| self.reward(i, v) >= bound);
        }

        if let Some(v) = self.props.try_get("num_influencers") {
            let cap = v.as_int().ok_or_else(|| Error::InvalidProperty {
                key: "num_influencers".to_string(),
                message: format!("expected an integer, got {v}"),
            })? as usize;
            if set.len() > cap {
                set.shuffle(&mut self.rng);
                set.truncate(cap);
                set.sort_unstable();
            }
        }

        if self.selfloops && self.store.has_edge(i, i) {
            set.push(i);
        }
        Ok(set)
    }

    fn next_state(
        &mut self,
        i: usize,
        influencers: &[usize],
        snapshot: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        let views: Vec<Vec<f64>> =
            influencers.iter().map(|&v| self.view_from(snapshot, i, v)).collect();

        match self.method {
            UpdateMethod::Average => Ok(self.gravity_step(i, snapshot, &views, None)),
            UpdateMethod::WeightedAverage => {
                let weights: Vec<f64> = influencers
                    .iter()
                    .map(|&v| {
                        self.normalized_weight(i, v)
                            .or_else(|| self.store.weight(i, v))
                            .unwrap_or(1.0)
                    })
                    .collect();
                Ok(self.gravity_step(i, snapshot, &views, Some(&weights)))
            }
            UpdateMethod::Voter => Ok(consensus_step(&snapshot[i], &views, |values| {
                let first = values[0];
                values.iter().all(|&x| x == first).then_some(first)
            })),
            UpdateMethod::Majority => Ok(consensus_step(&snapshot[i], &views, |values| {
                let (value, count) = top_value(values)?;
                (2 * count > values.len()).then_some(value)
            })),
            UpdateMethod::Plurality => Ok(consensus_step(&snapshot[i], &views, |values| {
                let (value, count) = top_value(values)?;
                // A tied plurality adopts nothing.
                let rivals = count_values(values).iter().filter(|(_, c)| *c == count).count();
                (rivals == 1).then_some(value)
            })),
            UpdateMethod::Transmission => self.transmission_step(i, &views, snapshot),
        }
    }

    /// `average` / `wt. avg.`: per dimension, a gravity-scaled move toward
    /// the (optionally weighted) neighborhood mean, gated by the node's
    /// resistance against the mean's magnitude, with the sign flipped for
    /// rebelling types.
    fn gravity_step(
        &self,
        i: usize,
        snapshot: &[Vec<f64>],
        views: &[Vec<f64>],
        weights: Option<&[f64]>,
    ) -> Vec<f64> {
        let ty = self.agents.type_of(i);
        let gravity = ty.gravity;
        let rebel = ty.conformity == Conformity::Rebelling;
        let resistance = self.resistance[i];

        (0..self.dims)
            .map(|d| {
                let x = snapshot[i][d];
                let (mut total, mut mass) = (0.0, 0.0);
                for (j, view) in views.iter().enumerate() {
                    let w = weights.map_or(1.0, |ws| ws[j]);
                    total += w * view[d];
                    mass += w;
                }
                if mass == 0.0 {
                    return x;
                }
                let mean = total / mass;
                if mean.abs() < resistance {
                    return x;
                }
                let moved = if rebel { x - gravity * (mean - x) } else { x + gravity * (mean - x) };
                match self.space {
                    DiffusionSpace::Binary => {
                        if moved > 0.0 {
                            1.0
                        } else if moved < 0.0 {
                            -1.0
                        } else {
                            x
                        }
                    }
                    DiffusionSpace::Continuous => moved.clamp(-1.0, 1.0),
                    // Validation rejects averaging on categorical spaces;
                    // a label never drifts off the category table.
                    DiffusionSpace::Categorical => x,
                }
            })
            .collect()
    }

    /// `transmission`: per dimension, try a contact-triggered transition for
    /// each influencer's visible value, then fall back to the unconditional
    /// auto-transition table, else stay put.
    fn transmission_step(
        &mut self,
        i: usize,
        views: &[Vec<f64>],
        snapshot: &[Vec<f64>],
    ) -> Result<Vec<f64>> {
        let contact = self.props.get("transmission")?.clone();
        let auto = self.props.get("auto_transmission")?.clone();
        let contact = contact.as_map().ok_or_else(|| Error::InvalidProperty {
            key: "transmission".to_string(),
            message: "expected a map".to_string(),
        })?;
        let auto = auto.as_map().ok_or_else(|| Error::InvalidProperty {
            key: "auto_transmission".to_string(),
            message: "expected a map".to_string(),
        })?;

        let mut next = snapshot[i].clone();
        for d in 0..self.dims {
            let cur = snapshot[i][d];
            let Some(cur_name) = category_name(&self.categories, cur) else { continue };
            let row = contact.get(cur_name).and_then(|r| r.as_map());

            let mut transitioned = false;
            if let Some(row) = row {
                for view in views {
                    let observed = view[d];
                    let Some(obs_name) = category_name(&self.categories, observed) else {
                        continue;
                    };
                    let p = row.get(obs_name).and_then(|p| p.as_float()).unwrap_or(0.0);
                    if p > 0.0 && self.rng.gen_bool(p.min(1.0)) {
                        next[d] = observed;
                        transitioned = true;
                        break;
                    }
                }
            }
            if transitioned {
                continue;
            }
            if let Some(row) = auto.get(cur_name).and_then(|r| r.as_map()) {
                for (target, p) in row {
                    let p = p.as_float().unwrap_or(0.0);
                    let Some(idx) = self.categories.iter().position(|c| c == target) else {
                        continue;
                    };
                    if p > 0.0 && self.rng.gen_bool(p.min(1.0)) {
                        next[d] = (idx + 1) as f64;
                        break;
                    }
                }
            }
        }
        Ok(next)
    }

}

/// Category name for a stored 1-based index; None for masked (0) or
/// out-of-table values. A free function so callers can borrow the category
/// table while the PRNG is borrowed mutably.
fn category_name(categories: &[String], value: f64) -> Option<&str> {
    if value < 1.0 {
        return None;
    }
    categories.get(value as usize - 1).map(String::as_str)
}

/// Shared shape of voter/majority/plurality: per dimension, gather the
/// influencers' visible values and let `decide` pick an adopted value (None
/// keeps the current one).
fn consensus_step(
    current: &[f64],
    views: &[Vec<f64>],
    decide: impl Fn(&[f64]) -> Option<f64>,
) -> Vec<f64> {
    current
        .iter()
        .enumerate()
        .map(|(d, &x)| {
            let values: Vec<f64> =
                views.iter().map(|view| view[d]).filter(|&v| v != 0.0).collect();
            if values.is_empty() { x } else { decide(&values).unwrap_or(x) }
        })
        .collect()
}

fn count_values(values: &[f64]) -> Vec<(f64, usize)> {
    let mut counts: Vec<(f64, usize)> = Vec::new();
    for &v in values {
        match counts.iter_mut().find(|(x, _)| *x == v) {
            Some((_, c)) => *c += 1,
            None => counts.push((v, 1)),
        }
    }
    counts
}

/// The most frequent value and its count (an arbitrary one among ties).
fn top_value(values: &[f64]) -> Option<(f64, usize)> {
    count_values(values).into_iter().max_by_key(|(_, c)| *c)
}
