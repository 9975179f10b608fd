//! View/masking subsystem.
//!
//! A mask entry `(observer, observed)` exists exactly while the edge
//! observer→observed exists, and flags which of the observed node's
//! dimensions the observer can see. `reveal(u, v, d)` is phrased from the
//! revealer's side: node `u` shows its dimension `d` to node `v`, so it is
//! v's mask of u that changes.

use rand::Rng;
use smallvec::smallvec;

use super::{Mask, Network};
use crate::model::VisibilityPolicy;
use crate::{Error, Result};

impl Network {
    // ========================================================================
    // Views and rewards
    // ========================================================================

    /// What `u` currently sees of `v`: v's diffusion vector with hidden
    /// dimensions zeroed. All-zero when the pair is not connected.
    pub fn get_view(&self, u: usize, v: usize) -> Vec<f64> {
        self.view_from(&self.diffusion, u, v)
    }

    /// `get_view` against an explicit diffusion snapshot; the update engine
    /// uses this so every node in a tick sees pre-tick values.
    pub(super) fn view_from(&self, diffusion: &[Vec<f64>], u: usize, v: usize) -> Vec<f64> {
        match (self.masks.get(&(u, v)), diffusion.get(v)) {
            (Some(mask), Some(row)) => row
                .iter()
                .zip(mask.iter())
                .map(|(x, bit)| if *bit == 1 { *x } else { 0.0 })
                .collect(),
            _ => vec![0.0; self.dims],
        }
    }

    /// Similarity of `v` as seen by `u` through the mask, in [0, 1].
    /// Fully-masked pairs score a neutral 0.
    pub fn reward(&self, u: usize, v: usize) -> f64 {
        match (self.diffusion.get(u), self.masks.get(&(u, v)).zip(self.diffusion.get(v))) {
            (Some(own), Some((mask, row))) => {
                let seen: Vec<f64> = row
                    .iter()
                    .zip(mask.iter())
                    .map(|(x, bit)| if *bit == 1 { *x } else { 0.0 })
                    .collect();
                hamming_similarity(own, &seen)
            }
            _ => 0.0,
        }
    }

    /// Similarity of the two true vectors, ignoring masks. Rewiring
    /// decisions use this (candidates for connection have no mask yet).
    pub fn raw_reward(&self, u: usize, v: usize) -> f64 {
        match (self.diffusion.get(u), self.diffusion.get(v)) {
            (Some(own), Some(other)) => hamming_similarity(own, other),
            _ => 0.0,
        }
    }

    // ========================================================================
    // Mask mutation
    // ========================================================================

    /// Node `u` shows its dimension `d` to node `v`.
    pub fn reveal(&mut self, u: usize, v: usize, d: usize) -> Result<()> {
        self.set_mask_bit(v, u, d, 1)
    }

    /// Node `u` hides its dimension `d` from node `v`.
    pub fn hide(&mut self, u: usize, v: usize, d: usize) -> Result<()> {
        self.set_mask_bit(v, u, d, 0)
    }

    /// Node `u` shows every dimension to node `v`.
    pub fn reveal_all(&mut self, u: usize, v: usize) -> Result<()> {
        self.fill_mask(v, u, 1)
    }

    /// Node `u` hides every dimension from node `v`.
    pub fn hide_all(&mut self, u: usize, v: usize) -> Result<()> {
        self.fill_mask(v, u, 0)
    }

    /// Node `u` shows dimension `d` to every node currently observing it.
    pub fn broadcast(&mut self, u: usize, d: usize) -> Result<()> {
        self.check_node(u)?;
        self.check_dim(d)?;
        for v in self.store.in_neighbors(u) {
            if v != u {
                if let Some(mask) = self.masks.get_mut(&(v, u)) {
                    mask[d] = 1;
                }
            }
        }
        Ok(())
    }

    /// Node `u` hides dimension `d` from every node currently observing it.
    pub fn nocast(&mut self, u: usize, d: usize) -> Result<()> {
        self.check_node(u)?;
        self.check_dim(d)?;
        for v in self.store.in_neighbors(u) {
            if v != u {
                if let Some(mask) = self.masks.get_mut(&(v, u)) {
                    mask[d] = 0;
                }
            }
        }
        Ok(())
    }

    pub fn mask_exists(&self, observer: usize, observed: usize) -> bool {
        self.masks.contains_key(&(observer, observed))
    }

    // ========================================================================
    // Internals used by connect/disconnect
    // ========================================================================

    /// Install fresh masks for a just-created edge per the visibility
    /// policy. Self-loop masks are always all-ones; the reverse mask is
    /// installed only when visibility is mutual.
    pub(super) fn reset_view(&mut self, u: usize, v: usize) {
        if u == v {
            self.masks.insert((u, u), smallvec![1; self.dims]);
            return;
        }
        let forward = self.fresh_mask();
        self.masks.insert((u, v), forward);
        if self.mutual_visibility() {
            let backward = self.fresh_mask();
            self.masks.insert((v, u), backward);
        }
    }

    /// Delete the masks of any direction whose last edge is gone.
    pub(super) fn drop_orphan_masks(&mut self, u: usize, v: usize) {
        if !self.store.has_edge(u, v) {
            self.masks.remove(&(u, v));
        }
        if !self.store.has_edge(v, u) {
            self.masks.remove(&(v, u));
        }
    }

    fn fresh_mask(&mut self) -> Mask {
        match self.visibility {
            VisibilityPolicy::Visible => smallvec![1; self.dims],
            VisibilityPolicy::Hidden => smallvec![0; self.dims],
            VisibilityPolicy::Random => {
                (0..self.dims).map(|_| u8::from(self.rng.gen_bool(0.5))).collect()
            }
        }
    }

    fn set_mask_bit(&mut self, observer: usize, observed: usize, d: usize, bit: u8) -> Result<()> {
        self.check_node(observer)?;
        self.check_node(observed)?;
        self.check_dim(d)?;
        let mask = self
            .masks
            .get_mut(&(observer, observed))
            .ok_or_else(|| Error::NotFound(format!("no mask ({observer}, {observed})")))?;
        mask[d] = bit;
        Ok(())
    }

    fn fill_mask(&mut self, observer: usize, observed: usize, bit: u8) -> Result<()> {
        self.check_node(observer)?;
        self.check_node(observed)?;
        let mask = self
            .masks
            .get_mut(&(observer, observed))
            .ok_or_else(|| Error::NotFound(format!("no mask ({observer}, {observed})")))?;
        mask.iter_mut().for_each(|b| *b = bit);
        Ok(())
    }

    fn check_dim(&self, d: usize) -> Result<()> {
        if d < self.dims {
            Ok(())
        } else {
            Err(Error::NotFound(format!("no dimension {d} (dimensions = {})", self.dims)))
        }
    }
}

/// Fraction of agreeing dimensions among those visible in `seen` (entries
/// where `seen` is nonzero). An empty visible set scores 0, not 1: total
/// blindness is neutral, not perfect agreement.
pub(super) fn hamming_similarity(own: &[f64], seen: &[f64]) -> f64 {
    let mut visible = 0usize;
    let mut agree = 0usize;
    for (a, b) in own.iter().zip(seen.iter()) {
        if *b != 0.0 {
            visible += 1;
            if a == b {
                agree += 1;
            }
        }
    }
    if visible == 0 { 0.0 } else { agree as f64 / visible as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn similarity_counts_only_visible_dimensions() {
        let own = [1.0, -1.0, 1.0, 1.0];
        let seen = [1.0, 0.0, -1.0, 1.0]; // dim 1 masked
        assert_eq!(hamming_similarity(&own, &seen), 2.0 / 3.0);
    }

    #[test]
    fn fully_masked_pair_is_neutral() {
        assert_eq!(hamming_similarity(&[1.0, -1.0], &[0.0, 0.0]), 0.0);
        assert_eq!(hamming_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn identical_vectors_score_one() {
        assert_eq!(hamming_similarity(&[1.0, -1.0, 1.0], &[1.0, -1.0, 1.0]), 1.0);
    }
}
