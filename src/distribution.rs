//! # Distribution Generator
//!
//! Produces constant/uniform/normal scalar draws for edge weights and
//! per-node scalars (resistance, certainty, confidence).
//!
//! Two distinct out-of-range policies exist for normal draws and both are
//! intentional (unifying them would silently change simulation statistics):
//!
//! - **edge weights** clamp out-of-range draws to the violated bound;
//! - **node scalars** reject out-of-range draws and resample in batches
//!   until every value lies inside `[min, max]`.

use rand::Rng;
use rand::rngs::SmallRng;
use rand_distr::{Distribution as _, Normal};
use serde::{Deserialize, Serialize};

use crate::properties::Properties;
use crate::Result;

/// Named distribution for a weight or node-scalar attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dist {
    /// No distribution configured (`"-"`); the constant fallback applies.
    Blank,
    Constant,
    Uniform,
    Normal,
}

impl Dist {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "-" => Some(Self::Blank),
            "constant" => Some(Self::Constant),
            "uniform" => Some(Self::Uniform),
            "normal" => Some(Self::Normal),
            _ => None,
        }
    }

    pub const DOMAIN: &'static [&'static str] = &["-", "constant", "uniform", "normal"];
}

/// Resolved parameters for one distribution tag, read out of the validated
/// property bag once at construction so hot paths never re-parse strings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistParams {
    pub dist: Dist,
    pub constant: f64,
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
}

impl DistParams {
    /// Read `{tag}_dist` and friends from a validated bag. Parameters the
    /// validation pass did not derive (blank/constant distributions) fall
    /// back to `default_const`.
    pub fn from_props(props: &Properties, tag: &str, default_const: f64) -> Result<Self> {
        let name = props.get_str(&format!("{tag}_dist"))?;
        let dist = Dist::parse(name).ok_or_else(|| crate::Error::InvalidProperty {
            key: format!("{tag}_dist"),
            message: format!("value must be one of {:?}", Dist::DOMAIN),
        })?;
        let read = |suffix: &str, fallback: f64| -> Result<f64> {
            match props.try_get(&format!("{tag}_{suffix}")) {
                Some(v) => Ok(v.as_float().unwrap_or(fallback)),
                None => Ok(fallback),
            }
        };
        Ok(Self {
            dist,
            constant: read("const", default_const)?,
            mean: read("mean", 0.0)?,
            stdev: read("stdev", 0.0)?,
            min: read("min", 0.0)?,
            max: read("max", 1.0)?,
        })
    }
}

// ============================================================================
// Samplers
// ============================================================================

/// One fresh edge weight. Normal draws clamp to the bounds.
pub fn edge_weight(rng: &mut SmallRng, params: &DistParams) -> f64 {
    match params.dist {
        Dist::Blank | Dist::Constant => params.constant,
        Dist::Uniform => uniform_one(rng, params),
        Dist::Normal => normal_one_clamped(rng, params),
    }
}

/// `count` edge weights, for bulk topology initialization.
pub fn edge_weights(rng: &mut SmallRng, params: &DistParams, count: usize) -> Vec<f64> {
    (0..count).map(|_| edge_weight(rng, params)).collect()
}

/// `count` node scalars. Normal draws are rejection-resampled in batches,
/// never clamped, so the in-range distribution shape is preserved.
pub fn node_scalars(rng: &mut SmallRng, params: &DistParams, count: usize) -> Vec<f64> {
    match params.dist {
        Dist::Blank | Dist::Constant => vec![params.constant; count],
        Dist::Uniform => (0..count).map(|_| uniform_one(rng, params)).collect(),
        Dist::Normal => {
            let mut out = Vec::with_capacity(count);
            let normal = match Normal::new(params.mean, params.stdev) {
                Ok(n) => n,
                // Non-finite parameterization: everything is the mean.
                Err(_) => return vec![params.mean; count],
            };
            while out.len() < count {
                let need = count - out.len();
                out.extend(
                    (0..need)
                        .map(|_| normal.sample(rng))
                        .filter(|x| (params.min..=params.max).contains(x)),
                );
            }
            out
        }
    }
}

fn uniform_one(rng: &mut SmallRng, params: &DistParams) -> f64 {
    if params.min >= params.max {
        return params.min;
    }
    rng.gen_range(params.min..=params.max)
}

fn normal_one_clamped(rng: &mut SmallRng, params: &DistParams) -> f64 {
    let draw = match Normal::new(params.mean, params.stdev) {
        Ok(n) => n.sample(rng),
        Err(_) => params.mean,
    };
    draw.clamp(params.min, params.max)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn normal_params(mean: f64, stdev: f64, min: f64, max: f64) -> DistParams {
        DistParams { dist: Dist::Normal, constant: 1.0, mean, stdev, min, max }
    }

    #[test]
    fn constant_repeats_one_value() {
        let mut rng = SmallRng::seed_from_u64(0);
        let params = DistParams {
            dist: Dist::Constant,
            constant: 5.0,
            mean: 0.0,
            stdev: 0.0,
            min: 0.0,
            max: 1.0,
        };
        assert_eq!(node_scalars(&mut rng, &params, 4), vec![5.0; 4]);
        assert_eq!(edge_weight(&mut rng, &params), 5.0);
    }

    #[test]
    fn uniform_stays_in_bounds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let params = DistParams {
            dist: Dist::Uniform,
            constant: 1.0,
            mean: 0.0,
            stdev: 0.0,
            min: -1.0,
            max: 1.0,
        };
        for w in edge_weights(&mut rng, &params, 500) {
            assert!((-1.0..=1.0).contains(&w));
        }
    }

    #[test]
    fn normal_edge_weights_clamp_to_bounds() {
        let mut rng = SmallRng::seed_from_u64(2);
        // Huge stdev so many raw draws land outside the range.
        let params = normal_params(0.0, 10.0, -1.0, 1.0);
        let ws = edge_weights(&mut rng, &params, 500);
        assert!(ws.iter().all(|w| (-1.0..=1.0).contains(w)));
        // Clamping piles mass onto the bounds themselves.
        assert!(ws.iter().any(|w| *w == -1.0 || *w == 1.0));
    }

    #[test]
    fn normal_node_scalars_resample_instead_of_clamping() {
        let mut rng = SmallRng::seed_from_u64(3);
        let params = normal_params(0.5, 5.0, 0.0, 1.0);
        let xs = node_scalars(&mut rng, &params, 500);
        assert_eq!(xs.len(), 500);
        assert!(xs.iter().all(|x| (0.0..=1.0).contains(x)));
        // Rejection sampling leaves (essentially) no mass exactly on a bound.
        assert!(xs.iter().all(|x| *x != 0.0 && *x != 1.0));
    }

    #[test]
    fn zero_stdev_normal_degenerates_to_mean() {
        let mut rng = SmallRng::seed_from_u64(4);
        let params = normal_params(0.25, 0.0, 0.0, 1.0);
        assert!(node_scalars(&mut rng, &params, 10).iter().all(|x| *x == 0.25));
    }
}
