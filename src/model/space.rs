//! Enumerated vocabularies for the diffusion space, visibility policy, and
//! opinion-update rule.

use serde::{Deserialize, Serialize};

/// Shape of the per-node feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiffusionSpace {
    /// Values in {-1, 1}.
    Binary,
    /// Values in [-1, 1].
    Continuous,
    /// Values are category indices (stored 1-based so 0 stays "masked").
    Categorical,
}

impl DiffusionSpace {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "binary" => Some(Self::Binary),
            "continuous" => Some(Self::Continuous),
            "categorical" => Some(Self::Categorical),
            _ => None,
        }
    }

    pub const DOMAIN: &'static [&'static str] = &["binary", "continuous", "categorical"];
}

/// How the mask of a freshly created edge is initialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisibilityPolicy {
    /// All dimensions visible.
    Visible,
    /// All dimensions hidden.
    Hidden,
    /// Independent 50/50 per dimension.
    Random,
}

impl VisibilityPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(Self::Visible),
            "hidden" => Some(Self::Hidden),
            "random" => Some(Self::Random),
            _ => None,
        }
    }

    pub const DOMAIN: &'static [&'static str] = &["visible", "hidden", "random"];
}

/// Opinion-update rule applied by the update engine each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMethod {
    Average,
    WeightedAverage,
    Voter,
    Majority,
    Plurality,
    /// Contact-triggered categorical transitions with an "auto" fallback.
    Transmission,
}

impl UpdateMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "average" => Some(Self::Average),
            "wt. avg." => Some(Self::WeightedAverage),
            "voter" => Some(Self::Voter),
            "majority" => Some(Self::Majority),
            "plurality" => Some(Self::Plurality),
            "transmission" => Some(Self::Transmission),
            _ => None,
        }
    }

    pub const DOMAIN: &'static [&'static str] =
        &["average", "wt. avg.", "voter", "majority", "plurality", "transmission"];
}
