//! Agent behavioral profiles.
//!
//! Every node is assigned exactly one named [`AgentType`] at construction,
//! proportional to a caller-supplied distribution over type names. The
//! registry is per-instance state; two networks never share type tables.

use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::model::Value;
use crate::{Error, Result};

/// Attraction class: which similarity levels a node seeks when rewiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Homophily {
    Homophilic,
    Heterophilic,
    Mesophilic,
}

impl Homophily {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "homophilic" => Some(Self::Homophilic),
            "heterophilic" => Some(Self::Heterophilic),
            "mesophilic" => Some(Self::Mesophilic),
            _ => None,
        }
    }
}

/// Reaction class: whether a node moves toward or away from its neighborhood
/// mean once its resistance is overcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conformity {
    Conforming,
    Rebelling,
}

impl Conformity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "conforming" => Some(Self::Conforming),
            "rebelling" => Some(Self::Rebelling),
            _ => None,
        }
    }
}

/// A named behavioral profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentType {
    pub name: String,
    pub homophily: Homophily,
    pub conformity: Conformity,
    /// Step size toward (or away from) the neighborhood mean, in [0, 1].
    pub gravity: f64,
    /// Fallback resistance when no resistance distribution is configured.
    pub resistance: f64,
    /// Fallback confidence when no confidence distribution is configured.
    pub confidence: f64,
    /// Similarity ceiling this type aims for when forming ties.
    pub max_similarity: f64,
    /// Display color for the rendering layer.
    pub color: String,
}

impl AgentType {
    /// The type every network gets when the caller supplies none.
    pub fn default_type() -> Self {
        Self {
            name: "default".to_string(),
            homophily: Homophily::Homophilic,
            conformity: Conformity::Conforming,
            gravity: 0.1,
            resistance: 0.0,
            confidence: 1.0,
            max_similarity: 1.0,
            color: "#1f77b4".to_string(),
        }
    }

    /// Parse one type record out of a property-bag map, filling defaults.
    pub fn from_value(name: &str, value: &Value) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| Error::InvalidProperty {
            key: "agent_types".to_string(),
            message: format!("type [{name}] must be a map, got {}", value.type_name()),
        })?;

        let mut ty = Self::default_type();
        ty.name = name.to_string();

        for (field, v) in map {
            match field.as_str() {
                "homophily" => {
                    let s = v.as_str().unwrap_or("");
                    ty.homophily = Homophily::parse(s).ok_or_else(|| Error::InvalidProperty {
                        key: "agent_types".to_string(),
                        message: format!("type [{name}]: unknown homophily class [{s}]"),
                    })?;
                }
                "conformity" => {
                    let s = v.as_str().unwrap_or("");
                    ty.conformity = Conformity::parse(s).ok_or_else(|| Error::InvalidProperty {
                        key: "agent_types".to_string(),
                        message: format!("type [{name}]: unknown conformity class [{s}]"),
                    })?;
                }
                "gravity" => ty.gravity = Self::prob_field(name, field, v)?,
                "resistance" => ty.resistance = Self::prob_field(name, field, v)?,
                "confidence" => ty.confidence = Self::prob_field(name, field, v)?,
                "max_similarity" => ty.max_similarity = Self::prob_field(name, field, v)?,
                "color" => {
                    ty.color = v
                        .as_str()
                        .ok_or_else(|| Error::InvalidProperty {
                            key: "agent_types".to_string(),
                            message: format!("type [{name}]: color must be a string"),
                        })?
                        .to_string();
                }
                other => {
                    return Err(Error::InvalidProperty {
                        key: "agent_types".to_string(),
                        message: format!("type [{name}]: unknown field [{other}]"),
                    });
                }
            }
        }
        Ok(ty)
    }

    fn prob_field(name: &str, field: &str, v: &Value) -> Result<f64> {
        let x = v.as_float().ok_or_else(|| Error::InvalidProperty {
            key: "agent_types".to_string(),
            message: format!("type [{name}]: {field} must be numeric"),
        })?;
        if !(0.0..=1.0).contains(&x) {
            return Err(Error::InvalidProperty {
                key: "agent_types".to_string(),
                message: format!("type [{name}]: {field} must lie in [0, 1], got {x}"),
            });
        }
        Ok(x)
    }
}

/// Per-instance assignment of nodes to agent types.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    types: BTreeMap<String, AgentType>,
    /// node → type name
    assignment: Vec<String>,
    /// type name → node list (reverse index)
    members: BTreeMap<String, Vec<usize>>,
}

impl AgentRegistry {
    /// Assign each of `n` nodes one type, proportional to `proportions`.
    ///
    /// Builds a list with `floor(p * n)` copies of each type, hands the
    /// rounding remainder to the type with the largest computed count, then
    /// shuffles and assigns in node order.
    pub fn assign(
        types: BTreeMap<String, AgentType>,
        proportions: &BTreeMap<String, f64>,
        n: usize,
        rng: &mut SmallRng,
    ) -> Result<Self> {
        for name in proportions.keys() {
            if !types.contains_key(name) {
                return Err(Error::IncompatibleProperty(format!(
                    "type_dist names unknown agent type [{name}]"
                )));
            }
        }

        let mut pool: Vec<String> = Vec::with_capacity(n);
        let mut largest: Option<(&String, usize)> = None;
        for (name, p) in proportions {
            let count = (p * n as f64).floor() as usize;
            if largest.is_none_or(|(_, c)| count > c) {
                largest = Some((name, count));
            }
            pool.extend(std::iter::repeat_n(name.clone(), count));
        }
        if let Some((name, _)) = largest {
            while pool.len() < n {
                pool.push(name.clone());
            }
        }
        pool.shuffle(rng);

        let mut members: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (node, name) in pool.iter().enumerate() {
            members.entry(name.clone()).or_default().push(node);
        }

        Ok(Self { types, assignment: pool, members })
    }

    pub fn type_of(&self, node: usize) -> &AgentType {
        &self.types[&self.assignment[node]]
    }

    pub fn type_name_of(&self, node: usize) -> &str {
        &self.assignment[node]
    }

    pub fn members_of(&self, type_name: &str) -> &[usize] {
        self.members.get(type_name).map_or(&[], Vec::as_slice)
    }

    pub fn types(&self) -> impl Iterator<Item = &AgentType> {
        self.types.values()
    }
}
