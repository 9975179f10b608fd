//! # Property Store
//!
//! Validated key/value configuration attached to a network instance.
//!
//! Construction runs a validation pass that (a) derives missing distribution
//! parameters from whichever subset the caller supplied, (b) rejects
//! contradictory combinations (`min > max`, a mean outside `[min, max]`, a
//! lone min or max), and (c) rejects values outside their enumerated domain.
//! Unrecognized keys pass through untouched so callers can stash their own
//! state on the bag.

use hashbrown::HashMap;
use tracing::warn;

use crate::model::{AgentType, DiffusionSpace, UpdateMethod, Value, VisibilityPolicy};
use crate::distribution::Dist;
use crate::topology::Topology;
use crate::{Error, Result};

/// Stand-in bound for "unbounded" normal draws, matching the engine's
/// historical ±2^31−1 sentinels.
pub const RANGE_UNBOUNDED: f64 = 2_147_483_647.0;

/// Tolerance for proportion maps that must sum to 1.
pub const PROPORTION_EPS: f64 = 1e-6;

/// Node-scalar attributes whose distributions are probability-scoped:
/// bounds are forced to [0, 1] regardless of user input.
pub const PROB_TAGS: &[&str] = &["resistance", "certainty", "confidence"];

// ============================================================================
// Properties
// ============================================================================

/// The property bag: string keys, [`Value`] payloads.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    map: HashMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize a bag from a JSON object.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json).map_err(|e| Error::InvalidProperty {
            key: "<json>".to_string(),
            message: e.to_string(),
        })?;
        let map = value.as_map().ok_or_else(|| Error::InvalidProperty {
            key: "<json>".to_string(),
            message: format!("expected a JSON object, got {}", value.type_name()),
        })?;
        let mut props = Self::new();
        for (k, v) in map {
            props.map.insert(k.clone(), v.clone());
        }
        Ok(props)
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a property, overwriting any existing value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if self.map.contains_key(&key) {
            warn!(key = %key, "overwriting existing graph property");
        }
        self.map.insert(key, value);
    }

    /// Get a property. Fails with [`Error::UndefinedProperty`] when absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.map.get(key).ok_or_else(|| Error::UndefinedProperty(key.to_string()))
    }

    /// Get several properties at once; fails if any one is missing.
    pub fn get_many(&self, keys: &[&str]) -> Result<Vec<&Value>> {
        keys.iter().map(|k| self.get(k)).collect()
    }

    pub fn try_get(&self, key: &str) -> Option<&Value> {
        self.map.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    pub fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key)?.as_bool().ok_or_else(|| self.type_error(key, "BOOLEAN"))
    }

    pub fn get_f64(&self, key: &str) -> Result<f64> {
        self.get(key)?.as_float().ok_or_else(|| self.type_error(key, "FLOAT"))
    }

    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let i = self.get(key)?.as_int().ok_or_else(|| self.type_error(key, "INTEGER"))?;
        usize::try_from(i).map_err(|_| Error::InvalidProperty {
            key: key.to_string(),
            message: format!("expected a non-negative integer, got {i}"),
        })
    }

    pub fn get_str(&self, key: &str) -> Result<&str> {
        self.get(key)?.as_str().ok_or_else(|| self.type_error(key, "STRING"))
    }

    fn type_error(&self, key: &str, expected: &str) -> Error {
        let got = self.map.get(key).map_or("NULL", Value::type_name);
        Error::InvalidProperty {
            key: key.to_string(),
            message: format!("expected {expected}, got {got}"),
        }
    }

    fn set_quiet(&mut self, key: &str, value: impl Into<Value>) {
        self.map.insert(key.to_string(), value.into());
    }
}

// ============================================================================
// Construction-time validation
// ============================================================================

/// Run the full validation pass: distribution derivation, default fill,
/// domain checks, cross-property checks. Consumes the raw bag and returns the
/// validated one; any error aborts network construction.
pub fn validate(mut props: Properties) -> Result<Properties> {
    validate_range_distribution(&mut props, "weight")?;
    for tag in PROB_TAGS {
        validate_probability_distribution(&mut props, tag)?;
    }

    fill_defaults(&mut props);

    let keys: Vec<String> = props.map.keys().cloned().collect();
    for key in &keys {
        check_domain(key, &props.map[key])?;
    }

    // Per-tick sampling caps default to "all nodes".
    let n = props.get_usize("n")?;
    for key in ["num_nodes_update", "num_nodes_connect", "num_nodes_disconnect"] {
        if !props.contains(key) {
            props.set_quiet(key, n);
        }
    }

    cross_checks(&props)?;
    Ok(props)
}

/// Derivation rules for a range-scoped distribution tag (edge weights).
///
/// Reproduces the historical behavior exactly: a bare `weight_const` implies
/// a constant distribution, a missing distribution is recorded as blank
/// (`"-"`), and min/max/mean/stdev are derived or rejected per §4.1.
fn validate_range_distribution(props: &mut Properties, tag: &str) -> Result<()> {
    let dist_key = format!("{tag}_dist");
    let (min_key, max_key) = (format!("{tag}_min"), format!("{tag}_max"));
    let (mean_key, stdev_key) = (format!("{tag}_mean"), format!("{tag}_stdev"));

    if !props.contains(&dist_key) {
        if props.contains(&format!("{tag}_const")) {
            props.set_quiet(&dist_key, "constant");
        } else {
            props.set_quiet(&dist_key, "-");
            return Ok(());
        }
    }
    let dist = props.get_str(&dist_key)?.to_string();

    let has_min = props.contains(&min_key);
    let has_max = props.contains(&max_key);
    let has_mean = props.contains(&mean_key);
    let has_stdev = props.contains(&stdev_key);

    // Only the distribution name: fall back to its canonical parameters.
    // Uniform: [0, 1]. Normal: standard normal, effectively unbounded.
    if !(has_min || has_max || has_mean || has_stdev) {
        match dist.as_str() {
            "uniform" => {
                props.set_quiet(&min_key, 0.0);
                props.set_quiet(&max_key, 1.0);
            }
            "normal" => {
                props.set_quiet(&min_key, -RANGE_UNBOUNDED);
                props.set_quiet(&max_key, RANGE_UNBOUNDED);
                props.set_quiet(&mean_key, 0.0);
                props.set_quiet(&stdev_key, 1.0);
            }
            _ => {}
        }
        return Ok(());
    }

    if has_min != has_max {
        return Err(Error::IncompatibleProperty(format!(
            "minimum and maximum {tag} must be defined together"
        )));
    }
    if !(has_min || has_max) {
        match dist.as_str() {
            "normal" => {
                props.set_quiet(&min_key, -RANGE_UNBOUNDED);
                props.set_quiet(&max_key, RANGE_UNBOUNDED);
            }
            "uniform" => {
                props.set_quiet(&min_key, 0.0);
                props.set_quiet(&max_key, 1.0);
            }
            _ => {}
        }
    }
    if !props.contains(&min_key) {
        // Constant/blank distribution with stray mean or stdev: nothing to derive.
        return Ok(());
    }

    let minval = props.get_f64(&min_key)?;
    let maxval = props.get_f64(&max_key)?;
    if minval > maxval {
        return Err(Error::IncompatibleProperty(format!(
            "minimum {tag} cannot be greater than maximum {tag}"
        )));
    }

    if has_mean {
        let mean = props.get_f64(&mean_key)?;
        if !(minval..=maxval).contains(&mean) {
            return Err(Error::IncompatibleProperty(format!(
                "mean {tag} must be between minimum and maximum"
            )));
        }
    } else if dist == "normal" {
        props.set_quiet(&mean_key, (minval + maxval) / 2.0);
    }

    if !has_stdev && dist == "normal" {
        if !(has_min || has_max) {
            return Err(Error::IncompatibleProperty(format!(
                "must provide minimum and maximum {tag} and/or a standard deviation"
            )));
        }
        props.set_quiet(&stdev_key, (maxval - minval) / 10.0);
    }

    Ok(())
}

/// Derivation rules for a probability-scoped tag (resistance, certainty,
/// confidence): bounds are forced to [0, 1] and a supplied constant is
/// clamped into [0, 1] regardless of user input.
fn validate_probability_distribution(props: &mut Properties, tag: &str) -> Result<()> {
    let dist_key = format!("{tag}_dist");
    let const_key = format!("{tag}_const");

    if !props.contains(&dist_key) {
        if props.contains(&const_key) {
            props.set_quiet(&dist_key, "constant");
        } else {
            props.set_quiet(&dist_key, "-");
        }
    }

    props.set_quiet(&format!("{tag}_min"), 0.0);
    props.set_quiet(&format!("{tag}_max"), 1.0);

    let dist = props.get_str(&dist_key)?.to_string();
    if dist == "normal" {
        let mean_key = format!("{tag}_mean");
        if props.contains(&mean_key) {
            let mean = props.get_f64(&mean_key)?;
            if !(0.0..=1.0).contains(&mean) {
                return Err(Error::IncompatibleProperty(format!(
                    "mean {tag} must be between minimum and maximum"
                )));
            }
        } else {
            props.set_quiet(&mean_key, 0.5);
        }
        let stdev_key = format!("{tag}_stdev");
        if !props.contains(&stdev_key) {
            props.set_quiet(&stdev_key, 0.1);
        }
    }

    if props.contains(&const_key) {
        let c = props.get_f64(&const_key)?.clamp(0.0, 1.0);
        props.set_quiet(&const_key, c);
    }

    Ok(())
}

fn fill_defaults(props: &mut Properties) {
    let defaults: &[(&str, Value)] = &[
        ("n", Value::Int(0)),
        ("directed", Value::Bool(false)),
        ("multiedge", Value::Bool(false)),
        ("symmetric", Value::Bool(true)),
        ("selfloops", Value::Bool(true)),
        ("topology", Value::String(String::new())),
        ("saturation", Value::Float(0.1)),
        ("rewire", Value::Float(0.1)),
        ("weight_const", Value::Float(1.0)),
        ("normalize", Value::Bool(false)),
        ("dimensions", Value::Int(1)),
        ("diffusion_space", Value::String("binary".into())),
        ("init_extremes", Value::Bool(true)),
        ("visibility", Value::String("visible".into())),
        ("update_method", Value::String("average".into())),
        ("p_update", Value::Float(1.0)),
        ("p_connect", Value::Float(0.0)),
        ("p_disconnect", Value::Float(0.0)),
        ("thresh_connect", Value::Float(0.5)),
        ("thresh_disconnect", Value::Float(0.5)),
        ("num_connections", Value::Int(1)),
        ("num_disconnections", Value::Int(1)),
        ("confidence_bound", Value::Bool(false)),
        ("category_dist", Value::Map(Default::default())),
        ("transmission", Value::Map(Default::default())),
        ("auto_transmission", Value::Map(Default::default())),
    ];
    for (key, value) in defaults {
        if !props.contains(key) {
            props.set_quiet(key, value.clone());
        }
    }
    if !props.contains("type_dist") {
        props.set_quiet("type_dist", Value::from_iter([("default", 1.0)]));
    }
    if !props.contains("agent_types") {
        props.set_quiet(
            "agent_types",
            Value::from_iter([("default", Value::Map(Default::default()))]),
        );
    }
}

fn invalid(key: &str, message: impl Into<String>) -> Error {
    Error::InvalidProperty { key: key.to_string(), message: message.into() }
}

/// Per-key domain check. Unknown keys pass.
fn check_domain(key: &str, value: &Value) -> Result<()> {
    match key {
        "n" | "num_nodes_update" | "num_nodes_connect" | "num_nodes_disconnect"
        | "num_connections" | "num_disconnections" | "num_influencers" | "seed" => {
            match value.as_int() {
                Some(i) if i >= 0 => Ok(()),
                _ => Err(invalid(key, format!("expected a non-negative integer, got {value}"))),
            }
        }
        "dimensions" => match value.as_int() {
            Some(i) if i >= 1 => Ok(()),
            _ => Err(invalid(key, format!("expected a positive integer, got {value}"))),
        },
        "directed" | "multiedge" | "symmetric" | "selfloops" | "normalize"
        | "init_extremes" | "confidence_bound" => match value {
            Value::Bool(_) => Ok(()),
            _ => Err(invalid(key, format!("expected a boolean, got {value}"))),
        },
        "saturation" | "rewire" | "p_update" | "p_connect" | "p_disconnect"
        | "thresh_connect" | "thresh_disconnect" => match value.as_float() {
            Some(x) if (0.0..=1.0).contains(&x) => Ok(()),
            _ => Err(invalid(key, format!("value must lie in [0, 1], got {value}"))),
        },
        "topology" => match value.as_str().and_then(Topology::parse) {
            Some(_) => Ok(()),
            None => Err(invalid(key, format!("value must be one of {:?}", Topology::DOMAIN))),
        },
        "diffusion_space" => match value.as_str().and_then(DiffusionSpace::parse) {
            Some(_) => Ok(()),
            None => {
                Err(invalid(key, format!("value must be one of {:?}", DiffusionSpace::DOMAIN)))
            }
        },
        "visibility" => match value.as_str().and_then(VisibilityPolicy::parse) {
            Some(_) => Ok(()),
            None => {
                Err(invalid(key, format!("value must be one of {:?}", VisibilityPolicy::DOMAIN)))
            }
        },
        "update_method" => match value.as_str().and_then(UpdateMethod::parse) {
            Some(_) => Ok(()),
            None => Err(invalid(key, format!("value must be one of {:?}", UpdateMethod::DOMAIN))),
        },
        _ if key.ends_with("_dist") && is_dist_tag(key) => {
            match value.as_str().and_then(Dist::parse) {
                Some(_) => Ok(()),
                None => Err(invalid(key, format!("value must be one of {:?}", Dist::DOMAIN))),
            }
        }
        _ if is_dist_param(key) => match value.as_float() {
            Some(x) if x.is_finite() => {
                if key.ends_with("_stdev") && x < 0.0 {
                    Err(invalid(key, "standard deviation cannot be negative"))
                } else {
                    Ok(())
                }
            }
            _ => Err(invalid(key, format!("expected a finite number, got {value}"))),
        },
        "category_dist" | "type_dist" => match value.as_map() {
            Some(m) if m.values().all(|v| v.as_float().is_some_and(|x| x >= 0.0)) => Ok(()),
            _ => Err(invalid(key, "expected a map of non-negative proportions")),
        },
        "transmission" | "auto_transmission" => {
            let ok = value.as_map().is_some_and(|m| {
                m.values().all(|row| {
                    row.as_map().is_some_and(|r| {
                        r.values().all(|p| p.as_float().is_some_and(|x| (0.0..=1.0).contains(&x)))
                    })
                })
            });
            if ok {
                Ok(())
            } else {
                Err(invalid(key, "expected a map of maps of probabilities"))
            }
        }
        "agent_types" => match value.as_map() {
            Some(_) => Ok(()),
            _ => Err(invalid(key, "expected a map of agent type records")),
        },
        _ => Ok(()),
    }
}

fn is_dist_tag(key: &str) -> bool {
    ["weight", "resistance", "certainty", "confidence"]
        .iter()
        .any(|tag| key == format!("{tag}_dist"))
}

fn is_dist_param(key: &str) -> bool {
    ["weight", "resistance", "certainty", "confidence"].iter().any(|tag| {
        [
            format!("{tag}_mean"),
            format!("{tag}_stdev"),
            format!("{tag}_min"),
            format!("{tag}_max"),
            format!("{tag}_const"),
        ]
        .contains(&key.to_string())
    })
}

/// Checks spanning multiple keys: proportion sums, agent-type references,
/// categorical requirements.
fn cross_checks(props: &Properties) -> Result<()> {
    let type_dist = get_map(props, "type_dist")?;
    check_proportions("type_dist", type_dist)?;

    let agent_types = get_map(props, "agent_types")?;
    for (name, record) in agent_types {
        AgentType::from_value(name, record)?;
    }
    for name in type_dist.keys() {
        if !agent_types.contains_key(name) {
            return Err(Error::IncompatibleProperty(format!(
                "type_dist names unknown agent type [{name}]"
            )));
        }
    }

    let space_name = props.get_str("diffusion_space")?;
    let space = DiffusionSpace::parse(space_name)
        .ok_or_else(|| invalid("diffusion_space", format!("unrecognized value {space_name}")))?;
    if space == DiffusionSpace::Categorical {
        let cats = get_map(props, "category_dist")?;
        if cats.is_empty() {
            return Err(Error::IncompatibleProperty(
                "categorical diffusion space requires a non-empty category_dist".to_string(),
            ));
        }
        check_proportions("category_dist", cats)?;
    }

    let method_name = props.get_str("update_method")?;
    let method = UpdateMethod::parse(method_name)
        .ok_or_else(|| invalid("update_method", format!("unrecognized value {method_name}")))?;
    if method == UpdateMethod::Transmission && space != DiffusionSpace::Categorical {
        return Err(Error::IncompatibleProperty(
            "the transmission update method requires a categorical diffusion space".to_string(),
        ));
    }
    // Category labels cannot be interpolated; only adoption-style rules
    // (voter family, transmission) act on a categorical space.
    if space == DiffusionSpace::Categorical
        && matches!(method, UpdateMethod::Average | UpdateMethod::WeightedAverage)
    {
        return Err(Error::IncompatibleProperty(
            "averaging update methods cannot act on a categorical diffusion space".to_string(),
        ));
    }

    Ok(())
}

fn get_map<'a>(
    props: &'a Properties,
    key: &str,
) -> Result<&'a std::collections::BTreeMap<String, Value>> {
    props.get(key)?.as_map().ok_or_else(|| invalid(key, "expected a map"))
}

fn check_proportions(key: &str, map: &std::collections::BTreeMap<String, Value>) -> Result<()> {
    let mut sum = 0.0;
    for (name, v) in map {
        sum += v
            .as_float()
            .ok_or_else(|| invalid(key, format!("proportion for [{name}] must be a number")))?;
    }
    if (sum - 1.0).abs() > PROPORTION_EPS {
        return Err(Error::IncompatibleProperty(format!(
            "{key} proportions must sum to 1, got {sum}"
        )));
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
