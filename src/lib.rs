//! # snee: Social Network Evolution Engine
//!
//! An engine for simulating the evolution of a social network. Nodes carry
//! opinion/feature vectors ("diffusion space"), edges carry weights and
//! per-dimension visibility masks, and the network rewires both its structure
//! and its opinions over discrete time steps according to configurable
//! probabilistic rules.
//!
//! ## Design Principles
//!
//! 1. **One owner**: a [`Network`] exclusively owns its graph store, property
//!    bag, diffusion state, masks, and PRNG; no globals, no locks
//! 2. **Sum-typed storage**: the four graph shapes (simple/directed ×
//!    single/multi edge) live behind one [`graph::GraphStore`] interface; the
//!    engine logic above it is shape-agnostic
//! 3. **Validate once**: every property consulted downstream is filled from
//!    defaults and domain-checked at construction; bad combinations abort
//! 4. **Canonical mutation**: `connect`/`disconnect` are the only edge
//!    mutators, so weights, masks, and normalized weights never drift
//!
//! ## Quick Start
//!
//! ```rust
//! use snee::{Network, Properties};
//!
//! # fn example() -> snee::Result<()> {
//! let mut net = Network::new(
//!     Properties::new()
//!         .with("n", 100)
//!         .with("topology", "random")
//!         .with("saturation", 0.1)
//!         .with("weight_dist", "normal")
//!         .with("weight_min", -1.0)
//!         .with("weight_max", 1.0)
//!         .with("seed", 42),
//! )?;
//!
//! // Drive the simulation one tick at a time.
//! let (removed, added) = net.step()?;
//! println!("tick: -{} +{} edges", removed.len(), added.len());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod properties;
pub mod distribution;
pub mod graph;
pub mod topology;
pub mod metrics;
pub mod network;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    AgentType, Conformity, DiffusionSpace, Edge, Homophily, UpdateMethod, Value,
    VisibilityPolicy,
};

// ============================================================================
// Re-exports: Engine
// ============================================================================

pub use distribution::Dist;
pub use graph::GraphKind;
pub use network::Network;
pub use properties::Properties;
pub use topology::Topology;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A supplied property value is outside its enumerated domain.
    #[error("invalid value for property [{key}]: {message}")]
    InvalidProperty { key: String, message: String },

    /// Two or more supplied properties contradict each other.
    #[error("incompatible properties: {0}")]
    IncompatibleProperty(String),

    /// A getter was called for a property that was never set.
    #[error("no property named [{0}] found")]
    UndefinedProperty(String),

    /// An edge (or labeled multi-edge) lookup came up empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// A node index outside `0..n`.
    #[error("node {0} out of range (n = {1})")]
    NodeOutOfRange(usize, usize),
}

pub type Result<T> = std::result::Result<T, Error>;
