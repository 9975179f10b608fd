//! # Engine Model
//!
//! Plain DTOs and vocabularies that cross every boundary: property store ↔
//! graph store ↔ update engine ↔ caller. This module is pure data: no I/O,
//! no RNG state, no graph storage.

pub mod agent;
pub mod edge;
pub mod space;
pub mod value;

pub use agent::{AgentRegistry, AgentType, Conformity, Homophily};
pub use edge::Edge;
pub use space::{DiffusionSpace, UpdateMethod, VisibilityPolicy};
pub use value::Value;
