//! # Graph Store
//!
//! The engine supports exactly four graph shapes, chosen once at
//! construction and immutable thereafter. They live behind one interface as
//! a sum type; the higher-level engine logic (masking, updates, rewiring)
//! is identical across all four and only the storage/edge-identity rules
//! differ.
//!
//! | Shape | Directed | Parallel edges |
//! |-------|----------|----------------|
//! | `Graph` | no | no |
//! | `DiGraph` | yes | no |
//! | `MultiGraph` | no | yes |
//! | `MultiDiGraph` | yes | yes |

pub mod multi;
pub mod simple;

use serde::{Deserialize, Serialize};

pub use multi::MultiStore;
pub use simple::SimpleStore;

// ============================================================================
// Shape selection
// ============================================================================

/// Which of the four graph shapes a network was built as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    Graph,
    DiGraph,
    MultiGraph,
    MultiDiGraph,
}

impl GraphKind {
    pub fn from_flags(directed: bool, multiedge: bool) -> Self {
        match (directed, multiedge) {
            (false, false) => Self::Graph,
            (true, false) => Self::DiGraph,
            (false, true) => Self::MultiGraph,
            (true, true) => Self::MultiDiGraph,
        }
    }

    pub fn directed(self) -> bool {
        matches!(self, Self::DiGraph | Self::MultiDiGraph)
    }

    pub fn multiedge(self) -> bool {
        matches!(self, Self::MultiGraph | Self::MultiDiGraph)
    }
}

// ============================================================================
// Edge record
// ============================================================================

/// One stored edge: an optional label (multi shapes only) and a weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub label: Option<String>,
    pub weight: f64,
}

// ============================================================================
// GraphStore
// ============================================================================

/// Sum type over the four storage backends.
#[derive(Debug, Clone)]
pub enum GraphStore {
    Graph(SimpleStore),
    DiGraph(SimpleStore),
    MultiGraph(MultiStore),
    MultiDiGraph(MultiStore),
}

impl GraphStore {
    pub fn new(kind: GraphKind) -> Self {
        match kind {
            GraphKind::Graph => Self::Graph(SimpleStore::new()),
            GraphKind::DiGraph => Self::DiGraph(SimpleStore::new()),
            GraphKind::MultiGraph => Self::MultiGraph(MultiStore::new()),
            GraphKind::MultiDiGraph => Self::MultiDiGraph(MultiStore::new()),
        }
    }

    pub fn kind(&self) -> GraphKind {
        match self {
            Self::Graph(_) => GraphKind::Graph,
            Self::DiGraph(_) => GraphKind::DiGraph,
            Self::MultiGraph(_) => GraphKind::MultiGraph,
            Self::MultiDiGraph(_) => GraphKind::MultiDiGraph,
        }
    }

    pub fn directed(&self) -> bool {
        self.kind().directed()
    }

    pub fn multiedge(&self) -> bool {
        self.kind().multiedge()
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.has_edge(u, v),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.has_edge(u, v),
        }
    }

    /// Insert an edge. Returns false when a simple shape already holds the
    /// pair (multi shapes always append).
    pub fn add(&mut self, u: usize, v: usize, label: Option<String>, weight: f64) -> bool {
        match self {
            Self::Graph(s) => s.add(u, v, weight, false),
            Self::DiGraph(s) => s.add(u, v, weight, true),
            Self::MultiGraph(s) => {
                s.add(u, v, EdgeRecord { label, weight }, false);
                true
            }
            Self::MultiDiGraph(s) => {
                s.add(u, v, EdgeRecord { label, weight }, true);
                true
            }
        }
    }

    /// Remove edge(s). None when nothing matched.
    pub fn remove(&mut self, u: usize, v: usize, label: Option<&str>) -> Option<Vec<EdgeRecord>> {
        match self {
            Self::Graph(s) => {
                s.remove(u, v, false).map(|weight| vec![EdgeRecord { label: None, weight }])
            }
            Self::DiGraph(s) => {
                s.remove(u, v, true).map(|weight| vec![EdgeRecord { label: None, weight }])
            }
            Self::MultiGraph(s) => s.remove(u, v, label, false),
            Self::MultiDiGraph(s) => s.remove(u, v, label, true),
        }
    }

    /// Weight of the edge u→v (first parallel record in multi shapes).
    pub fn weight(&self, u: usize, v: usize) -> Option<f64> {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.weight(u, v),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.weight(u, v),
        }
    }

    pub fn weight_labeled(&self, u: usize, v: usize, label: &str) -> Option<f64> {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.weight(u, v),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.weight_labeled(u, v, label),
        }
    }

    pub fn out_neighbors(&self, u: usize) -> Vec<usize> {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.out_neighbors(u),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.out_neighbors(u),
        }
    }

    pub fn in_neighbors(&self, u: usize) -> Vec<usize> {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.in_neighbors(u),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.in_neighbors(u),
        }
    }

    pub fn in_weights(&self, u: usize) -> Vec<(usize, f64)> {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.in_weights(u),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.in_weights(u),
        }
    }

    /// Every stored edge as (u, v, label, weight); undirected pairs once.
    pub fn edges(&self) -> Vec<(usize, usize, Option<String>, f64)> {
        match self {
            Self::Graph(s) => {
                s.edges(false).into_iter().map(|(u, v, w)| (u, v, None, w)).collect()
            }
            Self::DiGraph(s) => {
                s.edges(true).into_iter().map(|(u, v, w)| (u, v, None, w)).collect()
            }
            Self::MultiGraph(s) => s.edges(false),
            Self::MultiDiGraph(s) => s.edges(true),
        }
    }

    pub fn edge_count(&self) -> usize {
        match self {
            Self::Graph(s) | Self::DiGraph(s) => s.edge_count(),
            Self::MultiGraph(s) | Self::MultiDiGraph(s) => s.edge_count(),
        }
    }
}
