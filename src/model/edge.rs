//! Edge DTO returned by the mutation protocol.

use serde::{Deserialize, Serialize};

/// An edge actually added or removed by `connect`/`disconnect`.
///
/// `label` is `None` for simple graphs and for unlabeled multi-edges.
/// For undirected graphs `src <= dst` (canonical order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub src: usize,
    pub dst: usize,
    pub label: Option<String>,
    pub weight: f64,
}

impl Edge {
    /// The other end of the edge from the given node.
    pub fn other_node(&self, from: usize) -> Option<usize> {
        if from == self.src {
            Some(self.dst)
        } else if from == self.dst {
            Some(self.src)
        } else {
            None
        }
    }
}
