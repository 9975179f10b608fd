//! # Graph Metrics
//!
//! Node-level metrics the rendering layer uses for sizing and coloring:
//! degree centrality, closeness, betweenness (Brandes), and local
//! clustering. Computed on demand from the current edge set, never cached;
//! self-loops are excluded everywhere since they carry no path information.

use std::collections::VecDeque;

use crate::graph::GraphStore;

/// Out-neighbors of `u` with any self-loop stripped.
fn path_neighbors(store: &GraphStore, u: usize) -> Vec<usize> {
    store.out_neighbors(u).into_iter().filter(|&v| v != u).collect()
}

/// Degree centrality: degree / (n - 1). Directed graphs use out-degree.
pub fn degree_centrality(store: &GraphStore, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![0.0; n];
    }
    let scale = 1.0 / (n - 1) as f64;
    (0..n).map(|u| path_neighbors(store, u).len() as f64 * scale).collect()
}

/// Closeness centrality: (reachable - 1) / total-distance, scaled by the
/// reachable fraction so disconnected components don't inflate scores.
pub fn closeness_centrality(store: &GraphStore, n: usize) -> Vec<f64> {
    (0..n)
        .map(|u| {
            let dist = bfs_distances(store, n, u);
            let mut total = 0usize;
            let mut reached = 0usize;
            for d in dist.into_iter().flatten() {
                if d > 0 {
                    total += d;
                    reached += 1;
                }
            }
            if total == 0 {
                return 0.0;
            }
            let close = reached as f64 / total as f64;
            if n > 1 { close * (reached as f64 / (n - 1) as f64) } else { close }
        })
        .collect()
}

/// Betweenness centrality via Brandes' accumulation, unweighted and
/// normalized to [0, 1].
pub fn betweenness_centrality(store: &GraphStore, n: usize) -> Vec<f64> {
    let mut bc = vec![0.0f64; n];
    if n < 3 {
        return bc;
    }
    for s in 0..n {
        // Single-source shortest paths.
        let mut stack: Vec<usize> = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0f64; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for w in path_neighbors(store, v) {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }
        // Dependency accumulation in reverse BFS order.
        let mut delta = vec![0.0f64; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }
    // Undirected accumulation counts each pair from both endpoints, which
    // exactly cancels the factor-2 in the undirected pair count, so one
    // denominator serves both directed and undirected graphs.
    let norm = ((n - 1) * (n - 2)) as f64;
    for x in &mut bc {
        *x /= norm;
    }
    bc
}

/// Local clustering coefficient: closed triangles over possible triangles in
/// each node's neighborhood. Direction is ignored (links are treated as
/// mutual for the purpose of triangle counting).
pub fn clustering_coefficient(store: &GraphStore, n: usize) -> Vec<f64> {
    let neighborhoods: Vec<Vec<usize>> = (0..n)
        .map(|u| {
            let mut nb = path_neighbors(store, u);
            for v in store.in_neighbors(u) {
                if v != u && !nb.contains(&v) {
                    nb.push(v);
                }
            }
            nb
        })
        .collect();
    neighborhoods
        .iter()
        .map(|nb| {
            let k = nb.len();
            if k < 2 {
                return 0.0;
            }
            let mut links = 0usize;
            for (i, &a) in nb.iter().enumerate() {
                for &b in &nb[i + 1..] {
                    if neighborhoods[a].contains(&b) {
                        links += 1;
                    }
                }
            }
            2.0 * links as f64 / (k * (k - 1)) as f64
        })
        .collect()
}

/// Unweighted BFS hop counts from `source`; None where unreachable.
fn bfs_distances(store: &GraphStore, n: usize, source: usize) -> Vec<Option<usize>> {
    let mut dist = vec![None; n];
    dist[source] = Some(0);
    let mut queue = VecDeque::new();
    queue.push_back(source);
    while let Some(u) = queue.pop_front() {
        let du = match dist[u] {
            Some(d) => d,
            None => continue,
        };
        for v in path_neighbors(store, u) {
            if dist[v].is_none() {
                dist[v] = Some(du + 1);
                queue.push_back(v);
            }
        }
    }
    dist
}
