//! Topological ordering and longest-path passes over the request DAG.
//!
//! Both passes work on dense node indices with adjacency lists, so each call
//! is O(V + E).

use std::collections::VecDeque;

use crate::interner::NodeId;

/// Nodes that could not be ordered because they sit on or behind a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(pub Vec<NodeId>);

/// Topological sort using Kahn's algorithm.
///
/// Sources are seeded in index order and the queue is FIFO, so the result is
/// deterministic for a given graph.
pub fn topological_sort(
    predecessors: &[Vec<NodeId>],
    successors: &[Vec<NodeId>],
) -> Result<Vec<NodeId>, Cycle> {
    let n = predecessors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();

    let mut queue: VecDeque<NodeId> = (0..n as NodeId)
        .filter(|&id| in_degree[id as usize] == 0)
        .collect();
    let mut result: Vec<NodeId> = Vec::with_capacity(n);

    while let Some(node) = queue.pop_front() {
        result.push(node);
        for &next in &successors[node as usize] {
            let degree = &mut in_degree[next as usize];
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(next);
            }
        }
    }

    if result.len() != n {
        let unresolved = (0..n as NodeId)
            .filter(|&id| in_degree[id as usize] > 0)
            .collect();
        return Err(Cycle(unresolved));
    }

    Ok(result)
}

/// Result of one longest-path pass.
#[derive(Clone, Debug)]
pub struct CriticalPathResult {
    /// Heaviest path cost ending at each node, indexed by node.
    pub best: Vec<f64>,
    /// Predecessor through which `best` was reached.
    pub via: Vec<Option<NodeId>>,
    /// Maximum of `best` over all nodes (0 for an empty graph).
    pub total_cost: f64,
    /// Node where the critical path ends.
    pub end: Option<NodeId>,
}

impl CriticalPathResult {
    /// Nodes of the critical path, source first.
    pub fn path(&self) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = self.end;
        while let Some(node) = current {
            path.push(node);
            current = self.via[node as usize];
        }
        path.reverse();
        path
    }
}

/// Longest path through the DAG with node weights `costs`.
///
/// `best(n) = cost(n) + max(best(p) for p in predecessors(n))`, with 0 when
/// `n` has no predecessors. Ties keep the first predecessor in adjacency
/// order and the earliest end node in `topo_order`.
pub fn longest_path(
    topo_order: &[NodeId],
    predecessors: &[Vec<NodeId>],
    costs: &[f64],
) -> CriticalPathResult {
    let n = costs.len();
    let mut best = vec![0.0; n];
    let mut via: Vec<Option<NodeId>> = vec![None; n];
    let mut total_cost = 0.0;
    let mut end: Option<NodeId> = None;

    for &node in topo_order {
        let idx = node as usize;

        let mut start = 0.0;
        let mut from: Option<NodeId> = None;
        for &pred in &predecessors[idx] {
            let pred_best = best[pred as usize];
            if from.is_none() || pred_best > start {
                start = pred_best;
                from = Some(pred);
            }
        }

        best[idx] = start + costs[idx];
        via[idx] = from;

        if end.is_none() || best[idx] > total_cost {
            total_cost = best[idx];
            end = Some(node);
        }
    }

    CriticalPathResult {
        best,
        via,
        total_cost,
        end,
    }
}
