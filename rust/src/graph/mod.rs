//! Request dependency graph and critical-path cost.
//!
//! The graph is built once per trace from its requests and a
//! [`DependencyLens`]. Its cost is the heaviest source-to-sink path, where each
//! request weighs its current cost (by default `loading_finished`). Costs can
//! be overridden any number of times to evaluate what-if scenarios; the edge
//! set never changes after construction.

mod calculation;

pub use calculation::{longest_path, topological_sort, CriticalPathResult, Cycle};

use rustc_hash::FxHashSet;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::GraphConfig;
use crate::interner::{NodeId, RequestIdInterner};
use crate::lens::{DependencyEdge, DependencyLens};
use crate::models::Request;
use crate::{log_changes, log_checks, log_debug};

/// Errors that prevent a graph from being built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphConstructionError {
    #[error("Circular dependency detected between requests: {request_ids:?}")]
    CircularDependency { request_ids: Vec<String> },
    #[error("Duplicate request id: {0}")]
    DuplicateRequestId(String),
    #[error("Dependency edge references unknown request: {0}")]
    UnknownRequest(String),
}

/// Dependency DAG over the requests of one trace, with a cached critical-path cost.
#[derive(Clone, Debug)]
pub struct RequestDependencyGraph {
    index: RequestIdInterner,
    requests: Vec<Request>,
    edges: Vec<DependencyEdge>,
    predecessors: Vec<Vec<NodeId>>,
    successors: Vec<Vec<NodeId>>,
    /// Computed once; edges are immutable after construction.
    topo_order: Vec<NodeId>,
    costs: Vec<f64>,
    total_cost: f64,
    critical_path: Vec<NodeId>,
    verbosity: u8,
}

impl RequestDependencyGraph {
    /// Build the graph from every request of a trace and a lens.
    pub fn new<L>(requests: Vec<Request>, lens: &L) -> Result<Self, GraphConstructionError>
    where
        L: DependencyLens + ?Sized,
    {
        Self::with_config(requests, lens, &GraphConfig::default())
    }

    /// Build the graph with explicit settings.
    ///
    /// # Errors
    /// `DuplicateRequestId` if two requests share an id, `UnknownRequest` if
    /// the lens names an id outside `requests`, `CircularDependency` if the
    /// edges do not form a DAG.
    pub fn with_config<L>(
        requests: Vec<Request>,
        lens: &L,
        config: &GraphConfig,
    ) -> Result<Self, GraphConstructionError>
    where
        L: DependencyLens + ?Sized,
    {
        let mut index = RequestIdInterner::with_capacity(requests.len());
        for request in &requests {
            if index.insert(&request.request_id).is_none() {
                return Err(GraphConstructionError::DuplicateRequestId(
                    request.request_id.clone(),
                ));
            }
        }

        let n = requests.len();
        let mut predecessors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut edges = Vec::new();
        let mut seen: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();

        for edge in lens.infer(&requests) {
            let from = index
                .get(&edge.predecessor_id)
                .ok_or_else(|| GraphConstructionError::UnknownRequest(edge.predecessor_id.clone()))?;
            let to = index
                .get(&edge.successor_id)
                .ok_or_else(|| GraphConstructionError::UnknownRequest(edge.successor_id.clone()))?;
            if !seen.insert((from, to)) {
                continue;
            }
            predecessors[to as usize].push(from);
            successors[from as usize].push(to);
            edges.push(edge);
        }

        let topo_order = topological_sort(&predecessors, &successors).map_err(|Cycle(nodes)| {
            let mut request_ids: Vec<String> = nodes
                .into_iter()
                .filter_map(|id| index.resolve(id).map(str::to_string))
                .collect();
            request_ids.sort();
            GraphConstructionError::CircularDependency { request_ids }
        })?;

        let costs = requests.iter().map(Request::default_cost).collect();

        let mut graph = Self {
            index,
            requests,
            edges,
            predecessors,
            successors,
            topo_order,
            costs,
            total_cost: 0.0,
            critical_path: Vec::new(),
            verbosity: config.verbosity,
        };
        graph.recompute();

        log_changes!(
            graph.verbosity,
            "[graph] built {} requests, {} edges, cost {}",
            graph.len(),
            graph.edges.len(),
            graph.total_cost
        );
        Ok(graph)
    }

    /// Critical-path cost for the current node costs. O(1).
    pub fn cost(&self) -> f64 {
        self.total_cost
    }

    /// Replace the cost of every known request named in `overrides`, then
    /// recompute the critical path from scratch. Unknown ids are ignored, as
    /// are costs that are negative or not finite.
    ///
    /// Overrides persist across calls until replaced or reset.
    pub fn update_requests_cost(&mut self, overrides: &HashMap<String, f64>) {
        let previous = self.total_cost;
        for (request_id, &cost) in overrides {
            if !(cost.is_finite() && cost >= 0.0) {
                log_checks!(
                    self.verbosity,
                    "[graph] ignoring invalid cost override {} for request {}",
                    cost,
                    request_id
                );
                continue;
            }
            match self.index.get(request_id) {
                Some(id) => self.costs[id as usize] = cost,
                None => log_checks!(
                    self.verbosity,
                    "[graph] ignoring cost override for unknown request {}",
                    request_id
                ),
            }
        }
        self.recompute();

        if self.total_cost != previous {
            log_changes!(
                self.verbosity,
                "[graph] cost {} -> {}",
                previous,
                self.total_cost
            );
        }
    }

    /// Restore every request to its default cost.
    pub fn reset_costs(&mut self) {
        for (cost, request) in self.costs.iter_mut().zip(&self.requests) {
            *cost = request.default_cost();
        }
        self.recompute();
    }

    /// Request ids along the critical path, source first.
    pub fn critical_path(&self) -> Vec<&str> {
        self.critical_path
            .iter()
            .filter_map(|&id| self.index.resolve(id))
            .collect()
    }

    /// Current cost of one request.
    pub fn request_cost(&self, request_id: &str) -> Option<f64> {
        self.index
            .get(request_id)
            .map(|id| self.costs[id as usize])
    }

    /// Look up a request by id.
    pub fn request(&self, request_id: &str) -> Option<&Request> {
        self.index
            .get(request_id)
            .map(|id| &self.requests[id as usize])
    }

    /// Requests in input order.
    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Deduplicated edges, in the order the lens produced them.
    pub fn edges(&self) -> &[DependencyEdge] {
        &self.edges
    }

    /// Direct predecessors of a request, or `None` if the id is unknown.
    pub fn predecessors(&self, request_id: &str) -> Option<Vec<&str>> {
        let id = self.index.get(request_id)?;
        Some(self.resolve_all(&self.predecessors[id as usize]))
    }

    /// Direct successors of a request, or `None` if the id is unknown.
    pub fn successors(&self, request_id: &str) -> Option<Vec<&str>> {
        let id = self.index.get(request_id)?;
        Some(self.resolve_all(&self.successors[id as usize]))
    }

    /// Number of requests (nodes).
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// True for a graph built from an empty trace.
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    fn resolve_all(&self, ids: &[NodeId]) -> Vec<&str> {
        ids.iter().filter_map(|&id| self.index.resolve(id)).collect()
    }

    fn recompute(&mut self) {
        let result = longest_path(&self.topo_order, &self.predecessors, &self.costs);
        for &node in &self.topo_order {
            log_debug!(
                self.verbosity,
                "[graph] best({}) = {}",
                self.index.resolve(node).unwrap_or("?"),
                result.best[node as usize]
            );
        }
        self.critical_path = result.path();
        self.total_cost = result.total_cost;
    }
}
