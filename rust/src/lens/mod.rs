//! Dependency inference between requests.
//!
//! A lens looks at every request of one trace and reports which requests must
//! complete before others can start. The built-in [`RequestDependencyLens`]
//! combines redirect chains with initiator references; callers may plug in
//! any other [`DependencyLens`].

mod initiator;
mod redirect;

use pyo3::prelude::*;
use rustc_hash::FxHashSet;

use crate::config::LensConfig;
use crate::log_debug;
use crate::models::Request;

/// Why an edge was inferred.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeReason {
    Redirect,
    Parser,
    Script,
}

/// Directed "must-precede" relation between two requests.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    #[pyo3(get)]
    pub predecessor_id: String,
    #[pyo3(get)]
    pub successor_id: String,
    #[pyo3(get)]
    pub reason: EdgeReason,
}

impl DependencyEdge {
    pub fn new(
        predecessor_id: impl Into<String>,
        successor_id: impl Into<String>,
        reason: EdgeReason,
    ) -> Self {
        Self {
            predecessor_id: predecessor_id.into(),
            successor_id: successor_id.into(),
            reason,
        }
    }
}

#[pymethods]
impl DependencyEdge {
    fn __repr__(&self) -> String {
        format!(
            "DependencyEdge({:?} -> {:?}, reason={:?})",
            self.predecessor_id, self.successor_id, self.reason
        )
    }
}

/// Infers dependency edges from the requests of one trace.
///
/// Implementations must only name request ids present in the input and
/// should be stateless.
pub trait DependencyLens {
    fn infer(&self, requests: &[Request]) -> Vec<DependencyEdge>;
}

impl<F> DependencyLens for F
where
    F: Fn(&[Request]) -> Vec<DependencyEdge>,
{
    fn infer(&self, requests: &[Request]) -> Vec<DependencyEdge> {
        self(requests)
    }
}

/// Default lens: redirect chains plus parser/script initiators.
#[derive(Clone, Debug, Default)]
pub struct RequestDependencyLens {
    config: LensConfig,
}

impl RequestDependencyLens {
    /// Lens running every inference pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lens running only the passes enabled in `config`.
    pub fn with_config(config: LensConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LensConfig {
        &self.config
    }
}

impl DependencyLens for RequestDependencyLens {
    fn infer(&self, requests: &[Request]) -> Vec<DependencyEdge> {
        let mut edges = Vec::new();
        if self.config.infer_redirects {
            edges.extend(redirect::redirect_edges(requests, self.config.verbosity));
        }
        edges.extend(initiator::initiator_edges(requests, &self.config));

        let edges = dedup_edges(edges);
        for edge in &edges {
            log_debug!(
                self.config.verbosity,
                "[lens] {} -> {} ({:?})",
                edge.predecessor_id,
                edge.successor_id,
                edge.reason
            );
        }
        edges
    }
}

/// Collapse edges with the same endpoints, keeping the first occurrence.
pub fn dedup_edges<I>(edges: I) -> Vec<DependencyEdge>
where
    I: IntoIterator<Item = DependencyEdge>,
{
    let mut seen: FxHashSet<(String, String)> = FxHashSet::default();
    edges
        .into_iter()
        .filter(|edge| seen.insert((edge.predecessor_id.clone(), edge.successor_id.clone())))
        .collect()
}
