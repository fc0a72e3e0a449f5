//! Critical-path cost engine for page-load dependency graphs.
//!
//! Builds a DAG of the network requests of one recorded page load and
//! computes the heaviest path through it, then recomputes that cost under
//! hypothetical per-request costs (e.g. a prefetched resource becoming free).

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;
use std::collections::HashMap;

mod config;
pub mod graph;
mod interner;
pub mod lens;
pub mod logging;
mod models;
#[cfg(test)]
mod testing;

pub use config::{GraphConfig, LensConfig};
pub use graph::{GraphConstructionError, RequestDependencyGraph};
pub use interner::{NodeId, RequestIdInterner};
pub use lens::{DependencyEdge, DependencyLens, EdgeReason, RequestDependencyLens};
pub use models::{Initiator, InitiatorType, Request, RequestBuilder, RequestError, Timing};

/// Infer dependency edges for a trace with the built-in lens.
///
/// # Arguments
/// * `requests` - Every request of one trace
/// * `config` - Which inference passes to run (all by default)
#[pyfunction]
#[pyo3(signature = (requests, config=None))]
fn infer_dependencies(requests: Vec<Request>, config: Option<LensConfig>) -> Vec<DependencyEdge> {
    RequestDependencyLens::with_config(config.unwrap_or_default()).infer(&requests)
}

/// Request dependency graph built with the built-in lens (PyO3 wrapper).
#[pyclass(name = "RequestDependencyGraph")]
pub struct PyRequestDependencyGraph {
    inner: RequestDependencyGraph,
}

#[pymethods]
impl PyRequestDependencyGraph {
    /// # Raises
    /// * ValueError if the inferred dependencies are cyclic or ids repeat
    #[new]
    #[pyo3(signature = (requests, lens_config=None, config=None))]
    fn new(
        requests: Vec<Request>,
        lens_config: Option<LensConfig>,
        config: Option<GraphConfig>,
    ) -> PyResult<Self> {
        let lens = RequestDependencyLens::with_config(lens_config.unwrap_or_default());
        RequestDependencyGraph::with_config(requests, &lens, &config.unwrap_or_default())
            .map(|inner| Self { inner })
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn cost(&self) -> f64 {
        self.inner.cost()
    }

    fn update_requests_cost(&mut self, overrides: HashMap<String, f64>) {
        self.inner.update_requests_cost(&overrides);
    }

    fn reset_costs(&mut self) {
        self.inner.reset_costs();
    }

    fn critical_path(&self) -> Vec<String> {
        self.inner
            .critical_path()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    fn request_cost(&self, request_id: &str) -> Option<f64> {
        self.inner.request_cost(request_id)
    }

    fn edges(&self) -> Vec<DependencyEdge> {
        self.inner.edges().to_vec()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "RequestDependencyGraph(requests={}, edges={}, cost={})",
            self.inner.len(),
            self.inner.edges().len(),
            self.inner.cost()
        )
    }
}

/// The loadcost.rust Python module.
#[pymodule]
fn rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Trace records
    m.add_class::<Timing>()?;
    m.add_class::<InitiatorType>()?;
    m.add_class::<Initiator>()?;
    m.add_class::<Request>()?;

    // Dependencies
    m.add_class::<EdgeReason>()?;
    m.add_class::<DependencyEdge>()?;
    m.add_class::<PyRequestDependencyGraph>()?;

    // Config types
    m.add_class::<LensConfig>()?;
    m.add_class::<GraphConfig>()?;

    m.add_function(wrap_pyfunction!(infer_dependencies, m)?)?;

    Ok(())
}
