//! Configuration types for dependency inference and graph construction.

use pyo3::prelude::*;

/// Toggles for the passes of the built-in dependency lens.
#[pyclass]
#[derive(Clone, Debug)]
pub struct LensConfig {
    /// Chain the hops of each redirect.
    #[pyo3(get, set)]
    pub infer_redirects: bool,
    /// Link parser-initiated requests to their document.
    #[pyo3(get, set)]
    pub infer_parser: bool,
    /// Link script-initiated requests to the script on the call stack.
    #[pyo3(get, set)]
    pub infer_script: bool,
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            infer_redirects: true,
            infer_parser: true,
            infer_script: true,
            verbosity: 0,
        }
    }
}

#[pymethods]
impl LensConfig {
    #[new]
    #[pyo3(signature = (infer_redirects=None, infer_parser=None, infer_script=None, verbosity=None))]
    fn new(
        infer_redirects: Option<bool>,
        infer_parser: Option<bool>,
        infer_script: Option<bool>,
        verbosity: Option<u8>,
    ) -> Self {
        let defaults = Self::default();
        Self {
            infer_redirects: infer_redirects.unwrap_or(defaults.infer_redirects),
            infer_parser: infer_parser.unwrap_or(defaults.infer_parser),
            infer_script: infer_script.unwrap_or(defaults.infer_script),
            verbosity: verbosity.unwrap_or(defaults.verbosity),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "LensConfig(infer_redirects={}, infer_parser={}, infer_script={})",
            self.infer_redirects, self.infer_parser, self.infer_script
        )
    }
}

/// Configuration for the request dependency graph.
#[pyclass]
#[derive(Clone, Debug, Default)]
pub struct GraphConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    #[pyo3(get, set)]
    pub verbosity: u8,
}

#[pymethods]
impl GraphConfig {
    #[new]
    #[pyo3(signature = (verbosity=0))]
    fn new(verbosity: u8) -> Self {
        Self { verbosity }
    }

    fn __repr__(&self) -> String {
        format!("GraphConfig(verbosity={})", self.verbosity)
    }
}
