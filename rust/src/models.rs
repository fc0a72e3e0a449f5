//! Core data types for recorded page loads.
//!
//! Records are immutable once built. Malformed timing values are rejected at
//! construction so nothing downstream has to re-validate them.

use chrono::NaiveDateTime;
use pyo3::prelude::*;
use thiserror::Error;

/// Errors raised while building request records.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    #[error("Invalid timing field {field}: {value} (must be finite and non-negative)")]
    InvalidTiming { field: &'static str, value: f64 },
    #[error("Missing required request field: {0}")]
    MissingField(&'static str),
}

fn check_offset(field: &'static str, value: f64) -> Result<f64, RequestError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RequestError::InvalidTiming { field, value })
    }
}

/// Timing marks of one fetch, as offsets relative to navigation start.
#[pyclass]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    #[pyo3(get)]
    pub request_time: f64,
    #[pyo3(get)]
    pub receive_headers_end: f64,
    #[pyo3(get)]
    pub loading_finished: f64,
}

impl Timing {
    /// Build a timing record. No ordering between the marks is enforced.
    pub fn new(
        request_time: f64,
        receive_headers_end: f64,
        loading_finished: f64,
    ) -> Result<Self, RequestError> {
        Ok(Self {
            request_time: check_offset("request_time", request_time)?,
            receive_headers_end: check_offset("receive_headers_end", receive_headers_end)?,
            loading_finished: check_offset("loading_finished", loading_finished)?,
        })
    }
}

#[pymethods]
impl Timing {
    #[new]
    #[pyo3(signature = (request_time, loading_finished, receive_headers_end=0.0))]
    fn py_new(request_time: f64, loading_finished: f64, receive_headers_end: f64) -> PyResult<Self> {
        Self::new(request_time, receive_headers_end, loading_finished)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "Timing(request_time={}, receive_headers_end={}, loading_finished={})",
            self.request_time, self.receive_headers_end, self.loading_finished
        )
    }
}

/// What caused a request to be issued.
#[pyclass(eq, eq_int)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InitiatorType {
    Other,
    Parser,
    Script,
    Redirect,
}

impl Default for InitiatorType {
    fn default() -> Self {
        Self::Other
    }
}

/// Initiator metadata attached to a request.
#[pyclass]
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Initiator {
    #[pyo3(get)]
    pub initiator_type: InitiatorType,
    /// URL of the causing resource (document for parser, script for script).
    #[pyo3(get)]
    pub url: Option<String>,
    /// Id of the causing request, when the trace records it directly.
    #[pyo3(get)]
    pub request_id: Option<String>,
    #[pyo3(get)]
    pub line_number: Option<u32>,
    /// Script URLs of the JS call stack, innermost frame first.
    #[pyo3(get)]
    pub stack_urls: Vec<String>,
}

impl Initiator {
    /// No recorded cause; never yields an edge.
    pub fn other() -> Self {
        Self::default()
    }

    /// Issued while parsing the document at `url`.
    pub fn parser(url: impl Into<String>) -> Self {
        Self {
            initiator_type: InitiatorType::Parser,
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Issued by script; `stack_urls` innermost frame first.
    pub fn script<I, S>(stack_urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            initiator_type: InitiatorType::Script,
            stack_urls: stack_urls.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Redirect response of the request `request_id`.
    pub fn redirect(request_id: impl Into<String>) -> Self {
        Self {
            initiator_type: InitiatorType::Redirect,
            request_id: Some(request_id.into()),
            ..Self::default()
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_line_number(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }
}

#[pymethods]
impl Initiator {
    #[new]
    #[pyo3(signature = (initiator_type, url=None, request_id=None, line_number=None, stack_urls=None))]
    fn py_new(
        initiator_type: InitiatorType,
        url: Option<String>,
        request_id: Option<String>,
        line_number: Option<u32>,
        stack_urls: Option<Vec<String>>,
    ) -> Self {
        Self {
            initiator_type,
            url,
            request_id,
            line_number,
            stack_urls: stack_urls.unwrap_or_default(),
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Initiator(type={:?}, url={:?}, request_id={:?})",
            self.initiator_type, self.url, self.request_id
        )
    }
}

/// One network fetch observed in a page-load trace.
#[pyclass]
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    /// Unique within a trace; every redirect hop has its own id.
    #[pyo3(get)]
    pub request_id: String,
    /// Identity shared by all hops of a redirect chain.
    #[pyo3(get)]
    pub logical_id: String,
    #[pyo3(get)]
    pub url: String,
    #[pyo3(get)]
    pub frame_id: String,
    /// Document that issued the request. Parser initiators without a URL
    /// resolve against it.
    #[pyo3(get)]
    pub document_url: Option<String>,
    #[pyo3(get)]
    pub initiator: Initiator,
    #[pyo3(get)]
    pub timing: Timing,
    /// Wall-clock time matching `timing.request_time`, if recorded. Carried
    /// through for callers; costs use only the relative offsets.
    #[pyo3(get)]
    pub wall_time: Option<NaiveDateTime>,
}

impl Request {
    /// Start a [`RequestBuilder`].
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Cost of this request before any override: its `loading_finished` offset.
    pub fn default_cost(&self) -> f64 {
        self.timing.loading_finished
    }
}

#[pymethods]
impl Request {
    #[new]
    #[pyo3(signature = (
        request_id,
        url,
        timing,
        initiator=None,
        frame_id=None,
        logical_id=None,
        document_url=None,
        wall_time=None
    ))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        request_id: String,
        url: String,
        timing: Timing,
        initiator: Option<Initiator>,
        frame_id: Option<String>,
        logical_id: Option<String>,
        document_url: Option<String>,
        wall_time: Option<NaiveDateTime>,
    ) -> PyResult<Self> {
        let mut builder = Request::builder()
            .request_id(request_id)
            .url(url)
            .timing(timing)
            .initiator(initiator.unwrap_or_default());
        if let Some(frame_id) = frame_id {
            builder = builder.frame_id(frame_id);
        }
        if let Some(logical_id) = logical_id {
            builder = builder.logical_id(logical_id);
        }
        if let Some(document_url) = document_url {
            builder = builder.document_url(document_url);
        }
        if let Some(wall_time) = wall_time {
            builder = builder.wall_time(wall_time);
        }
        builder
            .build()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[getter(default_cost)]
    fn py_default_cost(&self) -> f64 {
        self.default_cost()
    }

    fn __repr__(&self) -> String {
        format!(
            "Request(request_id={:?}, url={:?}, document_url={:?}, loading_finished={}, wall_time={:?})",
            self.request_id,
            self.url,
            self.document_url,
            self.timing.loading_finished,
            self.wall_time
        )
    }
}

/// Named-field builder for [`Request`].
#[derive(Clone, Debug, Default)]
pub struct RequestBuilder {
    request_id: Option<String>,
    logical_id: Option<String>,
    url: Option<String>,
    frame_id: String,
    document_url: Option<String>,
    initiator: Initiator,
    timing: Option<Timing>,
    wall_time: Option<NaiveDateTime>,
}

impl RequestBuilder {
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Defaults to the request id, i.e. a single-hop chain.
    pub fn logical_id(mut self, logical_id: impl Into<String>) -> Self {
        self.logical_id = Some(logical_id.into());
        self
    }

    /// Required.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Defaults to empty.
    pub fn frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    pub fn document_url(mut self, document_url: impl Into<String>) -> Self {
        self.document_url = Some(document_url.into());
        self
    }

    /// Defaults to [`Initiator::other`].
    pub fn initiator(mut self, initiator: Initiator) -> Self {
        self.initiator = initiator;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }

    pub fn wall_time(mut self, wall_time: NaiveDateTime) -> Self {
        self.wall_time = Some(wall_time);
        self
    }

    /// Validate and assemble the request.
    ///
    /// # Errors
    /// `MissingField` without an id, URL or timing; `InvalidTiming` for a
    /// negative or non-finite offset.
    pub fn build(self) -> Result<Request, RequestError> {
        let request_id = self
            .request_id
            .ok_or(RequestError::MissingField("request_id"))?;
        let url = self.url.ok_or(RequestError::MissingField("url"))?;
        let timing = self.timing.ok_or(RequestError::MissingField("timing"))?;
        // Re-check in case the record was assembled by hand.
        let timing = Timing::new(
            timing.request_time,
            timing.receive_headers_end,
            timing.loading_finished,
        )?;

        Ok(Request {
            logical_id: self.logical_id.unwrap_or_else(|| request_id.clone()),
            request_id,
            url,
            frame_id: self.frame_id,
            document_url: self.document_url,
            initiator: self.initiator,
            timing,
            wall_time: self.wall_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_timing_rejects_negative_and_nan() {
        assert_eq!(
            Timing::new(-1.0, 0.0, 0.0),
            Err(RequestError::InvalidTiming {
                field: "request_time",
                value: -1.0
            })
        );
        assert!(Timing::new(0.0, f64::NAN, 0.0).is_err());
        assert!(Timing::new(0.0, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_timing_allows_unordered_marks() {
        // loading_finished earlier than request_time is a valid record
        let timing = Timing::new(12.0, 0.0, 10.0).unwrap();
        assert_eq!(timing.request_time, 12.0);
        assert_eq!(timing.loading_finished, 10.0);
    }

    #[test]
    fn test_builder_defaults() {
        let request = Request::builder()
            .request_id("42")
            .url("http://example.com/")
            .timing(Timing::new(1.0, 2.0, 3.0).unwrap())
            .build()
            .unwrap();

        assert_eq!(request.logical_id, "42");
        assert_eq!(request.frame_id, "");
        assert_eq!(request.initiator, Initiator::other());
        assert_eq!(request.default_cost(), 3.0);
        assert!(request.wall_time.is_none());
    }

    #[test]
    fn test_builder_missing_fields() {
        let missing_url = Request::builder()
            .request_id("1")
            .timing(Timing::new(0.0, 0.0, 0.0).unwrap())
            .build();
        assert_eq!(missing_url, Err(RequestError::MissingField("url")));

        let missing_timing = Request::builder().request_id("1").url("u").build();
        assert_eq!(missing_timing, Err(RequestError::MissingField("timing")));

        let missing_id = Request::builder().url("u").build();
        assert_eq!(missing_id, Err(RequestError::MissingField("request_id")));
    }

    #[test]
    fn test_builder_rechecks_hand_built_timing() {
        let bad = Timing {
            request_time: 0.0,
            receive_headers_end: -5.0,
            loading_finished: 1.0,
        };
        let result = Request::builder()
            .request_id("1")
            .url("u")
            .timing(bad)
            .build();
        assert!(matches!(
            result,
            Err(RequestError::InvalidTiming {
                field: "receive_headers_end",
                ..
            })
        ));
    }

    #[test]
    fn test_builder_keeps_optional_fields() {
        let wall_time = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let request = Request::builder()
            .request_id("1.redirect.0")
            .logical_id("1")
            .url("http://example.com/")
            .frame_id("frame")
            .document_url("http://example.com/")
            .initiator(Initiator::parser("http://example.com/").with_line_number(7))
            .timing(Timing::new(0.0, 0.0, 1.0).unwrap())
            .wall_time(wall_time)
            .build()
            .unwrap();

        assert_eq!(request.logical_id, "1");
        assert_eq!(request.frame_id, "frame");
        assert_eq!(request.initiator.line_number, Some(7));
        assert_eq!(request.wall_time, Some(wall_time));
    }

    #[test]
    fn test_initiator_constructors() {
        let script = Initiator::script(["a.js", "b.js"]);
        assert_eq!(script.initiator_type, InitiatorType::Script);
        assert_eq!(script.stack_urls, vec!["a.js".to_string(), "b.js".to_string()]);

        let redirect = Initiator::redirect("7");
        assert_eq!(redirect.initiator_type, InitiatorType::Redirect);
        assert_eq!(redirect.request_id.as_deref(), Some("7"));

        let parser = Initiator::parser("doc").with_request_id("3");
        assert_eq!(parser.url.as_deref(), Some("doc"));
        assert_eq!(parser.request_id.as_deref(), Some("3"));
    }
}
