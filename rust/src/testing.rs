//! Request factories shared by unit tests.

use crate::models::{Initiator, Request, RequestBuilder, Timing};

pub(crate) fn make_request(
    request_id: &str,
    url: &str,
    request_time: f64,
    loading_finished: f64,
) -> RequestBuilder {
    Request::builder()
        .request_id(request_id)
        .url(url)
        .frame_id("main")
        .timing(Timing::new(request_time, request_time, loading_finished).unwrap())
}

/// A page load with a redirected document, scripts and one heavy image.
///
/// ```text
/// 1.redirect.0 (First redirect, 10)
///   -> 1.redirect.1 (Second redirect, 10)
///   -> 1 (Redirected request, 10)
///   -> 2 (Request, 10)
///   -> 4 (JS request 2, 10)
///   -> 5 (Image, 6960)
/// 1 -> 3 (JS request 1, 10)
/// ```
///
/// The critical path costs 7010.
pub(crate) fn page_load_requests() -> Vec<Request> {
    const DOC: &str = "http://bla.com/index.html";
    vec![
        make_request("1.redirect.0", "http://bla.com/", 0.0, 10.0).logical_id("1"),
        make_request("1.redirect.1", "http://bla.com/redirect1", 1.0, 10.0).logical_id("1"),
        make_request("1", DOC, 2.0, 10.0).logical_id("1"),
        make_request("2", "http://bla.com/app.js", 3.0, 10.0).initiator(Initiator::parser(DOC)),
        make_request("3", "http://bla.com/nyancat.js", 4.0, 10.0)
            .initiator(Initiator::parser(DOC)),
        make_request("4", "http://bla.com/cat.js", 5.0, 10.0)
            .initiator(Initiator::script(["http://bla.com/app.js"])),
        make_request("5", "http://bla.com/cat.png", 6.0, 6960.0)
            .initiator(Initiator::script(["http://bla.com/cat.js"])),
    ]
    .into_iter()
    .map(|builder| builder.build().unwrap())
    .collect()
}
