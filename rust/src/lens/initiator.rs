//! Initiator-based inference: the response of A caused request B.

use rustc_hash::FxHashMap;

use crate::config::LensConfig;
use crate::log_checks;
use crate::models::{InitiatorType, Request};

use super::{DependencyEdge, EdgeReason};

/// Lookup tables over one trace's requests.
struct RequestLookup<'a> {
    requests: &'a [Request],
    by_id: FxHashMap<&'a str, usize>,
    /// URL -> request indices in input order.
    by_url: FxHashMap<&'a str, Vec<usize>>,
}

impl<'a> RequestLookup<'a> {
    fn new(requests: &'a [Request]) -> Self {
        let mut by_id = FxHashMap::with_capacity_and_hasher(requests.len(), Default::default());
        let mut by_url: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for (idx, request) in requests.iter().enumerate() {
            by_id.insert(request.request_id.as_str(), idx);
            by_url.entry(request.url.as_str()).or_default().push(idx);
        }
        Self {
            requests,
            by_id,
            by_url,
        }
    }

    /// Latest request for `url` that precedes `successor`.
    ///
    /// A request issued at the same time as `successor` only precedes it if it
    /// comes earlier in input order, so two requests can never resolve to each
    /// other.
    fn resolve_url(&self, url: &str, successor: usize) -> Option<usize> {
        let before = self.requests[successor].timing.request_time;
        self.by_url
            .get(url)?
            .iter()
            .copied()
            .filter(|&idx| {
                let time = self.requests[idx].timing.request_time;
                time < before || (time == before && idx < successor)
            })
            .max_by(|&a, &b| {
                self.requests[a]
                    .timing
                    .request_time
                    .total_cmp(&self.requests[b].timing.request_time)
                    .then(a.cmp(&b))
            })
    }

    /// Find the request that caused `successor`, if it is part of the trace.
    ///
    /// A parser initiator without a URL falls back to the document that
    /// issued the request.
    fn find_initiating_request(&self, successor: usize) -> Option<usize> {
        let request = &self.requests[successor];
        let initiator = &request.initiator;

        if let Some(request_id) = &initiator.request_id {
            return self.by_id.get(request_id.as_str()).copied();
        }

        match initiator.initiator_type {
            InitiatorType::Script => initiator
                .stack_urls
                .iter()
                .chain(initiator.url.iter())
                .find_map(|url| self.resolve_url(url, successor)),
            InitiatorType::Parser => initiator
                .url
                .as_deref()
                .or(request.document_url.as_deref())
                .and_then(|url| self.resolve_url(url, successor)),
            InitiatorType::Redirect => initiator
                .url
                .as_deref()
                .and_then(|url| self.resolve_url(url, successor)),
            InitiatorType::Other => None,
        }
    }
}

/// Emit A -> B for every request B whose initiator resolves to request A.
///
/// References to requests outside the trace are dropped, as are
/// self-references.
pub(super) fn initiator_edges(requests: &[Request], config: &LensConfig) -> Vec<DependencyEdge> {
    let lookup = RequestLookup::new(requests);
    let mut edges = Vec::new();

    for (idx, request) in requests.iter().enumerate() {
        let reason = match request.initiator.initiator_type {
            InitiatorType::Parser if config.infer_parser => EdgeReason::Parser,
            InitiatorType::Script if config.infer_script => EdgeReason::Script,
            InitiatorType::Redirect if config.infer_redirects => EdgeReason::Redirect,
            _ => continue,
        };

        let Some(predecessor) = lookup.find_initiating_request(idx) else {
            log_checks!(
                config.verbosity,
                "[lens] dropping {:?} initiator of {}: cause not in trace",
                request.initiator.initiator_type,
                request.request_id
            );
            continue;
        };
        if predecessor == idx {
            log_checks!(
                config.verbosity,
                "[lens] dropping self-referencing initiator of {}",
                request.request_id
            );
            continue;
        }

        edges.push(DependencyEdge::new(
            requests[predecessor].request_id.as_str(),
            request.request_id.as_str(),
            reason,
        ));
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Initiator;
    use crate::testing::make_request;

    const DOC: &str = "http://bla.com/index.html";

    fn infer(requests: Vec<crate::models::RequestBuilder>) -> Vec<DependencyEdge> {
        let requests: Vec<Request> = requests.into_iter().map(|b| b.build().unwrap()).collect();
        initiator_edges(&requests, &LensConfig::default())
    }

    #[test]
    fn test_parser_initiator_by_url() {
        let edges = infer(vec![
            make_request("doc", DOC, 0.0, 5.0),
            make_request("css", "http://bla.com/a.css", 1.0, 6.0)
                .initiator(Initiator::parser(DOC)),
        ]);
        assert_eq!(edges, vec![DependencyEdge::new("doc", "css", EdgeReason::Parser)]);
    }

    #[test]
    fn test_parser_picks_latest_earlier_request_for_url() {
        // Document fetched twice; the second fetch precedes the dependent
        let edges = infer(vec![
            make_request("doc.a", DOC, 0.0, 1.0),
            make_request("doc.b", DOC, 2.0, 3.0),
            make_request("img", "http://bla.com/i.png", 4.0, 5.0)
                .initiator(Initiator::parser(DOC)),
            make_request("doc.c", DOC, 9.0, 10.0),
        ]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].predecessor_id, "doc.b");
    }

    #[test]
    fn test_equal_request_times_resolve_to_earlier_input() {
        // Same URL fetched twice at the same instant, each naming the URL as
        // its script initiator
        let edges = infer(vec![
            make_request("a", "http://x/app.js", 5.0, 6.0)
                .initiator(Initiator::script(["http://x/app.js"])),
            make_request("b", "http://x/app.js", 5.0, 6.0)
                .initiator(Initiator::script(["http://x/app.js"])),
        ]);
        assert_eq!(edges, vec![DependencyEdge::new("a", "b", EdgeReason::Script)]);
    }

    #[test]
    fn test_parser_without_url_uses_document_url() {
        let mut initiator = Initiator::parser(DOC);
        initiator.url = None;
        let edges = infer(vec![
            make_request("doc", DOC, 0.0, 5.0),
            make_request("img", "http://bla.com/i.png", 1.0, 6.0)
                .document_url(DOC)
                .initiator(initiator.clone()),
            make_request("orphan", "http://bla.com/j.png", 1.0, 6.0).initiator(initiator),
        ]);
        assert_eq!(edges, vec![DependencyEdge::new("doc", "img", EdgeReason::Parser)]);
    }

    #[test]
    fn test_script_initiator_uses_first_resolvable_frame() {
        let edges = infer(vec![
            make_request("lib", "http://bla.com/lib.js", 0.0, 1.0),
            make_request("xhr", "http://bla.com/data.json", 2.0, 3.0).initiator(
                Initiator::script(["http://elsewhere.com/inline.js", "http://bla.com/lib.js"]),
            ),
        ]);
        assert_eq!(edges, vec![DependencyEdge::new("lib", "xhr", EdgeReason::Script)]);
    }

    #[test]
    fn test_script_initiator_falls_back_to_url() {
        let edges = infer(vec![
            make_request("lib", "http://bla.com/lib.js", 0.0, 1.0),
            make_request("xhr", "http://bla.com/data.json", 2.0, 3.0)
                .initiator(Initiator::script(Vec::<String>::new()).with_url("http://bla.com/lib.js")),
        ]);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].predecessor_id, "lib");
    }

    #[test]
    fn test_request_id_reference() {
        let edges = infer(vec![
            make_request("a", "http://bla.com/a", 0.0, 1.0),
            make_request("b", "http://bla.com/b", 1.0, 2.0)
                .initiator(Initiator::parser("http://unrelated/").with_request_id("a")),
        ]);
        assert_eq!(edges, vec![DependencyEdge::new("a", "b", EdgeReason::Parser)]);
    }

    #[test]
    fn test_dangling_references_dropped() {
        let edges = infer(vec![
            make_request("a", "http://bla.com/a", 0.0, 1.0)
                .initiator(Initiator::redirect("not-in-trace")),
            make_request("b", "http://bla.com/b", 1.0, 2.0)
                .initiator(Initiator::parser("http://bla.com/missing.html")),
            make_request("c", "http://bla.com/c", 1.0, 2.0)
                .initiator(Initiator::script(["http://bla.com/missing.js"])),
        ]);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_later_request_is_not_a_cause() {
        let edges = infer(vec![
            make_request("img", "http://bla.com/i.png", 0.0, 1.0)
                .initiator(Initiator::parser(DOC)),
            make_request("doc", DOC, 5.0, 6.0),
        ]);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_self_reference_dropped() {
        let edges = infer(vec![
            make_request("a", DOC, 0.0, 1.0).initiator(Initiator::parser(DOC)),
            make_request("b", "http://bla.com/b", 0.0, 1.0)
                .initiator(Initiator::other().with_request_id("b")),
            make_request("c", "http://bla.com/c", 0.0, 1.0)
                .initiator(Initiator::redirect("c")),
        ]);
        assert!(edges.is_empty());
    }

    #[test]
    fn test_other_initiator_ignored() {
        let edges = infer(vec![
            make_request("a", DOC, 0.0, 1.0),
            make_request("b", "http://bla.com/b", 1.0, 2.0)
                .initiator(Initiator::other().with_url(DOC)),
        ]);
        assert!(edges.is_empty());
    }
}
