//! Redirect chain inference.

use rustc_hash::FxHashMap;

use crate::log_debug;
use crate::models::Request;

use super::{DependencyEdge, EdgeReason};

/// Chain the hops of every redirect: hop1 -> hop2 -> ... -> final request.
///
/// Hops are grouped by `logical_id` and ordered by `request_time`, with ties
/// kept in input order. Chains are emitted in order of first appearance.
pub(super) fn redirect_edges(requests: &[Request], verbosity: u8) -> Vec<DependencyEdge> {
    let mut chains: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    let mut chain_order: Vec<&str> = Vec::new();

    for (idx, request) in requests.iter().enumerate() {
        let logical_id = request.logical_id.as_str();
        chains
            .entry(logical_id)
            .or_insert_with(|| {
                chain_order.push(logical_id);
                Vec::new()
            })
            .push(idx);
    }

    let mut edges = Vec::new();
    for logical_id in chain_order {
        let Some(hops) = chains.get_mut(logical_id) else {
            continue;
        };
        if hops.len() < 2 {
            continue;
        }
        // Stable sort keeps input order for equal request times
        hops.sort_by(|&a, &b| {
            requests[a]
                .timing
                .request_time
                .total_cmp(&requests[b].timing.request_time)
        });
        log_debug!(verbosity, "[lens] redirect chain {} has {} hops", logical_id, hops.len());

        for pair in hops.windows(2) {
            edges.push(DependencyEdge::new(
                requests[pair[0]].request_id.as_str(),
                requests[pair[1]].request_id.as_str(),
                EdgeReason::Redirect,
            ));
        }
    }
    edges
}
