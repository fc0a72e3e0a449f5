//! Request id interning.
//!
//! Maps request id strings to dense node indices so the graph passes can use
//! plain vector indexing.

use rustc_hash::FxHashMap;

/// Dense node index assigned in request input order.
pub type NodeId = u32;

/// Two-way mapping between request ids and node indices.
#[derive(Debug, Clone)]
pub struct RequestIdInterner {
    to_int: FxHashMap<String, NodeId>,
    from_int: Vec<String>,
}

impl RequestIdInterner {
    /// Empty interner sized for `capacity` ids.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_int: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_int: Vec::with_capacity(capacity),
        }
    }

    /// Intern a fresh id. Returns `None` if the id was already interned.
    pub fn insert(&mut self, s: &str) -> Option<NodeId> {
        if self.to_int.contains_key(s) {
            return None;
        }
        let id = self.from_int.len() as NodeId;
        self.from_int.push(s.to_string());
        self.to_int.insert(s.to_string(), id);
        Some(id)
    }

    /// Node index of an interned id.
    #[inline]
    pub fn get(&self, s: &str) -> Option<NodeId> {
        self.to_int.get(s).copied()
    }

    /// Request id of a node index.
    #[inline]
    pub fn resolve(&self, id: NodeId) -> Option<&str> {
        self.from_int.get(id as usize).map(|s| s.as_str())
    }

    /// Number of interned ids.
    pub fn len(&self) -> usize {
        self.from_int.len()
    }

    /// True before the first insert.
    pub fn is_empty(&self) -> bool {
        self.from_int.is_empty()
    }
}

impl Default for RequestIdInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
