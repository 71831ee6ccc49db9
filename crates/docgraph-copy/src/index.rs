// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-copier index membership tracking.
use docgraph_core::{NodeId, ViewId};
use rustc_hash::FxHashSet;

/// Remembers which source nodes have been published in which target view.
///
/// Shared across every view a copier processes, so a node reachable from
/// several index entries, or from several source views, is indexed at most
/// once per target view.
#[derive(Debug, Default)]
pub struct IndexTracker {
    seen: FxHashSet<(ViewId, NodeId)>,
}

impl IndexTracker {
    /// Claims `(view, source)`. Returns `true` the first time only.
    pub fn claim(&mut self, view: ViewId, source: NodeId) -> bool {
        self.seen.insert((view, source))
    }

    /// Returns `true` when `(view, source)` has been claimed.
    pub fn is_claimed(&self, view: ViewId, source: NodeId) -> bool {
        self.seen.contains(&(view, source))
    }

    /// Number of claims.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Returns `true` when nothing has been claimed.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_are_per_view() {
        let mut t = IndexTracker::default();
        assert!(t.claim(ViewId(0), NodeId(5)));
        assert!(!t.claim(ViewId(0), NodeId(5)));
        assert!(t.claim(ViewId(1), NodeId(5)));
        assert!(t.is_claimed(ViewId(1), NodeId(5)));
        assert_eq!(t.len(), 2);
    }
}
