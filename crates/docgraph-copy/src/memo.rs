// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Copy memo and deferred work queue.
use docgraph_core::NodeId;
use rustc_hash::FxHashMap;

/// Dedup map from source node to its target copy.
///
/// Entries are inserted when the target node is *allocated*, before any of
/// its fields are filled, so a cycle that reaches the node again resolves to
/// the same target id.
///
/// Entries made since the last [`CopyMemo::commit`] are provisional: a failed
/// fill calls [`CopyMemo::rollback`] so half-filled targets are never reused.
#[derive(Debug, Default)]
pub struct CopyMemo {
    map: FxHashMap<NodeId, NodeId>,
    fresh: Vec<NodeId>,
}

impl CopyMemo {
    /// Target copy of `source`, if one was allocated.
    pub fn get(&self, source: NodeId) -> Option<NodeId> {
        self.map.get(&source).copied()
    }

    /// Records `source → target`. Returns the previous target, which is
    /// always `None` when the copier is used correctly.
    pub fn insert(&mut self, source: NodeId, target: NodeId) -> Option<NodeId> {
        self.fresh.push(source);
        self.map.insert(source, target)
    }

    /// Forgets `source`, returning its target if it had one.
    pub fn remove(&mut self, source: NodeId) -> Option<NodeId> {
        self.map.remove(&source)
    }

    /// Makes every provisional entry permanent.
    pub fn commit(&mut self) {
        self.fresh.clear();
    }

    /// Drops every entry made since the last commit. Returns how many were
    /// dropped.
    pub fn rollback(&mut self) -> usize {
        let dropped = self.fresh.len();
        for source in self.fresh.drain(..) {
            self.map.remove(&source);
        }
        dropped
    }

    /// Returns `true` when `source` has a target copy.
    pub fn contains(&self, source: NodeId) -> bool {
        self.map.contains_key(&source)
    }

    /// Number of memoized nodes.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` when nothing has been memoized.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Pending population of an already allocated target node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fill {
    /// Copy the fields of record `source` into record `target`.
    Fields {
        /// Target record.
        target: NodeId,
        /// Source record.
        source: NodeId,
    },
    /// Copy the slots of reference array `source` into array `target`.
    Elements {
        /// Target array.
        target: NodeId,
        /// Source array.
        source: NodeId,
    },
}

/// LIFO stack of pending [`Fill`]s.
///
/// Replaces recursion: host stack usage stays constant no matter how deep
/// the source graph is.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: Vec<Fill>,
    high_water: usize,
}

impl WorkQueue {
    /// Schedules `fill`.
    pub fn push(&mut self, fill: Fill) {
        self.pending.push(fill);
        self.high_water = self.high_water.max(self.pending.len());
    }

    /// Takes the next fill, if any.
    pub fn pop(&mut self) -> Option<Fill> {
        self.pending.pop()
    }

    /// Discards every pending fill.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Number of pending fills.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns `true` when nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Largest number of fills that were pending at once.
    pub fn high_water(&self) -> usize {
        self.high_water
    }
}
