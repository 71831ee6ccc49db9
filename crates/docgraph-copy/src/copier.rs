// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Graph copier: copy-now/fill-later traversal over a source store.
//!
//! `copy` allocates a target node (or resolves a view singleton) without
//! touching fields, memoizes it, and schedules a [`Fill`]. `drain` pops fills
//! until none remain; reference fields found while filling call `copy` again,
//! which at most allocates and schedules. The host stack therefore never
//! grows with graph depth, and cycles resolve through the memo.
use std::sync::Arc;

use docgraph_core::{
    ArrayData, ElementKind, FieldRole, NodeId, NodeKind, NodeRecord, Store, StoreError, Value,
    ViewId,
};
use rustc_hash::FxHashSet;
use tracing::{debug, info, instrument};

use crate::compat::{CompatResolver, ValueKind};
use crate::error::CopyError;
use crate::index::IndexTracker;
use crate::memo::{CopyMemo, Fill, WorkQueue};
use crate::views::{ViewResolver, ViewTarget};

/// Options fixed for the lifetime of one [`GraphCopier`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyOptions {
    /// Skip types and fields the target schema lacks instead of failing.
    pub lenient: bool,
    /// Transfer payload data and media type when copying a view.
    pub copy_payload: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self {
            lenient: false,
            copy_payload: true,
        }
    }
}

impl CopyOptions {
    /// Sets [`CopyOptions::lenient`].
    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Sets [`CopyOptions::copy_payload`].
    pub fn with_copy_payload(mut self, copy_payload: bool) -> Self {
        self.copy_payload = copy_payload;
        self
    }
}

/// Counters accumulated by one copier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CopyStats {
    /// Records allocated in the target.
    pub nodes: usize,
    /// Arrays allocated in the target.
    pub arrays: usize,
    /// Source roots merged into target roots.
    pub roots_merged: usize,
    /// Target index insertions.
    pub indexed: usize,
    /// Source nodes skipped because their type is missing (lenient only).
    pub skipped: usize,
    /// Largest number of pending fills at any point.
    pub max_pending: usize,
}

/// Deep copier from one store into another.
///
/// One instance is one logical operation: its memo, work queue, view cache
/// and index tracker persist across calls, so repeated calls extend the same
/// deduplication. The target stays mutably borrowed for the copier's life.
///
/// A failed [`GraphCopier::copy_node`] discards its pending fills and forgets
/// the nodes it allocated. Those target nodes stay in the store but are never
/// indexed, and a later call copies their sources afresh.
#[derive(Debug)]
pub struct GraphCopier<'s, 'd> {
    src: &'s Store,
    dst: &'d mut Store,
    options: CopyOptions,
    resolver: CompatResolver,
    memo: CopyMemo,
    queue: WorkQueue,
    views: ViewResolver,
    indexed: IndexTracker,
    merged_roots: FxHashSet<(NodeId, NodeId)>,
    fresh_roots: Vec<(NodeId, NodeId)>,
    stats: CopyStats,
}

impl<'s, 'd> GraphCopier<'s, 'd> {
    /// Creates a copier from `src` into `dst`.
    ///
    /// Fails with [`CopyError::InvalidCrossCopy`] when both belong to the same
    /// store lineage; nothing is mutated in that case. A [`Store::clone`] keeps
    /// its source's [`docgraph_core::StoreId`], so a clone is refused as a
    /// target even though its graph is independent. Copy into
    /// [`Store::empty_like`] instead.
    pub fn new(src: &'s Store, dst: &'d mut Store, options: CopyOptions) -> Result<Self, CopyError> {
        if src.id() == dst.id() {
            return Err(CopyError::InvalidCrossCopy { store: src.id() });
        }
        let resolver = CompatResolver::new(
            Arc::clone(src.schema()),
            Arc::clone(dst.schema()),
            options.lenient,
        );
        Ok(Self {
            src,
            dst,
            options,
            resolver,
            memo: CopyMemo::default(),
            queue: WorkQueue::default(),
            views: ViewResolver::default(),
            indexed: IndexTracker::default(),
            merged_roots: FxHashSet::default(),
            fresh_roots: Vec::new(),
            stats: CopyStats::default(),
        })
    }

    /// Options this copier was built with.
    pub fn options(&self) -> CopyOptions {
        self.options
    }

    /// Read access to the target store.
    pub fn target(&self) -> &Store {
        &*self.dst
    }

    /// Counters so far.
    pub fn stats(&self) -> CopyStats {
        CopyStats {
            max_pending: self.queue.high_water(),
            ..self.stats
        }
    }

    /// Returns `true` when `node` already has a memoized target copy.
    ///
    /// Payloads and view roots are resolved, never memoized, and always
    /// report `false`.
    pub fn already_copied(&self, node: NodeId) -> bool {
        self.memo.contains(node)
    }

    /// Memoized target copy of `node`, if any.
    pub fn copy_of(&self, node: NodeId) -> Option<NodeId> {
        self.memo.get(node)
    }

    /// Copies every view of the source into a same-named target view.
    #[instrument(skip(self), fields(source = %self.src.id(), target = %self.dst.id()))]
    pub fn copy_store(&mut self) -> Result<(), CopyError> {
        let src = self.src;
        for (_, view) in src.views() {
            self.copy_view_as(view.name(), view.name())?;
        }
        let stats = self.stats();
        info!(
            nodes = stats.nodes,
            arrays = stats.arrays,
            indexed = stats.indexed,
            skipped = stats.skipped,
            max_pending = stats.max_pending,
            "store copy complete"
        );
        Ok(())
    }

    /// Copies source view `view` into the target view of the same name.
    pub fn copy_view(&mut self, view: &str) -> Result<(), CopyError> {
        self.copy_view_as(view, view)
    }

    /// Copies source view `source_view` into target view `target_view`.
    ///
    /// The rename applies to this view pair only, and only for the duration of
    /// the call: other views reached through references, and later calls,
    /// use source names.
    #[instrument(skip(self))]
    pub fn copy_view_as(&mut self, source_view: &str, target_view: &str) -> Result<(), CopyError> {
        let view = self
            .src
            .view_by_name(source_view)
            .ok_or_else(|| CopyError::UnknownView {
                name: source_view.to_owned(),
            })?;
        self.views.set_rename(source_view, target_view);
        let result = self.copy_renamed_view(view, source_view, target_view);
        self.views.clear_rename();
        result
    }

    fn copy_renamed_view(
        &mut self,
        view: ViewId,
        source_view: &str,
        target_view: &str,
    ) -> Result<(), CopyError> {
        let src = self.src;
        let target = self.views.resolve(self.dst, source_view)?;
        if self.options.copy_payload {
            self.copy_payload_data(view, target)?;
        }

        for node in src.indexed(view)? {
            let Some(copy) = self.copy_node(node)? else {
                continue;
            };
            if copy == target.root {
                continue;
            }
            if self.indexed.claim(target.view, node) && self.dst.add_to_index(target.view, copy)? {
                self.stats.indexed += 1;
            }
            self.backfill_owning_view(copy, target)?;
        }
        let published = self.dst.view(target.view)?.index_len();
        debug!(source_view, target_view, published, "view copy complete");
        Ok(())
    }

    /// Copies `node` and everything reachable from it.
    ///
    /// Returns `None` when lenient mode skipped the node because its type is
    /// missing from the target schema.
    pub fn copy_node(&mut self, node: NodeId) -> Result<Option<NodeId>, CopyError> {
        let result = self.copy(node).and_then(|copy| {
            self.drain()?;
            Ok(copy)
        });
        match result {
            Ok(_) => {
                self.memo.commit();
                self.fresh_roots.clear();
            }
            Err(ref err) => self.rollback(node, err),
        }
        result
    }

    fn rollback(&mut self, node: NodeId, err: &CopyError) {
        self.queue.clear();
        let forgotten = self.memo.rollback();
        for key in self.fresh_roots.drain(..) {
            self.merged_roots.remove(&key);
        }
        debug!(%node, forgotten, error = %err, "copy failed; pending fills discarded");
    }

    fn copy(&mut self, node: NodeId) -> Result<Option<NodeId>, CopyError> {
        if let Some(copy) = self.memo.get(node) {
            return Ok(Some(copy));
        }
        let src = self.src;
        match src.kind(node)? {
            NodeKind::Payload(view) => {
                let name = src.view(view)?.name();
                Ok(Some(self.views.resolve(self.dst, name)?.payload))
            }
            NodeKind::Record(_) if src.root_owner(node).is_some() => {
                self.merge_root(node).map(Some)
            }
            NodeKind::Record(ty) => {
                let Some(plan) = self.resolver.resolve(ty)? else {
                    self.stats.skipped += 1;
                    return Ok(None);
                };
                let target = self.dst.create_node(plan.target())?;
                self.memo.insert(node, target);
                self.queue.push(Fill::Fields {
                    target,
                    source: node,
                });
                self.stats.nodes += 1;
                Ok(Some(target))
            }
            NodeKind::Array(_) => self.copy_array(node).map(Some),
        }
    }

    fn merge_root(&mut self, node: NodeId) -> Result<NodeId, CopyError> {
        let src = self.src;
        let view = src
            .root_owner(node)
            .ok_or(StoreError::NotARecord(node))?;
        let name = src.view(view)?.name();
        let target = self.views.resolve(self.dst, name)?;
        let key = (node, target.root);
        if self.merged_roots.insert(key) {
            self.fresh_roots.push(key);
            self.queue.push(Fill::Fields {
                target: target.root,
                source: node,
            });
            self.stats.roots_merged += 1;
        }
        Ok(target.root)
    }

    fn copy_array(&mut self, node: NodeId) -> Result<NodeId, CopyError> {
        let src = self.src;
        let target = match src.array(node)? {
            ArrayData::Ref(slots) => {
                let target = self.dst.create_array(ElementKind::Ref, slots.len())?;
                self.queue.push(Fill::Elements {
                    target,
                    source: node,
                });
                target
            }
            data => self.dst.insert_array(data.clone())?,
        };
        self.memo.insert(node, target);
        self.stats.arrays += 1;
        Ok(target)
    }

    fn drain(&mut self) -> Result<(), CopyError> {
        while let Some(fill) = self.queue.pop() {
            match fill {
                Fill::Fields { target, source } => self.fill_fields(target, source)?,
                Fill::Elements { target, source } => self.fill_elements(target, source)?,
            }
        }
        Ok(())
    }

    fn fill_fields(&mut self, target: NodeId, source: NodeId) -> Result<(), CopyError> {
        let src = self.src;
        let NodeRecord::Record { ty, values } = src.node(source)? else {
            return Err(StoreError::NotARecord(source).into());
        };
        let Some(plan) = self.resolver.resolve(*ty)? else {
            return Ok(());
        };
        for (field, fp) in plan.fields() {
            let Some(value) = values.get(field.index()) else {
                continue;
            };
            let copied = match (fp.kind, value) {
                // Nulls are never written so a root merge keeps target values.
                (_, Value::Null) => continue,
                (ValueKind::Reference, Value::Ref(r)) => match self.copy(*r)? {
                    Some(t) => Value::Ref(t),
                    None => continue,
                },
                (_, v) => v.clone(),
            };
            self.dst.set(target, fp.target, copied)?;
        }
        Ok(())
    }

    fn fill_elements(&mut self, target: NodeId, source: NodeId) -> Result<(), CopyError> {
        let src = self.src;
        let ArrayData::Ref(slots) = src.array(source)? else {
            return Ok(());
        };
        for (index, slot) in slots.iter().enumerate() {
            let Some(r) = slot else {
                continue;
            };
            if let Some(t) = self.copy(*r)? {
                self.dst.set_ref_element(target, index, Some(t))?;
            }
        }
        Ok(())
    }

    fn copy_payload_data(&mut self, view: ViewId, target: ViewTarget) -> Result<(), CopyError> {
        let source = self.src.view(view)?;
        let Some(data) = source.data() else {
            return Ok(());
        };
        let existing = self.dst.view(target.view)?;
        match existing.data() {
            Some(d) if d == data && existing.media_type() == source.media_type() => return Ok(()),
            Some(_) => {
                return Err(CopyError::PayloadAlreadySet {
                    view: existing.name().to_owned(),
                })
            }
            None => {}
        }
        self.dst.set_payload(
            target.view,
            data.clone(),
            source.media_type().map(str::to_owned),
        )?;
        Ok(())
    }

    fn backfill_owning_view(&mut self, node: NodeId, target: ViewTarget) -> Result<(), CopyError> {
        let def = self.dst.type_of(node)?;
        let Some(field) = def.role_field(FieldRole::OwningView) else {
            return Ok(());
        };
        if matches!(self.dst.get(node, field)?, Value::Null) {
            self.dst.set(node, field, Value::Ref(target.payload))?;
        }
        Ok(())
    }
}
