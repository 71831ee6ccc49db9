// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Target view resolution and per-view singleton interning.
use docgraph_core::{NodeId, Store, StoreError, ViewId};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Target-side handles of one view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewTarget {
    /// Target view.
    pub view: ViewId,
    /// Its payload node.
    pub payload: NodeId,
    /// Its root annotation.
    pub root: NodeId,
}

/// Gets or creates target views by name and interns their payload and root.
///
/// At most one rename pair is active, and only while the `copy_view_as` call
/// that set it runs. Views discovered through references keep their source
/// name.
#[derive(Debug, Default)]
pub struct ViewResolver {
    rename: Option<(String, String)>,
    targets: FxHashMap<String, ViewTarget>,
}

impl ViewResolver {
    /// Makes `source → target` the active rename pair; identical names clear it.
    pub fn set_rename(&mut self, source: &str, target: &str) {
        self.rename = (source != target).then(|| (source.to_owned(), target.to_owned()));
    }

    /// Deactivates the rename pair, if any.
    pub fn clear_rename(&mut self) {
        self.rename = None;
    }

    /// Target view name for a source view name.
    pub fn target_name<'n>(&'n self, source: &'n str) -> &'n str {
        match &self.rename {
            Some((from, to)) if from == source => to,
            _ => source,
        }
    }

    /// Returns the target view for source view `source`, creating it in
    /// `dst` if it does not exist yet.
    pub fn resolve(&mut self, dst: &mut Store, source: &str) -> Result<ViewTarget, StoreError> {
        let name = self.target_name(source).to_owned();
        if let Some(t) = self.targets.get(&name) {
            return Ok(*t);
        }
        let existed = dst.view_by_name(&name).is_some();
        let view = dst.view_or_create(&name)?;
        let v = dst.view(view)?;
        let target = ViewTarget {
            view,
            payload: v.payload_node(),
            root: v.root(),
        };
        if !existed {
            debug!(view = %name, source_view = source, "created target view");
        }
        self.targets.insert(name, target);
        Ok(target)
    }
}
