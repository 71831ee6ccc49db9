// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Deep copy of annotation-document graphs between stores.
//!
//! A copy walks every node reachable from a source view's index and
//! reproduces it in a target store, which may use a different (but
//! compatible) schema. Shared references and cycles are preserved: each
//! source node maps to exactly one target node. Each view's payload and root
//! annotation are singletons and are merged into the target's rather than
//! duplicated.
//!
//! ```
//! use docgraph_copy::{GraphCopier, CopyOptions};
//! use docgraph_core::{Schema, Store};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::builder().build()?;
//! let src = Store::new(schema);
//! let mut dst = src.empty_like();
//! let mut copier = GraphCopier::new(&src, &mut dst, CopyOptions::default())?;
//! copier.copy_store()?;
//! assert_eq!(copier.stats().nodes, 0);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]

mod compat;
mod copier;
mod error;
mod index;
mod memo;
mod views;

use docgraph_core::Store;

pub use compat::{CompatResolver, FieldPlan, TypePlan, ValueKind};
pub use copier::{CopyOptions, CopyStats, GraphCopier};
pub use error::CopyError;
pub use index::IndexTracker;
pub use memo::{CopyMemo, Fill, WorkQueue};
pub use views::{ViewResolver, ViewTarget};

/// Copies every view of `src` into `dst`.
///
/// With `lenient`, source types and fields the target schema lacks are
/// skipped; range mismatches still fail.
///
/// `dst` must not be a clone of `src`: see [`GraphCopier::new`].
pub fn copy_store(
    src: &Store,
    dst: &mut Store,
    copy_payload: bool,
    lenient: bool,
) -> Result<(), CopyError> {
    let options = CopyOptions::default()
        .with_copy_payload(copy_payload)
        .with_lenient(lenient);
    GraphCopier::new(src, dst, options)?.copy_store()
}

/// Copies source view `src_view` into target view `dst_view` in strict mode.
///
/// `dst` must not be a clone of `src`: see [`GraphCopier::new`].
pub fn copy_view(
    src: &Store,
    src_view: &str,
    dst: &mut Store,
    dst_view: &str,
    copy_payload: bool,
) -> Result<(), CopyError> {
    let options = CopyOptions::default().with_copy_payload(copy_payload);
    GraphCopier::new(src, dst, options)?.copy_view_as(src_view, dst_view)
}
