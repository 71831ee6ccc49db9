// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! docgraph-core: typed annotation-document store.
//!
//! A [`Store`] holds one node arena over one shared [`Schema`] and any number
//! of named [`View`]s. Each view owns a payload node (the text or bytes its
//! annotations are positioned over), a root annotation spanning the payload,
//! and an index of published nodes.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![allow(clippy::module_name_repetitions)]

mod ident;
mod record;
mod schema;
mod store;
mod value;
mod view;

/// Identifier types for nodes, views, types, fields and store lineages.
pub use ident::{FieldHandle, Hash, NodeId, StoreId, TypeId, ViewId};
/// Node record types.
pub use record::{NodeKind, NodeRecord};
/// Schema registry.
pub use schema::{
    FieldDef, FieldRole, Range, Schema, SchemaBuilder, SchemaError, TypeDef, PAYLOAD_TYPE,
    ROOT_TYPE,
};
/// Arena-backed store and its errors.
pub use store::{Store, StoreError};
/// Field values and array storage.
pub use value::{ArrayData, ElementKind, Value};
/// Views and payload data.
pub use view::{PayloadData, View, DEFAULT_VIEW};
