// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Node record types: typed records, arrays and view payloads.

use crate::ident::{TypeId, ViewId};
use crate::value::{ArrayData, ElementKind, Value};

/// Materialised node stored in a [`Store`](crate::Store) arena slot.
///
/// Invariants
/// - `Record::values` has exactly one entry per field of `ty`, in handle order.
/// - Every `Value::Ref` inside a record, and every `Some` slot of a reference
///   array, names a node that exists in the same store.
/// - A `Payload` node is owned by exactly one view and is never indexed.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeRecord {
    /// Ordinary typed record (annotations, the view root, free-standing data).
    Record {
        /// Declared type.
        ty: TypeId,
        /// Field values in handle order.
        values: Vec<Value>,
    },
    /// Homogeneous array node.
    Array(ArrayData),
    /// Payload node of the given view.
    Payload(ViewId),
}

impl NodeRecord {
    /// Structural kind of this node.
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Record { ty, .. } => NodeKind::Record(*ty),
            Self::Array(data) => NodeKind::Array(data.kind()),
            Self::Payload(view) => NodeKind::Payload(*view),
        }
    }
}

/// Lightweight classification of a node, without its contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Typed record.
    Record(TypeId),
    /// Array with the given element kind.
    Array(ElementKind),
    /// Payload of the given view.
    Payload(ViewId),
}
