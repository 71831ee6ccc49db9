// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Named views: payload, root annotation and index of one document partition.
use std::collections::BTreeSet;

use bytes::Bytes;

use crate::ident::NodeId;

/// Name of the view every store starts with.
pub const DEFAULT_VIEW: &str = "_InitialView";

/// Subject data a view's annotations are positioned over.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PayloadData {
    /// Inline text; offsets count `char`s.
    Text(String),
    /// Inline binary data.
    Bytes(Bytes),
    /// Reference to externally stored data.
    Uri(String),
}

impl PayloadData {
    /// Extent of the payload in offset units, when it is text.
    pub fn text_extent(&self) -> Option<usize> {
        match self {
            Self::Text(s) => Some(s.chars().count()),
            Self::Bytes(_) | Self::Uri(_) => None,
        }
    }
}

/// One named partition of a store.
///
/// Invariants
/// - `payload` is a `NodeRecord::Payload` naming this view.
/// - `root` is a record of the schema's root type and is always in `index`.
#[derive(Clone, Debug)]
pub struct View {
    pub(crate) name: String,
    pub(crate) payload: NodeId,
    pub(crate) root: NodeId,
    pub(crate) data: Option<PayloadData>,
    pub(crate) media_type: Option<String>,
    pub(crate) index: BTreeSet<NodeId>,
}

impl View {
    /// View name, unique within its store.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The view's payload node.
    pub fn payload_node(&self) -> NodeId {
        self.payload
    }

    /// The view's root annotation.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Payload data, if set.
    pub fn data(&self) -> Option<&PayloadData> {
        self.data.as_ref()
    }

    /// Media type of the payload, if set.
    pub fn media_type(&self) -> Option<&str> {
        self.media_type.as_deref()
    }

    /// Returns `true` when `node` is published in this view.
    pub fn is_indexed(&self, node: NodeId) -> bool {
        self.index.contains(&node)
    }

    /// Number of published nodes, root included.
    pub fn index_len(&self) -> usize {
        self.index.len()
    }
}
