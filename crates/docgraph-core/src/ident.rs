// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Identifier and hashing utilities.
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use blake3::Hasher;

/// Canonical 256-bit hash used for schema digests.
pub type Hash = [u8; 32];

/// Strongly typed identifier for a node inside one [`Store`](crate::Store).
///
/// `NodeId` is an arena index. It is only meaningful together with the store
/// that allocated it; ids from two different stores must never be compared.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the arena slot backing this id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Identifier for a named view inside one store.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewId(pub u32);

impl ViewId {
    /// Returns the slot backing this id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for a declared type inside one [`Schema`](crate::Schema).
///
/// Type ids are positional; two schema instances may assign different ids to
/// the same type name. Cross-schema mapping must go through names.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeId(pub u32);

impl TypeId {
    /// Returns the slot backing this id.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Positional handle for a field within its declaring type.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldHandle(pub u32);

impl FieldHandle {
    /// Returns the slot backing this handle.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Process-unique identity of a store lineage.
///
/// A fresh id is drawn for every [`Store::new`](crate::Store::new); cloning a
/// store keeps the id because the clone's node ids alias the original's.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct StoreId(pub u64);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store#{}", self.0)
    }
}

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) fn next_store_id() -> StoreId {
    StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
}

/// Streaming, domain-separated BLAKE3 digest builder.
///
/// Every chunk is length-prefixed (8-byte LE) so that adjacent strings cannot
/// collide by concatenation.
pub(crate) struct DigestBuilder {
    hasher: Hasher,
}

impl DigestBuilder {
    pub(crate) fn new(domain: &[u8]) -> Self {
        let mut hasher = Hasher::new();
        hasher.update(domain);
        Self { hasher }
    }

    pub(crate) fn tag(&mut self, tag: u8) -> &mut Self {
        self.hasher.update(&[tag]);
        self
    }

    pub(crate) fn str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(&(s.len() as u64).to_le_bytes());
        self.hasher.update(s.as_bytes());
        self
    }

    pub(crate) fn count(&mut self, n: usize) -> &mut Self {
        self.hasher.update(&(n as u64).to_le_bytes());
        self
    }

    pub(crate) fn finish(&self) -> Hash {
        self.hasher.finalize().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_ids_are_unique() {
        let a = next_store_id();
        let b = next_store_id();
        assert_ne!(a, b);
    }

    #[test]
    fn length_prefix_prevents_concatenation_collisions() {
        let mut ab = DigestBuilder::new(b"test:");
        ab.str("ab").str("c");
        let mut a_bc = DigestBuilder::new(b"test:");
        a_bc.str("a").str("bc");
        assert_ne!(ab.finish(), a_bc.finish());
    }

    #[test]
    fn domain_separation_changes_digest() {
        let mut x = DigestBuilder::new(b"schema:");
        x.str("Token");
        let mut y = DigestBuilder::new(b"type:");
        y.str("Token");
        assert_ne!(x.finish(), y.finish());
    }
}
