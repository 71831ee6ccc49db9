// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use docgraph_core::{NodeId, NodeKind, Store, Value};

/// Every node id in arena order.
pub fn all_nodes(store: &Store) -> impl Iterator<Item = NodeId> + '_ {
    (0..store.node_count()).filter_map(|i| u32::try_from(i).ok().map(NodeId))
}

/// Number of records of type `ty` in `store`.
pub fn count_records(store: &Store, ty: &str) -> usize {
    let Some(ty) = store.schema().type_by_name(ty) else {
        return 0;
    };
    all_nodes(store)
        .filter(|&n| store.kind(n).ok() == Some(NodeKind::Record(ty)))
        .count()
}

/// Number of array nodes in `store`.
pub fn count_arrays(store: &Store) -> usize {
    all_nodes(store)
        .filter(|&n| matches!(store.kind(n), Ok(NodeKind::Array(_))))
        .count()
}

/// Reference held in `field` of `node`.
pub fn ref_of(store: &Store, node: NodeId, field: &str) -> Option<NodeId> {
    store.get_named(node, field).ok().and_then(Value::as_node)
}

/// Payload text of view `name`.
pub fn text_of<'s>(store: &'s Store, name: &str) -> Option<&'s str> {
    let view = store.view_by_name(name)?;
    match store.view(view).ok()?.data()? {
        docgraph_core::PayloadData::Text(t) => Some(t),
        _ => None,
    }
}
