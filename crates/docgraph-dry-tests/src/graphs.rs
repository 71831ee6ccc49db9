// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Chain, cycle and random graph shapes over the reference schema.

use docgraph_core::{NodeId, Store, Value, DEFAULT_VIEW};

use crate::document::DocBuilder;

/// Builds a `Link` chain of `len` nodes and publishes its head in the
/// default view. Each node's `weight` is its position.
pub fn build_chain(doc: &mut DocBuilder, len: usize) -> Option<NodeId> {
    let nodes: Vec<NodeId> = (0..len).map(|_| doc.record("Link")).collect();
    for (i, pair) in nodes.windows(2).enumerate() {
        doc.link(pair[0], "next", pair[1]);
        doc.set(pair[0], "weight", Value::Int(weight(i)));
    }
    if let Some(&last) = nodes.last() {
        doc.set(last, "weight", Value::Int(weight(len - 1)));
    }
    let head = nodes.first().copied()?;
    doc.publish(DEFAULT_VIEW, head);
    Some(head)
}

/// Follows `next` from `head` and counts the nodes visited.
///
/// Stops after `store.node_count()` steps so a cycle cannot hang a test.
pub fn chain_len(store: &Store, head: NodeId) -> usize {
    let mut len = 0;
    let mut cur = Some(head);
    while let Some(node) = cur {
        len += 1;
        if len > store.node_count() {
            break;
        }
        cur = store
            .get_named(node, "next")
            .ok()
            .and_then(Value::as_node);
    }
    len
}

/// Builds two `Pair` records pointing at each other and publishes the first.
pub fn build_cycle(doc: &mut DocBuilder) -> (NodeId, NodeId) {
    let a = doc.record("Pair");
    let b = doc.record("Pair");
    doc.link(a, "other", b).link(b, "other", a);
    doc.publish(DEFAULT_VIEW, a);
    (a, b)
}

/// Description of a random `Link` graph.
///
/// Node `i` points at `next[i]` (any node, itself included) and carries
/// weight `i`. Nodes listed in `published` are indexed in the default view.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomGraph {
    /// `next` target per node, as an index into the node list.
    pub next: Vec<Option<usize>>,
    /// Published node indexes.
    pub published: Vec<usize>,
}

/// Materializes `graph`; returns the store and the node ids in list order.
///
/// Out-of-range indexes are reduced modulo the node count.
pub fn build_random(graph: &RandomGraph) -> (Store, Vec<NodeId>) {
    let mut doc = DocBuilder::annotated();
    let nodes: Vec<NodeId> = graph.next.iter().map(|_| doc.record("Link")).collect();
    for (i, next) in graph.next.iter().enumerate() {
        doc.set(nodes[i], "weight", Value::Int(weight(i)));
        if let Some(j) = next {
            doc.link(nodes[i], "next", nodes[j % nodes.len()]);
        }
    }
    if !nodes.is_empty() {
        for &p in &graph.published {
            doc.publish(DEFAULT_VIEW, nodes[p % nodes.len()]);
        }
    }
    (doc.build(), nodes)
}

fn weight(i: usize) -> i32 {
    i32::try_from(i).unwrap_or(i32::MAX)
}
