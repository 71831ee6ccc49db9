// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Store builder for annotated documents.

use std::sync::Arc;

use bytes::Bytes;
use docgraph_core::{ArrayData, NodeId, PayloadData, Schema, Store, Value, ViewId};

use crate::schema::annotation_schema;

/// Builder for test stores.
///
/// # Example
///
/// ```
/// use docgraph_core::{Value, DEFAULT_VIEW};
/// use docgraph_dry_tests::DocBuilder;
///
/// let mut doc = DocBuilder::annotated();
/// doc.text(DEFAULT_VIEW, "Rust is fun");
/// let tok = doc.annotate(DEFAULT_VIEW, "Token", 0, 4);
/// doc.set(tok, "pos", Value::Str("NNP".into()));
/// let store = doc.build();
/// assert_eq!(store.view(store.default_view()).unwrap().index_len(), 2);
/// ```
#[derive(Debug)]
pub struct DocBuilder {
    store: Store,
}

impl DocBuilder {
    /// Starts an empty store over `schema`.
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            store: Store::new(schema),
        }
    }

    /// Starts an empty store over the reference annotation schema.
    pub fn annotated() -> Self {
        Self::new(annotation_schema())
    }

    /// The store under construction.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Mutable access for writes the builder does not cover.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Gets or creates view `name`.
    pub fn view(&mut self, name: &str) -> ViewId {
        self.store.view_or_create(name).expect("view creation")
    }

    /// Sets a `text/plain` payload on view `name`.
    pub fn text(&mut self, name: &str, text: &str) -> ViewId {
        let view = self.view(name);
        self.store
            .set_payload(
                view,
                PayloadData::Text(text.to_owned()),
                Some("text/plain".to_owned()),
            )
            .expect("text payload");
        view
    }

    /// Sets a binary payload on view `name`.
    pub fn bytes(&mut self, name: &str, data: &'static [u8]) -> ViewId {
        let view = self.view(name);
        self.store
            .set_payload(
                view,
                PayloadData::Bytes(Bytes::from_static(data)),
                Some("application/octet-stream".to_owned()),
            )
            .expect("bytes payload");
        view
    }

    /// Creates an unpublished record of type `ty`.
    pub fn record(&mut self, ty: &str) -> NodeId {
        let ty = self
            .store
            .schema()
            .type_by_name(ty)
            .expect("type declared by the fixture schema");
        self.store.create_node(ty).expect("record allocation")
    }

    /// Creates an annotation of type `ty` over `begin..end` in view `name`,
    /// sets its owning view and publishes it there.
    pub fn annotate(&mut self, name: &str, ty: &str, begin: i32, end: i32) -> NodeId {
        let view = self.view(name);
        let payload = self.store.view(view).expect("view").payload_node();
        let node = self.record(ty);
        self.set(node, "view", Value::Ref(payload))
            .set(node, "begin", Value::Int(begin))
            .set(node, "end", Value::Int(end));
        self.publish(name, node);
        node
    }

    /// Writes `field` on `node`.
    pub fn set(&mut self, node: NodeId, field: &str, value: Value) -> &mut Self {
        self.store
            .set_named(node, field, value)
            .expect("fixture write");
        self
    }

    /// Points reference `field` of `node` at `target`.
    pub fn link(&mut self, node: NodeId, field: &str, target: NodeId) -> &mut Self {
        self.set(node, field, Value::Ref(target))
    }

    /// Publishes `node` in view `name`.
    pub fn publish(&mut self, name: &str, node: NodeId) -> &mut Self {
        let view = self.view(name);
        self.store.add_to_index(view, node).expect("publish");
        self
    }

    /// Allocates a reference array holding `items`.
    pub fn ref_array(&mut self, items: &[Option<NodeId>]) -> NodeId {
        self.store
            .insert_array(ArrayData::Ref(items.to_vec()))
            .expect("array allocation")
    }

    /// Allocates a double array holding `items`.
    pub fn double_array(&mut self, items: &[f64]) -> NodeId {
        self.store
            .insert_array(ArrayData::Double(items.to_vec()))
            .expect("array allocation")
    }

    /// Finishes the store.
    pub fn build(self) -> Store {
        self.store
    }
}
