// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Arena-backed annotation store.
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ident::{next_store_id, FieldHandle, NodeId, StoreId, TypeId, ViewId};
use crate::record::{NodeKind, NodeRecord};
use crate::schema::{FieldRole, Range, Schema, TypeDef, PAYLOAD_TYPE};
use crate::value::{ArrayData, ElementKind, Value};
use crate::view::{PayloadData, View, DEFAULT_VIEW};

/// Errors returned by [`Store`] primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// The node does not exist in the store.
    #[error("node not found: {0}")]
    UnknownNode(NodeId),
    /// The view does not exist in the store.
    #[error("view not found: {0:?}")]
    UnknownView(ViewId),
    /// The type is not declared in the store's schema.
    #[error("type not declared: {0:?}")]
    UnknownType(TypeId),
    /// The record's type has no such field.
    #[error("{type_name} has no field {field}")]
    UnknownField {
        /// Record type.
        type_name: String,
        /// Requested field (name or handle).
        field: String,
    },
    /// The node is not a typed record.
    #[error("node is not a record: {0}")]
    NotARecord(NodeId),
    /// The node is not an array.
    #[error("node is not an array: {0}")]
    NotAnArray(NodeId),
    /// The value does not conform to the field's declared range.
    #[error("{type_name}.{field}: value {value:?} does not fit range {range}")]
    KindMismatch {
        /// Record type.
        type_name: String,
        /// Field name.
        field: String,
        /// Declared range.
        range: Range,
        /// Rejected value.
        value: Value,
    },
    /// A reference write names a node that does not exist.
    #[error("{node} references missing node {target}")]
    DanglingReference {
        /// Node being written (or checked).
        node: NodeId,
        /// Missing target.
        target: NodeId,
    },
    /// A reference write names a node of the wrong kind for the range.
    #[error("{node}: target {target} does not satisfy range {range}")]
    TargetMismatch {
        /// Node being written.
        node: NodeId,
        /// Offending target.
        target: NodeId,
        /// Declared range.
        range: Range,
    },
    /// Array element index is out of bounds.
    #[error("{node}[{index}] out of bounds (len {len})")]
    ElementOutOfBounds {
        /// Array node.
        node: NodeId,
        /// Requested slot.
        index: usize,
        /// Array length.
        len: usize,
    },
    /// The array holds elements of a different kind.
    #[error("{node}: expected {expected:?} elements, found {found:?}")]
    ArrayKindMismatch {
        /// Array node.
        node: NodeId,
        /// Kind required by the operation.
        expected: ElementKind,
        /// Kind held by the array.
        found: ElementKind,
    },
    /// Only typed records may be published in a view index.
    #[error("node cannot be indexed: {0}")]
    NotIndexable(NodeId),
    /// The arena cannot address more nodes or views.
    #[error("store arena exhausted")]
    ArenaFull,
}

/// Typed annotation store: one schema, one node arena, several named views.
///
/// Cloning a store keeps its [`StoreId`]; the clone is the same document
/// lineage and its node ids alias the original's.
#[derive(Debug, Clone)]
pub struct Store {
    id: StoreId,
    schema: Arc<Schema>,
    nodes: Vec<NodeRecord>,
    views: Vec<View>,
    view_names: BTreeMap<String, ViewId>,
    root_owner: FxHashMap<NodeId, ViewId>,
}

impl Store {
    /// Creates an empty store holding only the default view.
    pub fn new(schema: Arc<Schema>) -> Self {
        let payload = NodeId(0);
        let root = NodeId(1);
        let view = ViewId(0);
        let nodes = vec![
            NodeRecord::Payload(view),
            root_record(&schema, payload),
        ];
        let mut view_names = BTreeMap::new();
        view_names.insert(DEFAULT_VIEW.to_owned(), view);
        let mut root_owner = FxHashMap::default();
        root_owner.insert(root, view);
        Self {
            id: next_store_id(),
            schema,
            nodes,
            views: vec![View {
                name: DEFAULT_VIEW.to_owned(),
                payload,
                root,
                data: None,
                media_type: None,
                index: BTreeSet::from([root]),
            }],
            view_names,
            root_owner,
        }
    }

    /// Creates a new, independent, empty store sharing this store's schema.
    pub fn empty_like(&self) -> Self {
        Self::new(Arc::clone(&self.schema))
    }

    /// Store lineage identity.
    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Schema shared by every node of this store.
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Number of allocated nodes (payloads, roots and arrays included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the record stored at `id`.
    pub fn node(&self, id: NodeId) -> Result<&NodeRecord, StoreError> {
        self.nodes.get(id.index()).ok_or(StoreError::UnknownNode(id))
    }

    /// Structural kind of `id`.
    pub fn kind(&self, id: NodeId) -> Result<NodeKind, StoreError> {
        self.node(id).map(NodeRecord::kind)
    }

    /// Type declaration of the record at `id`.
    pub fn type_of(&self, id: NodeId) -> Result<&TypeDef, StoreError> {
        match self.node(id)? {
            NodeRecord::Record { ty, .. } => self
                .schema
                .type_def(*ty)
                .ok_or(StoreError::UnknownType(*ty)),
            _ => Err(StoreError::NotARecord(id)),
        }
    }

    /// Allocates an empty record of type `ty`.
    ///
    /// Scalars start at zero, everything else at [`Value::Null`]. Owning-view
    /// fields are not populated.
    pub fn create_node(&mut self, ty: TypeId) -> Result<NodeId, StoreError> {
        let def = self.schema.type_def(ty).ok_or(StoreError::UnknownType(ty))?;
        let values = def.fields().iter().map(|f| Value::initial(f.range())).collect();
        self.alloc(NodeRecord::Record { ty, values })
    }

    /// Allocates a zeroed array of `len` elements of `kind`.
    pub fn create_array(&mut self, kind: ElementKind, len: usize) -> Result<NodeId, StoreError> {
        self.alloc(NodeRecord::Array(ArrayData::zeroed(kind, len)))
    }

    /// Allocates an array holding `data`.
    ///
    /// Reference slots must name existing nodes.
    pub fn insert_array(&mut self, data: ArrayData) -> Result<NodeId, StoreError> {
        let next = NodeId(u32::try_from(self.nodes.len()).map_err(|_| StoreError::ArenaFull)?);
        for target in data.refs() {
            self.require_existing(next, target)?;
        }
        self.alloc(NodeRecord::Array(data))
    }

    /// Reads field `field` of record `id`.
    pub fn get(&self, id: NodeId, field: FieldHandle) -> Result<&Value, StoreError> {
        let NodeRecord::Record { ty, values } = self.node(id)? else {
            return Err(StoreError::NotARecord(id));
        };
        values.get(field.index()).ok_or_else(|| StoreError::UnknownField {
            type_name: self.type_name(*ty),
            field: format!("#{}", field.0),
        })
    }

    /// Writes field `field` of record `id`.
    ///
    /// The value must conform to the declared range; references must name an
    /// existing node of the declared kind.
    pub fn set(&mut self, id: NodeId, field: FieldHandle, value: Value) -> Result<(), StoreError> {
        let def = self.type_of(id)?;
        let Some(decl) = def.field(field) else {
            return Err(StoreError::UnknownField {
                type_name: def.name().to_owned(),
                field: format!("#{}", field.0),
            });
        };
        if !value.conforms_to(decl.range()) {
            return Err(StoreError::KindMismatch {
                type_name: def.name().to_owned(),
                field: decl.name().to_owned(),
                range: decl.range().clone(),
                value,
            });
        }
        if let Value::Ref(target) = value {
            self.check_target(id, target, decl.range())?;
        }
        if let Some(NodeRecord::Record { values, .. }) = self.nodes.get_mut(id.index()) {
            values[field.index()] = value;
        }
        Ok(())
    }

    /// Resolves a field handle by name on the record at `id`.
    pub fn field_handle(&self, id: NodeId, name: &str) -> Result<FieldHandle, StoreError> {
        let def = self.type_of(id)?;
        def.field_by_name(name)
            .ok_or_else(|| StoreError::UnknownField {
                type_name: def.name().to_owned(),
                field: name.to_owned(),
            })
    }

    /// Reads a field by name.
    pub fn get_named(&self, id: NodeId, name: &str) -> Result<&Value, StoreError> {
        let field = self.field_handle(id, name)?;
        self.get(id, field)
    }

    /// Writes a field by name.
    pub fn set_named(&mut self, id: NodeId, name: &str, value: Value) -> Result<(), StoreError> {
        let field = self.field_handle(id, name)?;
        self.set(id, field, value)
    }

    /// Reads the elements of array `id`.
    pub fn array(&self, id: NodeId) -> Result<&ArrayData, StoreError> {
        match self.node(id)? {
            NodeRecord::Array(data) => Ok(data),
            _ => Err(StoreError::NotAnArray(id)),
        }
    }

    /// Writes slot `index` of reference array `id`.
    pub fn set_ref_element(
        &mut self,
        id: NodeId,
        index: usize,
        target: Option<NodeId>,
    ) -> Result<(), StoreError> {
        let data = self.array(id)?;
        let ArrayData::Ref(slots) = data else {
            return Err(StoreError::ArrayKindMismatch {
                node: id,
                expected: ElementKind::Ref,
                found: data.kind(),
            });
        };
        if index >= slots.len() {
            return Err(StoreError::ElementOutOfBounds {
                node: id,
                index,
                len: slots.len(),
            });
        }
        if let Some(target) = target {
            self.require_existing(id, target)?;
        }
        if let Some(NodeRecord::Array(ArrayData::Ref(slots))) = self.nodes.get_mut(id.index()) {
            slots[index] = target;
        }
        Ok(())
    }

    /// The view every store starts with.
    pub fn default_view(&self) -> ViewId {
        ViewId(0)
    }

    /// Looks a view up by name.
    pub fn view_by_name(&self, name: &str) -> Option<ViewId> {
        self.view_names.get(name).copied()
    }

    /// Returns the view `id`.
    pub fn view(&self, id: ViewId) -> Result<&View, StoreError> {
        self.views.get(id.index()).ok_or(StoreError::UnknownView(id))
    }

    /// Iterates all views in creation order.
    pub fn views(&self) -> impl Iterator<Item = (ViewId, &View)> {
        self.views.iter().zip(0u32..).map(|(v, i)| (ViewId(i), v))
    }

    /// Returns the view named `name`, creating it (with its payload and root)
    /// when absent.
    pub fn view_or_create(&mut self, name: &str) -> Result<ViewId, StoreError> {
        if let Some(id) = self.view_by_name(name) {
            return Ok(id);
        }
        let id = ViewId(u32::try_from(self.views.len()).map_err(|_| StoreError::ArenaFull)?);
        let payload = self.alloc(NodeRecord::Payload(id))?;
        let root = self.alloc(root_record(&self.schema, payload))?;
        self.views.push(View {
            name: name.to_owned(),
            payload,
            root,
            data: None,
            media_type: None,
            index: BTreeSet::from([root]),
        });
        self.view_names.insert(name.to_owned(), id);
        self.root_owner.insert(root, id);
        Ok(id)
    }

    /// Sets the payload data and media type of `view`.
    ///
    /// Text payloads also set the root's end offset to the text length.
    pub fn set_payload(
        &mut self,
        view: ViewId,
        data: PayloadData,
        media_type: Option<String>,
    ) -> Result<(), StoreError> {
        let root = self.view(view)?.root;
        if let Some(extent) = data.text_extent() {
            let root_def = self.type_of(root)?;
            if let Some(end) = root_def.role_field(FieldRole::End) {
                let value = match root_def.field(end).map(|f| f.range()) {
                    Some(Range::Long) => Value::Long(i64::try_from(extent).unwrap_or(i64::MAX)),
                    _ => Value::Int(i32::try_from(extent).unwrap_or(i32::MAX)),
                };
                self.set(root, end, value)?;
            }
        }
        let v = &mut self.views[view.index()];
        v.data = Some(data);
        v.media_type = media_type;
        Ok(())
    }

    /// Publishes record `node` in `view`. Returns `false` if it already was.
    pub fn add_to_index(&mut self, view: ViewId, node: NodeId) -> Result<bool, StoreError> {
        self.view(view)?;
        if !matches!(self.node(node)?, NodeRecord::Record { .. }) {
            return Err(StoreError::NotIndexable(node));
        }
        Ok(self.views[view.index()].index.insert(node))
    }

    /// Withdraws `node` from `view`. Returns `false` if it was not published.
    ///
    /// The view root cannot be withdrawn.
    pub fn remove_from_index(&mut self, view: ViewId, node: NodeId) -> Result<bool, StoreError> {
        let v = self.view(view)?;
        if v.root == node {
            return Ok(false);
        }
        Ok(self.views[view.index()].index.remove(&node))
    }

    /// Nodes published in `view`, in stable index order.
    ///
    /// Nodes without a start offset come first, by id. Positioned nodes follow
    /// by start ascending, end descending, then id.
    pub fn indexed(&self, view: ViewId) -> Result<Vec<NodeId>, StoreError> {
        let v = self.view(view)?;
        let mut keyed = v
            .index
            .iter()
            .map(|&id| self.sort_key(id).map(|k| (k, id)))
            .collect::<Result<Vec<_>, _>>()?;
        keyed.sort_unstable();
        Ok(keyed.into_iter().map(|(_, id)| id).collect())
    }

    /// View whose root annotation is `node`, if any.
    pub fn root_owner(&self, node: NodeId) -> Option<ViewId> {
        self.root_owner.get(&node).copied()
    }

    /// View whose payload node is `node`, if any.
    pub fn payload_owner(&self, node: NodeId) -> Option<ViewId> {
        match self.nodes.get(node.index()) {
            Some(NodeRecord::Payload(view)) => Some(*view),
            _ => None,
        }
    }

    /// Verifies that every reference, payload, root and index entry names an
    /// existing node.
    pub fn check_integrity(&self) -> Result<(), StoreError> {
        for (slot, rec) in self.nodes.iter().enumerate() {
            let node = NodeId(u32::try_from(slot).map_err(|_| StoreError::ArenaFull)?);
            match rec {
                NodeRecord::Record { values, .. } => {
                    for target in values.iter().filter_map(Value::as_node) {
                        self.require_existing(node, target)?;
                    }
                }
                NodeRecord::Array(data) => {
                    for target in data.refs() {
                        self.require_existing(node, target)?;
                    }
                }
                NodeRecord::Payload(view) => {
                    self.view(*view)?;
                }
            }
        }
        for view in &self.views {
            self.node(view.payload)?;
            self.node(view.root)?;
            for &node in &view.index {
                self.node(node)?;
            }
        }
        Ok(())
    }

    fn alloc(&mut self, rec: NodeRecord) -> Result<NodeId, StoreError> {
        let id = NodeId(u32::try_from(self.nodes.len()).map_err(|_| StoreError::ArenaFull)?);
        self.nodes.push(rec);
        Ok(id)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.schema
            .type_def(ty)
            .map_or_else(|| format!("{ty:?}"), |d| d.name().to_owned())
    }

    fn require_existing(&self, node: NodeId, target: NodeId) -> Result<(), StoreError> {
        if target.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(StoreError::DanglingReference { node, target })
        }
    }

    fn check_target(&self, node: NodeId, target: NodeId, range: &Range) -> Result<(), StoreError> {
        self.require_existing(node, target)?;
        let ok = match (range, &self.nodes[target.index()]) {
            (Range::Ref(name), NodeRecord::Payload(_)) => name == PAYLOAD_TYPE,
            (Range::Ref(name), NodeRecord::Record { ty, .. }) => {
                self.schema.type_def(*ty).is_some_and(|d| d.name() == name)
            }
            (Range::Array(element), NodeRecord::Array(data)) => {
                ElementKind::for_element(element) == Some(data.kind())
            }
            _ => false,
        };
        if ok {
            Ok(())
        } else {
            Err(StoreError::TargetMismatch {
                node,
                target,
                range: range.clone(),
            })
        }
    }

    fn sort_key(&self, id: NodeId) -> Result<(bool, i64, Reverse<i64>), StoreError> {
        let def = self.type_of(id)?;
        let Some(begin) = def.role_field(FieldRole::Begin) else {
            return Ok((false, 0, Reverse(0)));
        };
        let begin = self.get(id, begin)?.as_offset().unwrap_or(0);
        let end = match def.role_field(FieldRole::End) {
            Some(end) => self.get(id, end)?.as_offset().unwrap_or(begin),
            None => begin,
        };
        Ok((true, begin, Reverse(end)))
    }
}

fn root_record(schema: &Schema, payload: NodeId) -> NodeRecord {
    let ty = schema.root_type();
    let values = schema
        .type_def(ty)
        .map(|def| {
            def.fields()
                .iter()
                .map(|f| match f.role() {
                    FieldRole::OwningView => Value::Ref(payload),
                    _ => Value::initial(f.range()),
                })
                .collect()
        })
        .unwrap_or_default();
    NodeRecord::Record { ty, values }
}
