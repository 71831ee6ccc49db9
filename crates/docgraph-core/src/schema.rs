// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Schema registry: declared types, their ordered fields, ranges and roles.
//!
//! A [`Schema`] is immutable once built and shared between stores as
//! `Arc<Schema>`. Every schema carries the builtin root type [`ROOT_TYPE`];
//! the reserved name [`PAYLOAD_TYPE`] may be used as a reference target to
//! point at a view's payload node.
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::ident::{DigestBuilder, FieldHandle, Hash, TypeId};

/// Name of the builtin per-view root annotation type.
pub const ROOT_TYPE: &str = "DocumentRoot";
/// Reserved reference target naming a view's payload node.
pub const PAYLOAD_TYPE: &str = "Payload";

/// Declared value range of a field.
///
/// Ranges refer to other types by *name*, which makes them comparable across
/// two independently built schemas.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Range {
    /// `bool`.
    Boolean,
    /// `i8`.
    Byte,
    /// `i16`.
    Short,
    /// `i32`.
    Int,
    /// `i64`.
    Long,
    /// `f64`.
    Double,
    /// UTF-8 string.
    String,
    /// Reference to a node of the named type.
    Ref(String),
    /// Reference to an array node with the given element range.
    Array(Box<Range>),
}

impl Range {
    /// Reference to a node of type `ty`.
    pub fn reference(ty: impl Into<String>) -> Self {
        Self::Ref(ty.into())
    }

    /// Array whose elements have range `element`.
    pub fn array_of(element: Range) -> Self {
        Self::Array(Box::new(element))
    }

    /// Returns `true` for the integral scalar ranges usable as offsets.
    #[must_use]
    pub fn is_offset(&self) -> bool {
        matches!(self, Self::Int | Self::Long)
    }

    fn encode(&self, d: &mut DigestBuilder) {
        let tag = match self {
            Self::Boolean => 1,
            Self::Byte => 2,
            Self::Short => 3,
            Self::Int => 4,
            Self::Long => 5,
            Self::Double => 6,
            Self::String => 7,
            Self::Ref(_) => 8,
            Self::Array(_) => 9,
        };
        d.tag(tag);
        match self {
            Self::Ref(name) => {
                d.str(name);
            }
            Self::Array(inner) => inner.encode(d),
            _ => {}
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean => f.write_str("boolean"),
            Self::Byte => f.write_str("byte"),
            Self::Short => f.write_str("short"),
            Self::Int => f.write_str("int"),
            Self::Long => f.write_str("long"),
            Self::Double => f.write_str("double"),
            Self::String => f.write_str("string"),
            Self::Ref(name) => write!(f, "ref<{name}>"),
            Self::Array(inner) => write!(f, "array<{inner}>"),
        }
    }
}

/// Semantic role a field plays for the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldRole {
    /// No special meaning.
    Plain,
    /// Start offset; primary index sort key.
    Begin,
    /// End offset; secondary index sort key (descending).
    End,
    /// Points at the payload of the view that owns the node.
    OwningView,
}

impl FieldRole {
    const fn tag(self) -> u8 {
        match self {
            Self::Plain => 0,
            Self::Begin => 1,
            Self::End => 2,
            Self::OwningView => 3,
        }
    }
}

/// Declaration of a single field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDef {
    name: String,
    range: Range,
    role: FieldRole,
}

impl FieldDef {
    /// Plain field named `name` with range `range`.
    pub fn new(name: impl Into<String>, range: Range) -> Self {
        Self {
            name: name.into(),
            range,
            role: FieldRole::Plain,
        }
    }

    /// `int` start-offset field.
    pub fn begin(name: impl Into<String>) -> Self {
        Self::new(name, Range::Int).with_role(FieldRole::Begin)
    }

    /// `int` end-offset field.
    pub fn end(name: impl Into<String>) -> Self {
        Self::new(name, Range::Int).with_role(FieldRole::End)
    }

    /// Owning-view field referencing the view payload.
    pub fn owning_view(name: impl Into<String>) -> Self {
        Self::new(name, Range::reference(PAYLOAD_TYPE)).with_role(FieldRole::OwningView)
    }

    /// Replaces the role of this field.
    pub fn with_role(mut self, role: FieldRole) -> Self {
        self.role = role;
        self
    }

    /// Field name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared range.
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Declared role.
    pub fn role(&self) -> FieldRole {
        self.role
    }
}

/// Declaration of a type and its ordered fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDef {
    name: String,
    fields: Vec<FieldDef>,
}

impl TypeDef {
    /// Type with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Positioned annotation type: pre-declares `view`, `begin` and `end`.
    pub fn annotation(name: impl Into<String>) -> Self {
        Self::new(name)
            .with_field(FieldDef::owning_view("view"))
            .with_field(FieldDef::begin("begin"))
            .with_field(FieldDef::end("end"))
    }

    /// Appends a field declaration.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields in handle order.
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Returns the declaration behind `handle`.
    pub fn field(&self, handle: FieldHandle) -> Option<&FieldDef> {
        self.fields.get(handle.index())
    }

    /// Looks a field up by name.
    pub fn field_by_name(&self, name: &str) -> Option<FieldHandle> {
        self.handles()
            .find(|(_, f)| f.name == name)
            .map(|(h, _)| h)
    }

    /// Returns the first field carrying `role`.
    pub fn role_field(&self, role: FieldRole) -> Option<FieldHandle> {
        self.handles()
            .find(|(_, f)| f.role == role)
            .map(|(h, _)| h)
    }

    /// Iterates `(handle, declaration)` pairs in declaration order.
    pub fn handles(&self) -> impl Iterator<Item = (FieldHandle, &FieldDef)> {
        self.fields
            .iter()
            .zip(0u32..)
            .map(|(f, i)| (FieldHandle(i), f))
    }
}

/// Errors raised while building a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Two types share one name.
    #[error("duplicate type: {0}")]
    DuplicateType(String),
    /// A type declares two fields with the same name.
    #[error("duplicate field {type_name}.{field}")]
    DuplicateField {
        /// Declaring type.
        type_name: String,
        /// Repeated field name.
        field: String,
    },
    /// A user type reuses a builtin name.
    #[error("type name is reserved: {0}")]
    ReservedType(String),
    /// A reference range names a type that is not declared.
    #[error("{type_name}.{field} references unknown type {target}")]
    UnknownRefTarget {
        /// Declaring type.
        type_name: String,
        /// Offending field.
        field: String,
        /// Missing target type.
        target: String,
    },
    /// The role is incompatible with the declared range, or repeated.
    #[error("{type_name}.{field}: role {role:?} not valid for range {range}")]
    InvalidRole {
        /// Declaring type.
        type_name: String,
        /// Offending field.
        field: String,
        /// Declared role.
        role: FieldRole,
        /// Declared range.
        range: Range,
    },
    /// More declarations than fit a 32-bit handle.
    #[error("schema exceeds 2^32 declarations")]
    TooLarge,
}

/// Immutable set of type declarations shared by one or more stores.
#[derive(Debug)]
pub struct Schema {
    types: Vec<TypeDef>,
    by_name: FxHashMap<String, TypeId>,
    digest: Hash,
}

impl Schema {
    /// Starts a new schema declaration.
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// Returns the declaration for `ty`.
    pub fn type_def(&self, ty: TypeId) -> Option<&TypeDef> {
        self.types.get(ty.index())
    }

    /// Resolves a type by exact name.
    pub fn type_by_name(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Iterates all declared types in id order (root type first).
    pub fn types(&self) -> impl Iterator<Item = (TypeId, &TypeDef)> {
        self.types.iter().zip(0u32..).map(|(t, i)| (TypeId(i), t))
    }

    /// Number of declared types, builtin root included.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// The builtin root annotation type.
    pub fn root_type(&self) -> TypeId {
        TypeId(0)
    }

    /// BLAKE3 digest of the canonical declaration encoding.
    pub fn digest(&self) -> &Hash {
        &self.digest
    }

    /// Returns `true` when both schemas declare exactly the same types and
    /// fields in the same order, so type ids and field handles coincide.
    pub fn is_equivalent(&self, other: &Schema) -> bool {
        self.digest == other.digest
    }
}

/// Incremental builder for [`Schema`].
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    types: Vec<TypeDef>,
    root_fields: Vec<FieldDef>,
}

impl SchemaBuilder {
    /// Declares a type.
    pub fn with_type(mut self, ty: TypeDef) -> Self {
        self.types.push(ty);
        self
    }

    /// Adds an extra field to the builtin root type.
    pub fn with_root_field(mut self, field: FieldDef) -> Self {
        self.root_fields.push(field);
        self
    }

    /// Validates the declarations and freezes them into a shared schema.
    pub fn build(self) -> Result<Arc<Schema>, SchemaError> {
        let mut root = TypeDef::new(ROOT_TYPE)
            .with_field(FieldDef::owning_view("view"))
            .with_field(FieldDef::begin("begin"))
            .with_field(FieldDef::end("end"))
            .with_field(FieldDef::new("language", Range::String));
        root.fields.extend(self.root_fields);

        let mut types = Vec::with_capacity(self.types.len() + 1);
        types.push(root);
        for ty in self.types {
            if ty.name == ROOT_TYPE || ty.name == PAYLOAD_TYPE {
                return Err(SchemaError::ReservedType(ty.name));
            }
            types.push(ty);
        }

        let mut by_name = FxHashMap::default();
        for (i, ty) in types.iter().enumerate() {
            let id = TypeId(u32::try_from(i).map_err(|_| SchemaError::TooLarge)?);
            if by_name.insert(ty.name.clone(), id).is_some() {
                return Err(SchemaError::DuplicateType(ty.name.clone()));
            }
        }

        for ty in &types {
            validate_type(ty, &by_name)?;
        }

        let mut d = DigestBuilder::new(b"docgraph:schema:v1");
        d.count(types.len());
        for ty in &types {
            d.str(&ty.name).count(ty.fields.len());
            for f in &ty.fields {
                d.str(&f.name);
                f.range.encode(&mut d);
                d.tag(f.role.tag());
            }
        }
        let digest = d.finish();

        Ok(Arc::new(Schema {
            types,
            by_name,
            digest,
        }))
    }
}

fn validate_type(ty: &TypeDef, by_name: &FxHashMap<String, TypeId>) -> Result<(), SchemaError> {
    if u32::try_from(ty.fields.len()).is_err() {
        return Err(SchemaError::TooLarge);
    }
    let mut seen_roles = Vec::new();
    for (i, f) in ty.fields.iter().enumerate() {
        if ty.fields[..i].iter().any(|g| g.name == f.name) {
            return Err(SchemaError::DuplicateField {
                type_name: ty.name.clone(),
                field: f.name.clone(),
            });
        }
        if let Some(target) = unresolved_target(&f.range, by_name) {
            return Err(SchemaError::UnknownRefTarget {
                type_name: ty.name.clone(),
                field: f.name.clone(),
                target: target.to_owned(),
            });
        }
        let role_ok = match f.role {
            FieldRole::Plain => true,
            FieldRole::Begin | FieldRole::End => f.range.is_offset(),
            FieldRole::OwningView => f.range == Range::reference(PAYLOAD_TYPE),
        };
        let repeated = f.role != FieldRole::Plain && seen_roles.contains(&f.role);
        if !role_ok || repeated {
            return Err(SchemaError::InvalidRole {
                type_name: ty.name.clone(),
                field: f.name.clone(),
                role: f.role,
                range: f.range.clone(),
            });
        }
        seen_roles.push(f.role);
    }
    Ok(())
}

fn unresolved_target<'r>(range: &'r Range, by_name: &FxHashMap<String, TypeId>) -> Option<&'r str> {
    match range {
        Range::Ref(name) if name != PAYLOAD_TYPE && !by_name.contains_key(name) => Some(name),
        Range::Array(inner) => unresolved_target(inner, by_name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn token() -> TypeDef {
        TypeDef::annotation("Token").with_field(FieldDef::new("pos", Range::String))
    }

    #[test]
    fn root_type_is_always_declared_first() {
        let schema = Schema::builder().with_type(token()).build().unwrap();
        assert_eq!(schema.type_by_name(ROOT_TYPE), Some(schema.root_type()));
        let root = schema.type_def(schema.root_type()).unwrap();
        assert_eq!(
            root.role_field(FieldRole::OwningView),
            root.field_by_name("view")
        );
        assert!(root.field_by_name("language").is_some());
    }

    #[test]
    fn root_fields_can_be_extended() {
        let schema = Schema::builder()
            .with_root_field(FieldDef::new("source_uri", Range::String))
            .build()
            .unwrap();
        let root = schema.type_def(schema.root_type()).unwrap();
        assert!(root.field_by_name("source_uri").is_some());
    }

    #[test]
    fn duplicate_type_is_rejected() {
        let err = Schema::builder()
            .with_type(token())
            .with_type(token())
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateType("Token".into()));
    }

    #[test]
    fn reserved_names_are_rejected() {
        let err = Schema::builder()
            .with_type(TypeDef::new(PAYLOAD_TYPE))
            .build()
            .unwrap_err();
        assert_eq!(err, SchemaError::ReservedType(PAYLOAD_TYPE.into()));
    }

    #[test]
    fn unknown_reference_target_is_rejected() {
        let err = Schema::builder()
            .with_type(TypeDef::new("Entity").with_field(FieldDef::new(
                "mentions",
                Range::array_of(Range::reference("Mention")),
            )))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownRefTarget { ref target, .. } if target == "Mention"));
    }

    #[test]
    fn offset_roles_require_integral_ranges() {
        let err = Schema::builder()
            .with_type(
                TypeDef::new("Bad")
                    .with_field(FieldDef::new("begin", Range::Double).with_role(FieldRole::Begin)),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRole { .. }));
    }

    #[test]
    fn repeated_role_is_rejected() {
        let err = Schema::builder()
            .with_type(TypeDef::annotation("Span").with_field(FieldDef::begin("start")))
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidRole { role: FieldRole::Begin, .. }));
    }

    #[test]
    fn digest_tracks_declarations() {
        let a = Schema::builder().with_type(token()).build().unwrap();
        let b = Schema::builder().with_type(token()).build().unwrap();
        let c = Schema::builder()
            .with_type(TypeDef::annotation("Token"))
            .build()
            .unwrap();
        assert!(a.is_equivalent(&b));
        assert!(!a.is_equivalent(&c));
    }

    #[test]
    fn range_display_is_readable() {
        let r = Range::array_of(Range::reference("Token"));
        assert_eq!(r.to_string(), "array<ref<Token>>");
    }
}
