// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type/field compatibility resolution between a source and a target schema.
//!
//! Each source type is resolved once into a [`TypePlan`]: the target type and,
//! aligned with the source field handles, the target field handle and value
//! kind of every field that will be copied. Plans are cached for the lifetime
//! of the resolver, so filling a node costs one lookup per field.
use std::rc::Rc;
use std::sync::Arc;

use docgraph_core::{ElementKind, FieldHandle, FieldRole, Range, Schema, StoreError, TypeDef, TypeId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::CopyError;

/// Closed classification of field values, as seen by the copier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// UTF-8 string.
    String,
    /// 64-bit integer.
    Int64,
    /// 64-bit float.
    Float64,
    /// 8/16/32-bit integers and booleans.
    IntLike,
    /// Reference to a record, payload or array node.
    Reference,
}

impl ValueKind {
    /// Classifies a declared range. Returns `None` for arrays whose element
    /// range falls outside the closed element set.
    pub fn classify(range: &Range) -> Option<Self> {
        match range {
            Range::String => Some(Self::String),
            Range::Long => Some(Self::Int64),
            Range::Double => Some(Self::Float64),
            Range::Boolean | Range::Byte | Range::Short | Range::Int => Some(Self::IntLike),
            Range::Ref(_) => Some(Self::Reference),
            Range::Array(element) => ElementKind::for_element(element).map(|_| Self::Reference),
        }
    }
}

/// Where and how one source field lands in the target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldPlan {
    /// Target field handle.
    pub target: FieldHandle,
    /// Value kind shared by both sides.
    pub kind: ValueKind,
    /// Role of the target field.
    pub role: FieldRole,
}

/// Cached mapping of one source type onto the target schema.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypePlan {
    target: TypeId,
    fields: Vec<Option<FieldPlan>>,
}

impl TypePlan {
    /// Target type id.
    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Copied fields as `(source handle, plan)`; skipped fields are omitted.
    pub fn fields(&self) -> impl Iterator<Item = (FieldHandle, &FieldPlan)> {
        self.fields
            .iter()
            .zip(0u32..)
            .filter_map(|(plan, i)| plan.as_ref().map(|p| (FieldHandle(i), p)))
    }

    /// Number of source fields that were skipped.
    pub fn skipped(&self) -> usize {
        self.fields.iter().filter(|p| p.is_none()).count()
    }
}

/// Resolves and caches [`TypePlan`]s for one source/target schema pair.
#[derive(Debug)]
pub struct CompatResolver {
    src: Arc<Schema>,
    dst: Arc<Schema>,
    same_schema: bool,
    lenient: bool,
    plans: FxHashMap<TypeId, Option<Rc<TypePlan>>>,
}

impl CompatResolver {
    /// Creates a resolver. Schemas that are the same instance, or have the
    /// same declaration digest, take the pass-through fast path.
    pub fn new(src: Arc<Schema>, dst: Arc<Schema>, lenient: bool) -> Self {
        let same_schema = Arc::ptr_eq(&src, &dst) || src.is_equivalent(&dst);
        Self {
            src,
            dst,
            same_schema,
            lenient,
            plans: FxHashMap::default(),
        }
    }

    /// Returns `true` when field handles pass through unchanged.
    pub fn is_same_schema(&self) -> bool {
        self.same_schema
    }

    /// Returns `true` when missing types and fields are skipped.
    pub fn is_lenient(&self) -> bool {
        self.lenient
    }

    /// Plan for source type `ty`, or `None` when the type is not copyable
    /// (lenient mode only).
    pub fn resolve(&mut self, ty: TypeId) -> Result<Option<Rc<TypePlan>>, CopyError> {
        if let Some(cached) = self.plans.get(&ty) {
            return Ok(cached.clone());
        }
        let plan = self.build(ty)?.map(Rc::new);
        self.plans.insert(ty, plan.clone());
        Ok(plan)
    }

    fn build(&self, ty: TypeId) -> Result<Option<TypePlan>, CopyError> {
        let def = self
            .src
            .type_def(ty)
            .ok_or(CopyError::Store(StoreError::UnknownType(ty)))?;

        if self.same_schema {
            let fields = def
                .handles()
                .map(|(h, f)| {
                    classify(def, f.name(), f.range()).map(|kind| {
                        Some(FieldPlan {
                            target: h,
                            kind,
                            role: f.role(),
                        })
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Some(TypePlan { target: ty, fields }));
        }

        let Some(target) = self.dst.type_by_name(def.name()) else {
            if self.lenient {
                debug!(type_name = def.name(), "type missing from target schema; skipping");
                return Ok(None);
            }
            return Err(CopyError::SchemaMismatch {
                type_name: def.name().to_owned(),
            });
        };
        let target_def = self
            .dst
            .type_def(target)
            .ok_or(CopyError::Store(StoreError::UnknownType(target)))?;

        let mut fields = Vec::with_capacity(def.fields().len());
        for f in def.fields() {
            let kind = classify(def, f.name(), f.range())?;
            let Some(handle) = target_def.field_by_name(f.name()) else {
                if !self.lenient {
                    return Err(CopyError::FieldMismatch {
                        type_name: def.name().to_owned(),
                        field: f.name().to_owned(),
                    });
                }
                debug!(
                    type_name = def.name(),
                    field = f.name(),
                    "field missing from target type; skipping"
                );
                fields.push(None);
                continue;
            };
            let Some(target_field) = target_def.field(handle) else {
                return Err(CopyError::Store(StoreError::UnknownField {
                    type_name: target_def.name().to_owned(),
                    field: f.name().to_owned(),
                }));
            };
            if target_field.range() != f.range() {
                return Err(CopyError::RangeTypeMismatch {
                    type_name: def.name().to_owned(),
                    field: f.name().to_owned(),
                    source_range: f.range().clone(),
                    target_range: target_field.range().clone(),
                });
            }
            fields.push(Some(FieldPlan {
                target: handle,
                kind,
                role: target_field.role(),
            }));
        }
        let plan = TypePlan { target, fields };
        debug!(
            type_name = def.name(),
            copied = plan.fields().count(),
            skipped = plan.skipped(),
            "resolved cross-schema copy plan"
        );
        Ok(Some(plan))
    }
}

fn classify(def: &TypeDef, field: &str, range: &Range) -> Result<ValueKind, CopyError> {
    ValueKind::classify(range).ok_or_else(|| CopyError::UnsupportedElementKind {
        type_name: def.name().to_owned(),
        field: field.to_owned(),
        range: range.clone(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use docgraph_core::{FieldDef, ROOT_TYPE};

    fn token(extra: Option<FieldDef>) -> TypeDef {
        let ty = TypeDef::annotation("Token").with_field(FieldDef::new("pos", Range::String));
        match extra {
            Some(f) => ty.with_field(f),
            None => ty,
        }
    }

    fn schema(types: Vec<TypeDef>) -> Arc<Schema> {
        types
            .into_iter()
            .fold(Schema::builder(), docgraph_core::SchemaBuilder::with_type)
            .build()
            .unwrap()
    }

    #[test]
    fn classification_covers_the_closed_set() {
        assert_eq!(ValueKind::classify(&Range::Boolean), Some(ValueKind::IntLike));
        assert_eq!(ValueKind::classify(&Range::Short), Some(ValueKind::IntLike));
        assert_eq!(ValueKind::classify(&Range::Long), Some(ValueKind::Int64));
        assert_eq!(ValueKind::classify(&Range::Double), Some(ValueKind::Float64));
        assert_eq!(ValueKind::classify(&Range::String), Some(ValueKind::String));
        assert_eq!(
            ValueKind::classify(&Range::array_of(Range::Byte)),
            Some(ValueKind::Reference)
        );
        assert_eq!(
            ValueKind::classify(&Range::array_of(Range::array_of(Range::Int))),
            None
        );
    }

    #[test]
    fn same_schema_passes_handles_through() {
        let s = schema(vec![token(None)]);
        let mut r = CompatResolver::new(Arc::clone(&s), Arc::clone(&s), false);
        assert!(r.is_same_schema());
        let ty = s.type_by_name("Token").unwrap();
        let plan = r.resolve(ty).unwrap().unwrap();
        assert_eq!(plan.target(), ty);
        assert!(plan.fields().all(|(h, p)| h == p.target));
        assert_eq!(plan.skipped(), 0);
    }

    #[test]
    fn equivalent_schemas_take_the_fast_path() {
        let a = schema(vec![token(None)]);
        let b = schema(vec![token(None)]);
        assert!(CompatResolver::new(a, b, false).is_same_schema());
    }

    #[test]
    fn fields_are_mapped_by_name() {
        let src = schema(vec![token(Some(FieldDef::new("lemma", Range::String)))]);
        let dst = schema(vec![
            TypeDef::new("Other"),
            token(Some(FieldDef::new("lemma", Range::String))),
        ]);
        let mut r = CompatResolver::new(Arc::clone(&src), Arc::clone(&dst), false);
        let plan = r.resolve(src.type_by_name("Token").unwrap()).unwrap().unwrap();
        assert_eq!(plan.target(), dst.type_by_name("Token").unwrap());
        let lemma_src = src
            .type_def(src.type_by_name("Token").unwrap())
            .unwrap()
            .field_by_name("lemma")
            .unwrap();
        let (_, p) = plan.fields().find(|(h, _)| *h == lemma_src).unwrap();
        assert_eq!(p.kind, ValueKind::String);
    }

    #[test]
    fn missing_type_is_skipped_only_when_lenient() {
        let src = schema(vec![token(None)]);
        let dst = schema(vec![]);
        let ty = src.type_by_name("Token").unwrap();

        let mut lenient = CompatResolver::new(Arc::clone(&src), Arc::clone(&dst), true);
        assert_eq!(lenient.resolve(ty).unwrap(), None);

        let mut strict = CompatResolver::new(src, dst, false);
        assert_eq!(
            strict.resolve(ty).unwrap_err(),
            CopyError::SchemaMismatch {
                type_name: "Token".into()
            }
        );
    }

    #[test]
    fn missing_field_is_skipped_only_when_lenient() {
        let src = schema(vec![token(Some(FieldDef::new("lemma", Range::String)))]);
        let dst = schema(vec![token(None)]);
        let ty = src.type_by_name("Token").unwrap();

        let mut lenient = CompatResolver::new(Arc::clone(&src), Arc::clone(&dst), true);
        let plan = lenient.resolve(ty).unwrap().unwrap();
        assert_eq!(plan.skipped(), 1);

        let mut strict = CompatResolver::new(src, dst, false);
        assert!(matches!(
            strict.resolve(ty),
            Err(CopyError::FieldMismatch { ref field, .. }) if field == "lemma"
        ));
    }

    #[test]
    fn range_mismatch_is_fatal_even_when_lenient() {
        let src = schema(vec![token(Some(FieldDef::new("score", Range::Double)))]);
        let dst = schema(vec![token(Some(FieldDef::new("score", Range::Long)))]);
        let mut r = CompatResolver::new(Arc::clone(&src), dst, true);
        let err = r.resolve(src.type_by_name("Token").unwrap()).unwrap_err();
        assert!(matches!(err, CopyError::RangeTypeMismatch { .. }));
    }

    #[test]
    fn nested_array_fields_are_unsupported() {
        let src = schema(vec![TypeDef::new("Grid").with_field(FieldDef::new(
            "cells",
            Range::array_of(Range::array_of(Range::Int)),
        ))]);
        let mut r = CompatResolver::new(Arc::clone(&src), Arc::clone(&src), false);
        let err = r.resolve(src.type_by_name("Grid").unwrap()).unwrap_err();
        assert!(matches!(err, CopyError::UnsupportedElementKind { .. }));
    }

    #[test]
    fn root_type_resolves_across_schemas() {
        let src = Schema::builder()
            .with_root_field(FieldDef::new("genre", Range::String))
            .build()
            .unwrap();
        let dst = schema(vec![]);
        let mut r = CompatResolver::new(Arc::clone(&src), Arc::clone(&dst), true);
        let plan = r.resolve(src.root_type()).unwrap().unwrap();
        assert_eq!(dst.type_def(plan.target()).unwrap().name(), ROOT_TYPE);
        assert_eq!(plan.skipped(), 1);
    }

    #[test]
    fn plans_are_cached() {
        let s = schema(vec![token(None)]);
        let mut r = CompatResolver::new(Arc::clone(&s), s.clone(), false);
        let ty = s.type_by_name("Token").unwrap();
        let a = r.resolve(ty).unwrap().unwrap();
        let b = r.resolve(ty).unwrap().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
