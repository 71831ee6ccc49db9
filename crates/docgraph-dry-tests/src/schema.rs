// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Reference annotation schema and derived variants.
//!
//! Variants are derived from [`annotation_types`] so a test can state the one
//! difference it cares about: a missing type, a missing field, or a changed
//! range.

use std::sync::Arc;

use docgraph_core::{FieldDef, Range, Schema, SchemaBuilder, TypeDef};

/// Type declarations of the reference schema, in declaration order.
///
/// - `Token`: annotation with `pos` and `lemma` strings.
/// - `Sentence`: annotation with a `tokens` array of `Token` refs and a
///   `score`.
/// - `Entity`: annotation with `label`, `head` (a `Token`), `confidence` and
///   a 64-bit `id`.
/// - `Link`: plain record with `next` (a `Link`) and `weight`.
/// - `Pair`: plain record with `other` (a `Pair`).
/// - `Bag`: plain record with a `scores` double array and an `items` array
///   of `Bag` refs.
pub fn annotation_types() -> Vec<TypeDef> {
    vec![
        TypeDef::annotation("Token")
            .with_field(FieldDef::new("pos", Range::String))
            .with_field(FieldDef::new("lemma", Range::String)),
        TypeDef::annotation("Sentence")
            .with_field(FieldDef::new(
                "tokens",
                Range::array_of(Range::reference("Token")),
            ))
            .with_field(FieldDef::new("score", Range::Double)),
        TypeDef::annotation("Entity")
            .with_field(FieldDef::new("label", Range::String))
            .with_field(FieldDef::new("head", Range::reference("Token")))
            .with_field(FieldDef::new("confidence", Range::Double))
            .with_field(FieldDef::new("id", Range::Long)),
        TypeDef::new("Link")
            .with_field(FieldDef::new("next", Range::reference("Link")))
            .with_field(FieldDef::new("weight", Range::Int)),
        TypeDef::new("Pair").with_field(FieldDef::new("other", Range::reference("Pair"))),
        TypeDef::new("Bag")
            .with_field(FieldDef::new("scores", Range::array_of(Range::Double)))
            .with_field(FieldDef::new(
                "items",
                Range::array_of(Range::reference("Bag")),
            )),
    ]
}

/// Builds a schema from `types` plus a `docId` string on the root.
pub fn schema_from(types: Vec<TypeDef>) -> Arc<Schema> {
    types
        .into_iter()
        .fold(Schema::builder(), SchemaBuilder::with_type)
        .with_root_field(FieldDef::new("docId", Range::String))
        .build()
        .expect("fixture schema must validate")
}

/// The full reference schema.
pub fn annotation_schema() -> Arc<Schema> {
    schema_from(annotation_types())
}

/// Reference schema without type `name`.
///
/// Fields of other types that reference `name` are dropped with it.
pub fn without_type(name: &str) -> Arc<Schema> {
    let types = annotation_types()
        .into_iter()
        .filter(|t| t.name() != name)
        .map(|t| rebuild(&t, |f| !references(f.range(), name), |f| f.clone()))
        .collect();
    schema_from(types)
}

/// Reference schema where `type_name` lacks field `field`.
pub fn without_field(type_name: &str, field: &str) -> Arc<Schema> {
    let types = annotation_types()
        .into_iter()
        .map(|t| {
            if t.name() == type_name {
                rebuild(&t, |f| f.name() != field, |f| f.clone())
            } else {
                t
            }
        })
        .collect();
    schema_from(types)
}

/// Reference schema where `type_name.field` is declared with `range`.
pub fn with_range(type_name: &str, field: &str, range: Range) -> Arc<Schema> {
    let types = annotation_types()
        .into_iter()
        .map(|t| {
            if t.name() == type_name {
                rebuild(
                    &t,
                    |_| true,
                    |f| {
                        if f.name() == field {
                            FieldDef::new(f.name(), range.clone()).with_role(f.role())
                        } else {
                            f.clone()
                        }
                    },
                )
            } else {
                t
            }
        })
        .collect();
    schema_from(types)
}

fn rebuild(
    ty: &TypeDef,
    keep: impl Fn(&FieldDef) -> bool,
    map: impl Fn(&FieldDef) -> FieldDef,
) -> TypeDef {
    ty.fields()
        .iter()
        .filter(|f| keep(*f))
        .fold(TypeDef::new(ty.name()), |t, f| t.with_field(map(f)))
}

fn references(range: &Range, name: &str) -> bool {
    match range {
        Range::Ref(target) => target == name,
        Range::Array(inner) => references(inner, name),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_only_where_asked() {
        let full = annotation_schema();
        let no_entity = without_type("Entity");
        assert!(no_entity.type_by_name("Entity").is_none());
        assert!(no_entity.type_by_name("Token").is_some());

        let no_conf = without_field("Entity", "confidence");
        let entity = no_conf.type_by_name("Entity").and_then(|t| no_conf.type_def(t));
        assert!(entity.is_some_and(|e| e.field_by_name("confidence").is_none()));
        assert!(entity.is_some_and(|e| e.field_by_name("label").is_some()));

        let evolved = with_range("Entity", "id", Range::Int);
        assert!(!evolved.is_equivalent(&full));
        assert!(annotation_schema().is_equivalent(&full));
    }

    #[test]
    fn dropping_a_type_drops_its_inbound_refs() {
        let s = without_type("Token");
        let sentence = s.type_by_name("Sentence").and_then(|t| s.type_def(t));
        assert!(sentence.is_some_and(|d| d.field_by_name("tokens").is_none()));
    }
}
