// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Copy error taxonomy.
use docgraph_core::{Range, StoreError, StoreId};
use thiserror::Error;

/// Errors that abort a copy operation.
///
/// Only `SchemaMismatch` and `FieldMismatch` are suppressed by lenient mode;
/// every other variant is fatal regardless of options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CopyError {
    /// The target schema does not declare a source type.
    #[error("target schema has no type {type_name}")]
    SchemaMismatch {
        /// Missing type.
        type_name: String,
    },
    /// The target type does not declare a source field.
    #[error("target type {type_name} has no field {field}")]
    FieldMismatch {
        /// Declaring type.
        type_name: String,
        /// Missing field.
        field: String,
    },
    /// Both schemas declare the field, with different ranges.
    #[error("{type_name}.{field}: source range {source_range} differs from target range {target_range}")]
    RangeTypeMismatch {
        /// Declaring type.
        type_name: String,
        /// Field name.
        field: String,
        /// Range in the source schema.
        source_range: Range,
        /// Range in the target schema.
        target_range: Range,
    },
    /// Source and target are partitions of one store lineage.
    #[error("source and target both belong to {store}")]
    InvalidCrossCopy {
        /// The shared store identity.
        store: StoreId,
    },
    /// An array field's element range is outside the closed element set.
    #[error("{type_name}.{field}: unsupported array element range {range}")]
    UnsupportedElementKind {
        /// Declaring type.
        type_name: String,
        /// Field name.
        field: String,
        /// Declared range.
        range: Range,
    },
    /// The requested source view does not exist.
    #[error("source has no view named {name}")]
    UnknownView {
        /// Requested view name.
        name: String,
    },
    /// The target view already carries different payload data.
    #[error("target view {view} already has payload data")]
    PayloadAlreadySet {
        /// Target view name.
        view: String,
    },
    /// A store primitive rejected an operation the plan had validated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
