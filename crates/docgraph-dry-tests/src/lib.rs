// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for docgraph crates.
#![forbid(unsafe_code)]
// Fixtures abort on misuse.
#![allow(clippy::expect_used)]
//!
//! # Modules
//!
//! - [`schema`] - Reference annotation schema and derived variants
//! - [`document`] - Store builder for annotated documents
//! - [`graphs`] - Chain, cycle and random graph shapes

pub mod document;
pub mod graphs;
pub mod schema;

pub use document::DocBuilder;
pub use graphs::{build_chain, build_cycle, build_random, chain_len, RandomGraph};
pub use schema::{
    annotation_schema, annotation_types, schema_from, with_range, without_field, without_type,
};
