//! # brsr-core: Foundational Types for the BRSR Toolkit
//!
//! Defines the data model shared by every other crate in the workspace:
//! the schema tree that describes a Business Responsibility and
//! Sustainability Report, the flat key/value store produced by extraction,
//! and the error hierarchy. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Explicit leaf kinds.** Scalar and array leaves are distinct
//!    [`LeafKind`] variants. The `_array` suffix on flat keys is only read
//!    when decoding a skeleton document; after that every consumer matches
//!    on the declared kind.
//!
//! 2. **Ordered objects.** [`SchemaNode::Object`] keeps its children in
//!    insertion order so that documents built from it serialize stably.
//!
//! 3. **Untrusted input stays untyped.** [`FlatStore`] holds raw
//!    `serde_json::Value`s. Nothing in this crate coerces or validates them.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `brsr-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod flat;
pub mod node;
pub mod path;

// Re-export primary types for ergonomic imports.
pub use error::{BrsrError, FlatStoreError, LookupError, PathParseError, RegistryIntegrityError};
pub use flat::FlatStore;
pub use node::{Leaf, LeafKind, SchemaNode, ARRAY_KEY_SUFFIX};
pub use path::FieldPath;
