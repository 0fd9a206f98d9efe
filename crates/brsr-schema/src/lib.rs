//! # brsr-schema: Schema Registry & Structure Transformer
//!
//! Maps the flat key/value output of the extraction step onto the nested
//! BRSR document consumed by the presentation layer.
//!
//! ## Registry (`registry`)
//!
//! [`SchemaRegistry`] owns the nested skeleton. It is verified once, at
//! construction, and is immutable afterwards: no two leaves may share a flat
//! key and no object may repeat a field name. The embedded BRSR skeleton is
//! available through [`SchemaRegistry::builtin`].
//!
//! Accessors come in two flavours:
//!
//! - [`SchemaRegistry::lookup`]: hard miss, returns `LookupError::PathNotFound`.
//! - [`SchemaRegistry::section`] / [`SchemaRegistry::principle`]: soft miss,
//!   return an empty object node.
//!
//! ## Transformer (`transform`)
//!
//! [`transform`] walks the schema, never the flat store. Every schema
//! position appears in the output: missing scalars become the configured
//! default, missing arrays become `[]`, and a non-list value at an array
//! leaf is wrapped in a one-element list. Flat keys the schema does not
//! mention are ignored.
//!
//! [`flatten`] is the reverse mapping, nested document to flat store.
//!
//! ## Crate Policy
//!
//! - Depends only on `brsr-core` internally.
//! - Transforms never fail and never mutate shared state. A registry can be
//!   shared across threads behind an `Arc` without locking.

pub mod flatten;
pub mod registry;
pub mod transform;

pub use flatten::flatten;
pub use registry::{get_principle, get_section, SchemaRegistry, SECTION_C};
pub use transform::{
    transform, transform_with, transform_with_report, MissingScalar, NestedDocument,
    TransformOptions, TransformReport, Transformer,
};
