//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types used throughout the BRSR toolkit. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Registry integrity errors are startup-time only. A registry that fails
//!   verification is never handed to a transformer.
//! - Lookup errors carry the full requested path and the first segment that
//!   could not be resolved.
//! - There is deliberately no per-request transform error. Missing keys,
//!   extra keys and mistyped array values are absorbed by the transformer.

use thiserror::Error;

/// Top-level error type for the BRSR toolkit.
#[derive(Error, Debug)]
pub enum BrsrError {
    /// The schema registry failed its integrity check.
    #[error("registry integrity error: {0}")]
    Registry(#[from] RegistryIntegrityError),

    /// A registry path did not resolve.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// The flat extraction payload could not be read.
    #[error("flat store error: {0}")]
    FlatStore(#[from] FlatStoreError),

    /// A dotted field path could not be parsed.
    #[error("path error: {0}")]
    Path(#[from] PathParseError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A schema registry that violates a structural invariant.
///
/// Raised once, while the registry is being constructed. Callers are expected
/// to treat it as fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryIntegrityError {
    /// Two leaves source their value from the same flat key.
    #[error("flat key '{flat_key}' is used by both '{first}' and '{second}'")]
    DuplicateFlatKey {
        /// The shared flat key.
        flat_key: String,
        /// Dotted position of the first leaf using the key.
        first: String,
        /// Dotted position of the second leaf using the key.
        second: String,
    },

    /// An object node declares the same field name twice.
    #[error("field '{field}' is declared more than once under '{path}'")]
    DuplicateField {
        /// Dotted position of the object node.
        path: String,
        /// The repeated field name.
        field: String,
    },

    /// A leaf has an empty flat key.
    #[error("leaf at '{path}' has an empty flat key")]
    EmptyFlatKey {
        /// Dotted position of the leaf.
        path: String,
    },

    /// An object node has a child with an empty field name.
    #[error("object at '{path}' has a child with an empty field name")]
    EmptyFieldName {
        /// Dotted position of the object node.
        path: String,
    },

    /// A field name contains the path separator, so its position could not
    /// be told apart from a nested one in dotted notation.
    #[error("field '{field}' under '{path}' contains '.'")]
    DottedFieldName {
        /// Dotted position of the object node.
        path: String,
        /// The offending field name.
        field: String,
    },

    /// The registry root must be an object node.
    #[error("registry root must be an object node")]
    RootNotObject,

    /// The skeleton document could not be decoded into schema nodes.
    #[error("malformed registry: {reason}")]
    Malformed {
        /// Description of the decoding failure.
        reason: String,
    },
}

/// Failure to resolve a path inside the schema registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// A path segment does not exist, or the path continues past a leaf.
    #[error("path '{path}' not found: no field '{missing}'")]
    PathNotFound {
        /// The full requested path, dotted.
        path: String,
        /// The first segment that did not resolve.
        missing: String,
    },
}

/// Failure to read an extraction payload into a [`crate::FlatStore`].
#[derive(Error, Debug)]
pub enum FlatStoreError {
    /// The payload parsed, but its top level is not a JSON object.
    #[error("flat store must be a JSON object, found {found}")]
    NotAnObject {
        /// JSON type name of the value that was supplied.
        found: &'static str,
    },

    /// The payload is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure to parse a dotted field path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathParseError {
    /// The path contains an empty segment (leading, trailing or doubled dot).
    #[error("path '{input}' contains an empty segment")]
    EmptySegment {
        /// The text that failed to parse.
        input: String,
    },
}
