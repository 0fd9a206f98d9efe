//! # Schema Registry
//!
//! The registry is the full nested template of a BRSR document. Each leaf
//! names the flat key its value is sourced from.
//!
//! ## Integrity Invariant
//!
//! Every flat key appears at exactly one position, and every object node
//! declares each field name once. Both are checked by
//! [`SchemaRegistry::new`]. A registry that fails the check is never
//! constructed, so consumers can rely on the mapping being well-defined in
//! both directions (flat to nested and nested to flat).
//!
//! ## Lifecycle
//!
//! Built once at startup, never mutated. Services hold it in an `Arc` and pass
//! it by reference to the transformer.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::Value;

use brsr_core::{BrsrError, FieldPath, LeafKind, LookupError, RegistryIntegrityError, SchemaNode};

/// Top-level section holding the nine principles.
pub const SECTION_C: &str = "sectionC";

/// The BRSR skeleton shipped with this crate.
const BUILTIN_SKELETON: &str = include_str!("../data/brsr_skeleton.json");

/// Returned by the soft-miss accessors.
static EMPTY_NODE: SchemaNode = SchemaNode::empty();

/// A verified, immutable schema tree with a reverse index from flat key to
/// position.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    root: SchemaNode,
    positions: HashMap<String, FieldPath>,
    array_leaves: usize,
}

impl SchemaRegistry {
    /// Verify `root` and build the registry.
    ///
    /// # Errors
    ///
    /// - `RootNotObject` if `root` is a leaf.
    /// - `EmptyFieldName` / `DottedFieldName` / `DuplicateField` for malformed
    ///   object nodes.
    /// - `EmptyFlatKey` / `DuplicateFlatKey` for malformed leaves.
    pub fn new(root: SchemaNode) -> Result<Self, RegistryIntegrityError> {
        if root.as_object().is_none() {
            return Err(RegistryIntegrityError::RootNotObject);
        }
        verify_fields(&root, &mut FieldPath::root())?;

        let mut positions: HashMap<String, FieldPath> = HashMap::with_capacity(root.leaf_count());
        let mut array_leaves = 0usize;

        for (path, leaf) in root.leaves() {
            if leaf.flat_key.is_empty() {
                return Err(RegistryIntegrityError::EmptyFlatKey {
                    path: path.to_string(),
                });
            }
            if leaf.violates_suffix_convention() {
                tracing::warn!(
                    path = %path,
                    flat_key = %leaf.flat_key,
                    kind = %leaf.kind,
                    "leaf kind disagrees with the _array key convention; declared kind wins"
                );
            }
            if leaf.kind == LeafKind::Array {
                array_leaves += 1;
            }
            match positions.entry(leaf.flat_key.clone()) {
                Entry::Occupied(existing) => {
                    return Err(RegistryIntegrityError::DuplicateFlatKey {
                        flat_key: leaf.flat_key.clone(),
                        first: existing.get().to_string(),
                        second: path.to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(path);
                }
            }
        }

        tracing::debug!(
            leaves = positions.len(),
            array_leaves,
            "schema registry verified"
        );

        Ok(Self {
            root,
            positions,
            array_leaves,
        })
    }

    /// Build a registry from skeleton JSON text.
    ///
    /// Parses directly from text so repeated field names are seen by the
    /// integrity check instead of being collapsed by a JSON map.
    ///
    /// # Errors
    ///
    /// Returns `RegistryIntegrityError::Malformed` if the text is not a
    /// skeleton document, otherwise any error from [`SchemaRegistry::new`].
    pub fn from_skeleton_str(skeleton: &str) -> Result<Self, RegistryIntegrityError> {
        let root: SchemaNode =
            serde_json::from_str(skeleton).map_err(|e| RegistryIntegrityError::Malformed {
                reason: e.to_string(),
            })?;
        Self::new(root)
    }

    /// Build a registry from an already-parsed skeleton value.
    ///
    /// # Errors
    ///
    /// As for [`SchemaRegistry::from_skeleton_str`].
    pub fn from_skeleton_value(skeleton: Value) -> Result<Self, RegistryIntegrityError> {
        let root: SchemaNode =
            serde_json::from_value(skeleton).map_err(|e| RegistryIntegrityError::Malformed {
                reason: e.to_string(),
            })?;
        Self::new(root)
    }

    /// Load a skeleton JSON file.
    ///
    /// # Errors
    ///
    /// Returns `BrsrError::Io` if the file cannot be read and
    /// `BrsrError::Registry` if it is not a valid registry.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, BrsrError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_skeleton_str(&content)?;
        tracing::info!(
            path = %path.display(),
            leaves = registry.leaf_count(),
            "loaded schema registry from file"
        );
        Ok(registry)
    }

    /// The BRSR registry embedded in this crate.
    ///
    /// # Errors
    ///
    /// Fails only if the embedded skeleton itself is corrupt, which the
    /// crate's tests rule out.
    pub fn builtin() -> Result<Self, RegistryIntegrityError> {
        Self::from_skeleton_str(BUILTIN_SKELETON)
    }

    /// The root object node.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Resolve a path from the root.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::PathNotFound` if any segment is missing.
    pub fn lookup(&self, path: &FieldPath) -> Result<&SchemaNode, LookupError> {
        self.root.lookup(path)
    }

    /// Resolve a dotted path such as `sectionA.employees.permanent`.
    ///
    /// # Errors
    ///
    /// Returns `BrsrError::Path` if the text is not a valid path and
    /// `BrsrError::Lookup` if it does not resolve.
    pub fn lookup_dotted(&self, dotted: &str) -> Result<&SchemaNode, BrsrError> {
        let path: FieldPath = dotted.parse()?;
        Ok(self.lookup(&path)?)
    }

    /// A top-level section, or an empty object node if there is none.
    pub fn section(&self, name: &str) -> &SchemaNode {
        self.root.child(name).unwrap_or(&EMPTY_NODE)
    }

    /// `principle{n}` under Section C, or an empty object node if there is
    /// none.
    pub fn principle(&self, n: i64) -> &SchemaNode {
        self.section(SECTION_C)
            .child(&format!("principle{n}"))
            .unwrap_or(&EMPTY_NODE)
    }

    /// Names of the top-level sections, in declaration order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.root
            .as_object()
            .unwrap_or_default()
            .iter()
            .map(|(name, _)| name.as_str())
    }

    /// Total number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of array leaves.
    pub fn array_leaf_count(&self) -> usize {
        self.array_leaves
    }

    /// Every flat key, in declaration order.
    pub fn flat_keys(&self) -> impl Iterator<Item = &str> {
        self.root.leaves().map(|(_, leaf)| leaf.flat_key.as_str())
    }

    /// Position of the leaf sourced from `flat_key`.
    pub fn position_of(&self, flat_key: &str) -> Option<&FieldPath> {
        self.positions.get(flat_key)
    }

    /// Returns true if some leaf is sourced from `flat_key`.
    pub fn contains_flat_key(&self, flat_key: &str) -> bool {
        self.positions.contains_key(flat_key)
    }

    /// Encode the registry back into skeleton form.
    pub fn to_skeleton(&self) -> Value {
        self.root.to_skeleton()
    }
}

/// Top-level section by name; empty object node if unknown.
pub fn get_section<'r>(registry: &'r SchemaRegistry, name: &str) -> &'r SchemaNode {
    registry.section(name)
}

/// Principle `n` of Section C; empty object node if unknown.
pub fn get_principle(registry: &SchemaRegistry, n: i64) -> &SchemaNode {
    registry.principle(n)
}

/// Reject empty, dotted and repeated field names, recursively.
fn verify_fields(node: &SchemaNode, path: &mut FieldPath) -> Result<(), RegistryIntegrityError> {
    let SchemaNode::Object(children) = node else {
        return Ok(());
    };

    let mut seen: HashSet<&str> = HashSet::with_capacity(children.len());
    for (name, child) in children {
        if name.is_empty() {
            return Err(RegistryIntegrityError::EmptyFieldName {
                path: path.to_string(),
            });
        }
        if name.contains('.') {
            return Err(RegistryIntegrityError::DottedFieldName {
                path: path.to_string(),
                field: name.clone(),
            });
        }
        if !seen.insert(name.as_str()) {
            return Err(RegistryIntegrityError::DuplicateField {
                path: path.to_string(),
                field: name.clone(),
            });
        }
        path.push(name.as_str());
        verify_fields(child, path)?;
        path.pop();
    }
    Ok(())
}
