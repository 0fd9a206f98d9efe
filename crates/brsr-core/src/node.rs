//! # Schema Nodes
//!
//! The schema is a tree. Internal nodes are ordered objects; terminal nodes
//! are leaves that name the flat key their value is sourced from, tagged with
//! whether that value is a scalar or an ordered sequence.
//!
//! ## Skeleton Encoding
//!
//! On disk the tree is a plain JSON document (the "skeleton"): objects are
//! objects, and each leaf is the flat-key string itself. Leaf kind is not
//! tagged in that format. Instead, a key ending in [`ARRAY_KEY_SUFFIX`]
//! decodes as [`LeafKind::Array`]. This is the only place the suffix is
//! interpreted; everything downstream matches on [`LeafKind`].
//!
//! Decoding keeps repeated field names rather than letting the last one win,
//! so that registry verification can reject them.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::LookupError;
use crate::path::FieldPath;

/// Flat-key suffix marking a list-valued field in skeleton documents.
pub const ARRAY_KEY_SUFFIX: &str = "_array";

/// Whether a leaf holds a single value or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    /// A single JSON value, copied as-is.
    Scalar,
    /// A JSON array; non-list values are wrapped in a one-element list.
    Array,
}

impl LeafKind {
    /// Infer the kind from the skeleton naming convention.
    pub fn from_flat_key(flat_key: &str) -> Self {
        if flat_key.ends_with(ARRAY_KEY_SUFFIX) {
            Self::Array
        } else {
            Self::Scalar
        }
    }

    /// Returns the kind name as a static string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Array => "array",
        }
    }
}

impl fmt::Display for LeafKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal schema node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Leaf {
    /// Scalar or array.
    pub kind: LeafKind,
    /// Key in the flat extraction store holding this leaf's value.
    pub flat_key: String,
}

impl Leaf {
    /// Returns true when the declared kind disagrees with the `_array`
    /// naming convention.
    pub fn violates_suffix_convention(&self) -> bool {
        LeafKind::from_flat_key(&self.flat_key) != self.kind
    }
}

/// A node in the report schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// Terminal node sourced from one flat key.
    Leaf(Leaf),
    /// Internal node. Children are kept in declaration order.
    Object(Vec<(String, SchemaNode)>),
}

impl SchemaNode {
    /// A scalar leaf sourced from `flat_key`.
    pub fn scalar(flat_key: impl Into<String>) -> Self {
        Self::Leaf(Leaf {
            kind: LeafKind::Scalar,
            flat_key: flat_key.into(),
        })
    }

    /// An array leaf sourced from `flat_key`.
    pub fn array(flat_key: impl Into<String>) -> Self {
        Self::Leaf(Leaf {
            kind: LeafKind::Array,
            flat_key: flat_key.into(),
        })
    }

    /// A leaf whose kind follows the `_array` suffix convention.
    pub fn from_skeleton_key(flat_key: impl Into<String>) -> Self {
        let flat_key = flat_key.into();
        Self::Leaf(Leaf {
            kind: LeafKind::from_flat_key(&flat_key),
            flat_key,
        })
    }

    /// An object node with the given children, in order.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, SchemaNode)>,
        K: Into<String>,
    {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// An object node with no children.
    pub const fn empty() -> Self {
        Self::Object(Vec::new())
    }

    /// Returns the leaf, if this node is terminal.
    pub fn as_leaf(&self) -> Option<&Leaf> {
        match self {
            Self::Leaf(leaf) => Some(leaf),
            Self::Object(_) => None,
        }
    }

    /// Returns the children, if this node is an object.
    pub fn as_object(&self) -> Option<&[(String, SchemaNode)]> {
        match self {
            Self::Leaf(_) => None,
            Self::Object(children) => Some(children),
        }
    }

    /// Returns true for an object node with no children.
    ///
    /// Leaves are never empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Object(children) if children.is_empty())
    }

    /// Look up a direct child by field name.
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.as_object()?
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    /// Resolve a path relative to this node.
    ///
    /// # Errors
    ///
    /// Returns `LookupError::PathNotFound` naming the first segment that does
    /// not exist. A path that continues past a leaf fails at the segment
    /// following the leaf.
    pub fn lookup(&self, path: &FieldPath) -> Result<&SchemaNode, LookupError> {
        let mut node = self;
        for segment in path {
            node = node
                .child(segment)
                .ok_or_else(|| LookupError::PathNotFound {
                    path: path.to_string(),
                    missing: segment.clone(),
                })?;
        }
        Ok(node)
    }

    /// Iterate over every leaf beneath this node in declaration order,
    /// paired with its path relative to this node.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves {
            pending_root: Some(self),
            stack: Vec::new(),
            path: FieldPath::root(),
        }
    }

    /// Number of leaves beneath this node (1 for a leaf).
    pub fn leaf_count(&self) -> usize {
        match self {
            Self::Leaf(_) => 1,
            Self::Object(children) => children.iter().map(|(_, n)| n.leaf_count()).sum(),
        }
    }

    /// Encode this node back into skeleton form.
    pub fn to_skeleton(&self) -> Value {
        match self {
            Self::Leaf(leaf) => Value::String(leaf.flat_key.clone()),
            Self::Object(children) => {
                let mut map = Map::with_capacity(children.len());
                for (name, node) in children {
                    map.insert(name.clone(), node.to_skeleton());
                }
                Value::Object(map)
            }
        }
    }
}

impl Default for SchemaNode {
    fn default() -> Self {
        Self::empty()
    }
}

/// Pre-order iterator over the leaves of a [`SchemaNode`].
///
/// Created by [`SchemaNode::leaves`].
#[derive(Debug)]
pub struct Leaves<'a> {
    pending_root: Option<&'a SchemaNode>,
    stack: Vec<std::slice::Iter<'a, (String, SchemaNode)>>,
    path: FieldPath,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (FieldPath, &'a Leaf);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.pending_root.take() {
            match root {
                SchemaNode::Leaf(leaf) => return Some((FieldPath::root(), leaf)),
                SchemaNode::Object(children) => self.stack.push(children.iter()),
            }
        }

        // `stack.len() == path.len() + 1` while iterating.
        loop {
            let children = self.stack.last_mut()?;
            match children.next() {
                Some((name, SchemaNode::Leaf(leaf))) => {
                    return Some((self.path.child(name), leaf));
                }
                Some((name, SchemaNode::Object(grandchildren))) => {
                    self.path.push(name.clone());
                    self.stack.push(grandchildren.iter());
                }
                None => {
                    self.stack.pop();
                    self.path.pop();
                }
            }
        }
    }
}

impl Serialize for SchemaNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(leaf) => serializer.serialize_str(&leaf.flat_key),
            Self::Object(children) => {
                let mut map = serializer.serialize_map(Some(children.len()))?;
                for (name, node) in children {
                    map.serialize_entry(name, node)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SchemaNodeVisitor)
    }
}

struct SchemaNodeVisitor;

impl<'de> Visitor<'de> for SchemaNodeVisitor {
    type Value = SchemaNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat-key string or an object of schema nodes")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(SchemaNode::from_skeleton_key(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(SchemaNode::from_skeleton_key(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut children = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((name, node)) = access.next_entry::<String, SchemaNode>()? {
            children.push((name, node));
        }
        Ok(SchemaNode::Object(children))
    }
}
