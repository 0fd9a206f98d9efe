//! # Structure Transformer
//!
//! Builds the nested BRSR document from a flat extraction store.
//!
//! ## Algorithm
//!
//! Recursive descent over the schema, never over the flat store:
//!
//! - **Object node**: an object with the same field names, in schema order.
//!   An empty object node yields `{}`.
//! - **Scalar leaf**: the stored value copied as-is, including an explicit
//!   `null`. Absent keys yield [`MissingScalar`]'s value.
//! - **Array leaf**: a stored list is copied element-wise. A stored non-list
//!   value, including `null`, is wrapped as `[value]`. Absent keys yield `[]`.
//!
//! Flat keys that no leaf refers to are never read. The output never aliases
//! the store: every value is deep-copied.
//!
//! ## Totality
//!
//! The transform has no error path. Its running time is proportional to the
//! number of schema leaves and independent of the store's size.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use brsr_core::{FlatStore, Leaf, LeafKind, SchemaNode};

use crate::registry::SchemaRegistry;

/// The nested document handed to the presentation layer.
pub type NestedDocument = Value;

/// Value written at a scalar leaf whose flat key is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingScalar {
    /// `""`, matching the presentation layer's string-typed form fields.
    #[default]
    EmptyString,
    /// JSON `null`.
    Null,
}

impl MissingScalar {
    /// The JSON value to substitute.
    pub fn value(&self) -> Value {
        match self {
            Self::EmptyString => Value::String(String::new()),
            Self::Null => Value::Null,
        }
    }
}

/// Transformer policy knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformOptions {
    /// Substitute for absent scalar leaves.
    pub missing_scalar: MissingScalar,
}

/// Per-leaf outcome counts for one transform.
///
/// `filled + defaulted + normalized == leaves`. Flat keys outside the schema
/// are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// Leaves visited.
    pub leaves: usize,
    /// Leaves copied from the store unchanged.
    pub filled: usize,
    /// Leaves given the missing-value default.
    pub defaulted: usize,
    /// Array leaves whose non-list value was wrapped in a list.
    pub normalized: usize,
}

impl TransformReport {
    /// Fraction of leaves that received a value from the store.
    pub fn coverage(&self) -> f64 {
        if self.leaves == 0 {
            return 0.0;
        }
        (self.filled + self.normalized) as f64 / self.leaves as f64
    }
}

/// Transform with default options.
pub fn transform(schema: &SchemaNode, flat: &FlatStore) -> NestedDocument {
    transform_with(schema, flat, &TransformOptions::default())
}

/// Transform with explicit options.
pub fn transform_with(
    schema: &SchemaNode,
    flat: &FlatStore,
    options: &TransformOptions,
) -> NestedDocument {
    transform_with_report(schema, flat, options).0
}

/// Transform and count how each leaf was resolved.
pub fn transform_with_report(
    schema: &SchemaNode,
    flat: &FlatStore,
    options: &TransformOptions,
) -> (NestedDocument, TransformReport) {
    let mut report = TransformReport::default();
    let document = build(schema, flat, options, &mut report);
    (document, report)
}

fn build(
    node: &SchemaNode,
    flat: &FlatStore,
    options: &TransformOptions,
    report: &mut TransformReport,
) -> Value {
    match node {
        SchemaNode::Object(children) => {
            let mut map = Map::with_capacity(children.len());
            for (name, child) in children {
                map.insert(name.clone(), build(child, flat, options, report));
            }
            Value::Object(map)
        }
        SchemaNode::Leaf(leaf) => resolve_leaf(leaf, flat, options, report),
    }
}

fn resolve_leaf(
    leaf: &Leaf,
    flat: &FlatStore,
    options: &TransformOptions,
    report: &mut TransformReport,
) -> Value {
    report.leaves += 1;
    match (leaf.kind, flat.get(&leaf.flat_key)) {
        (LeafKind::Scalar, Some(value)) => {
            report.filled += 1;
            value.clone()
        }
        (LeafKind::Scalar, None) => {
            report.defaulted += 1;
            options.missing_scalar.value()
        }
        (LeafKind::Array, None) => {
            report.defaulted += 1;
            Value::Array(Vec::new())
        }
        (LeafKind::Array, Some(Value::Array(items))) => {
            report.filled += 1;
            Value::Array(items.clone())
        }
        (LeafKind::Array, Some(other)) => {
            report.normalized += 1;
            tracing::debug!(
                flat_key = %leaf.flat_key,
                "wrapping non-list value at array leaf in a single-element list"
            );
            Value::Array(vec![other.clone()])
        }
    }
}

/// A shared registry paired with a transform policy.
///
/// Cheap to clone; every clone reads the same registry. Each call allocates
/// its own output, so one `Transformer` can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Transformer {
    registry: Arc<SchemaRegistry>,
    options: TransformOptions,
}

impl Transformer {
    /// Pair a registry with options.
    pub fn new(registry: Arc<SchemaRegistry>, options: TransformOptions) -> Self {
        Self { registry, options }
    }

    /// The registry this transformer reads.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The active options.
    pub fn options(&self) -> &TransformOptions {
        &self.options
    }

    /// Build the full nested document.
    pub fn transform(&self, flat: &FlatStore) -> NestedDocument {
        transform_with(self.registry.root(), flat, &self.options)
    }

    /// Build the full nested document and report leaf outcomes.
    pub fn transform_with_report(&self, flat: &FlatStore) -> (NestedDocument, TransformReport) {
        transform_with_report(self.registry.root(), flat, &self.options)
    }

    /// Build one top-level section. Unknown sections yield `{}`.
    pub fn transform_section(&self, name: &str, flat: &FlatStore) -> NestedDocument {
        transform_with(self.registry.section(name), flat, &self.options)
    }

    /// Build one Section C principle. Unknown principles yield `{}`.
    pub fn transform_principle(&self, n: i64, flat: &FlatStore) -> NestedDocument {
        transform_with(self.registry.principle(n), flat, &self.options)
    }

    /// Map a nested document back to flat keys.
    pub fn flatten(&self, document: &Value) -> FlatStore {
        crate::flatten::flatten(self.registry.root(), document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn section_a() -> SchemaNode {
        SchemaNode::object([(
            "sectionA",
            SchemaNode::object([
                ("cin", SchemaNode::scalar("sectiona_cin")),
                ("paidUpCapital", SchemaNode::scalar("sectiona_paidUpCapital")),
                (
                    "businessActivities",
                    SchemaNode::array("sectiona_businessActivities_array"),
                ),
                (
                    "employees",
                    SchemaNode::object([(
                        "permanent",
                        SchemaNode::object([
                            ("male", SchemaNode::scalar("sectiona_employees_permanent_male")),
                            ("female", SchemaNode::scalar("sectiona_employees_permanent_female")),
                        ]),
                    )]),
                ),
                ("subsidiaries", SchemaNode::empty()),
            ]),
        )])
    }

    fn store(value: Value) -> FlatStore {
        FlatStore::from_value(value).unwrap()
    }

    #[test]
    fn single_field_example() {
        let schema = SchemaNode::object([(
            "sectionA",
            SchemaNode::object([("cin", SchemaNode::scalar("sectiona_cin"))]),
        )]);
        let doc = transform(&schema, &store(json!({"sectiona_cin": "L12345MH2020PLC123456"})));
        assert_eq!(doc, json!({"sectionA": {"cin": "L12345MH2020PLC123456"}}));

        let doc = transform(&schema, &FlatStore::new());
        assert_eq!(doc, json!({"sectionA": {"cin": ""}}));
    }

    #[test]
    fn empty_store_yields_complete_shape() {
        let doc = transform(&section_a(), &FlatStore::new());
        assert_eq!(
            doc,
            json!({
                "sectionA": {
                    "cin": "",
                    "paidUpCapital": "",
                    "businessActivities": [],
                    "employees": {"permanent": {"male": "", "female": ""}},
                    "subsidiaries": {}
                }
            })
        );
    }

    #[test]
    fn null_policy_applies_to_scalars_only() {
        let options = TransformOptions {
            missing_scalar: MissingScalar::Null,
        };
        let doc = transform_with(&section_a(), &FlatStore::new(), &options);
        assert_eq!(doc["sectionA"]["cin"], Value::Null);
        assert_eq!(doc["sectionA"]["businessActivities"], json!([]));
    }

    #[test]
    fn values_are_copied_without_coercion() {
        let doc = transform(
            &section_a(),
            &store(json!({
                "sectiona_paidUpCapital": "12,00,000",
                "sectiona_employees_permanent_male": 120,
                "sectiona_employees_permanent_female": {"count": 80},
                "sectiona_cin": null
            })),
        );
        assert_eq!(doc["sectionA"]["paidUpCapital"], json!("12,00,000"));
        assert_eq!(doc["sectionA"]["employees"]["permanent"]["male"], json!(120));
        assert_eq!(
            doc["sectionA"]["employees"]["permanent"]["female"],
            json!({"count": 80})
        );
        assert_eq!(doc["sectionA"]["cin"], Value::Null);
    }

    #[test]
    fn array_leaf_copies_lists() {
        let activities = json!([
            {"mainActivity": "Manufacturing", "businessDescription": "Steel", "turnoverPercent": "80"},
            {"mainActivity": "Trading", "businessDescription": "Scrap", "turnoverPercent": "20"}
        ]);
        let doc = transform(
            &section_a(),
            &store(json!({"sectiona_businessActivities_array": activities.clone()})),
        );
        assert_eq!(doc["sectionA"]["businessActivities"], activities);
    }

    #[test]
    fn array_leaf_wraps_scalars() {
        for scalar in [json!("Manufacturing of steel"), json!(3), json!(false), json!({"a": 1})] {
            let doc = transform(
                &section_a(),
                &store(json!({"sectiona_businessActivities_array": scalar.clone()})),
            );
            assert_eq!(doc["sectionA"]["businessActivities"], json!([scalar]));
        }
    }

    #[test]
    fn null_is_a_present_value_for_both_leaf_kinds() {
        let schema = SchemaNode::object([
            ("list", SchemaNode::array("k_array")),
            ("text", SchemaNode::scalar("k_text")),
        ]);
        let (doc, report) = transform_with_report(
            &schema,
            &store(json!({"k_array": null, "k_text": null})),
            &TransformOptions::default(),
        );
        assert_eq!(doc, json!({"list": [null], "text": null}));
        assert_eq!(report.normalized, 1);
        assert_eq!(report.filled, 1);
        assert_eq!(report.defaulted, 0);
    }

    #[test]
    fn declared_kind_drives_behaviour_not_suffix() {
        let schema = SchemaNode::object([
            ("list", SchemaNode::array("sectionc_list")),
            ("text", SchemaNode::scalar("sectionc_text_array")),
        ]);
        let doc = transform(
            &schema,
            &store(json!({"sectionc_list": "one", "sectionc_text_array": "two"})),
        );
        assert_eq!(doc, json!({"list": ["one"], "text": "two"}));
    }

    #[test]
    fn extra_keys_are_ignored() {
        let base = store(json!({"sectiona_cin": "L1"}));
        let mut noisy = base.clone();
        noisy.insert("sectiona_unknownField", json!("x"));
        noisy.insert("sectionz_whatever_array", json!([1, 2]));
        let (a, report_a) = transform_with_report(&section_a(), &base, &TransformOptions::default());
        let (b, report_b) = transform_with_report(&section_a(), &noisy, &TransformOptions::default());
        assert_eq!(a, b);
        assert_eq!(report_a, report_b);
    }

    #[test]
    fn output_preserves_schema_order() {
        let doc = transform(&section_a(), &FlatStore::new());
        let keys: Vec<&str> = doc["sectionA"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(
            keys,
            ["cin", "paidUpCapital", "businessActivities", "employees", "subsidiaries"]
        );
    }

    #[test]
    fn output_does_not_alias_store() {
        let mut flat = store(json!({"sectiona_businessActivities_array": [{"name": "a"}]}));
        let doc = transform(&section_a(), &flat);
        flat.insert("sectiona_businessActivities_array", json!([{"name": "changed"}]));
        assert_eq!(doc["sectionA"]["businessActivities"], json!([{"name": "a"}]));
    }

    #[test]
    fn report_counts_each_outcome() {
        let (_, report) = transform_with_report(
            &section_a(),
            &store(json!({
                "sectiona_cin": "L1",
                "sectiona_businessActivities_array": "single",
                "not_in_schema": 1
            })),
            &TransformOptions::default(),
        );
        assert_eq!(
            report,
            TransformReport {
                leaves: 5,
                filled: 1,
                defaulted: 3,
                normalized: 1,
            }
        );
        assert!((report.coverage() - 0.4).abs() < 1e-9);
        assert_eq!(TransformReport::default().coverage(), 0.0);
    }

    #[test]
    fn options_deserialize_from_snake_case() {
        let options: TransformOptions = serde_json::from_value(json!({"missing_scalar": "null"})).unwrap();
        assert_eq!(options.missing_scalar, MissingScalar::Null);
        let options: TransformOptions = serde_json::from_value(json!({})).unwrap();
        assert_eq!(options, TransformOptions::default());
        assert!(serde_json::from_value::<TransformOptions>(json!({"missing": "null"})).is_err());
    }

    #[test]
    fn transformer_scopes_to_sections_and_principles() {
        let registry = SchemaRegistry::new(SchemaNode::object([
            ("sectionA", SchemaNode::object([("cin", SchemaNode::scalar("sectiona_cin"))])),
            (
                "sectionC",
                SchemaNode::object([(
                    "principle3",
                    SchemaNode::object([("q1", SchemaNode::array("sectionc_principle3_q1_array"))]),
                )]),
            ),
        ]))
        .unwrap();
        let transformer = Transformer::new(Arc::new(registry), TransformOptions::default());
        let flat = store(json!({"sectiona_cin": "L1", "sectionc_principle3_q1_array": ["x"]}));

        assert_eq!(transformer.transform_section("sectionA", &flat), json!({"cin": "L1"}));
        assert_eq!(transformer.transform_section("sectionB", &flat), json!({}));
        assert_eq!(transformer.transform_principle(3, &flat), json!({"q1": ["x"]}));
        assert_eq!(transformer.transform_principle(99, &flat), json!({}));

        let full = transformer.transform(&flat);
        assert_eq!(transformer.flatten(&full), flat);
    }
}
