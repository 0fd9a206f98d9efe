//! # Nested-to-Flat Mapping
//!
//! The reverse of [`crate::transform`]: reads each schema leaf's position out
//! of a nested document and stores the value under the leaf's flat key. Used
//! to turn an edited report back into the extractor's key space.
//!
//! Positions absent from the document produce no entry. Parts of the
//! document the schema does not describe are ignored.

use serde_json::Value;

use brsr_core::{FieldPath, FlatStore, SchemaNode};

/// Collect every leaf value present in `document` into a flat store,
/// in schema order.
pub fn flatten(schema: &SchemaNode, document: &Value) -> FlatStore {
    let mut flat = FlatStore::new();
    for (path, leaf) in schema.leaves() {
        if let Some(value) = value_at(document, &path) {
            flat.insert(leaf.flat_key.clone(), value.clone());
        }
    }
    flat
}

/// Follow `path` through nested objects.
fn value_at<'a>(document: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(document, |value, segment| value.get(segment.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaNode {
        SchemaNode::object([(
            "sectionB",
            SchemaNode::object([
                (
                    "policyMatrix",
                    SchemaNode::object([(
                        "p1",
                        SchemaNode::object([
                            ("hasPolicy", SchemaNode::scalar("sectionb_policymatrix_p1_hasPolicy")),
                            ("webLink", SchemaNode::scalar("sectionb_policymatrix_p1_webLink")),
                        ]),
                    )]),
                ),
                ("certifications", SchemaNode::array("sectionb_certifications_array")),
            ]),
        )])
    }

    #[test]
    fn collects_present_leaves() {
        let doc = json!({
            "sectionB": {
                "policyMatrix": {"p1": {"hasPolicy": "Yes", "webLink": "https://example.com/p1"}},
                "certifications": ["ISO 14001"]
            }
        });
        let flat = flatten(&schema(), &doc);
        assert_eq!(
            flat.into_value(),
            json!({
                "sectionb_policymatrix_p1_hasPolicy": "Yes",
                "sectionb_policymatrix_p1_webLink": "https://example.com/p1",
                "sectionb_certifications_array": ["ISO 14001"]
            })
        );
    }

    #[test]
    fn skips_missing_positions_and_unknown_fields() {
        let doc = json!({
            "sectionB": {
                "policyMatrix": {"p1": {"hasPolicy": "No"}, "p2": {"hasPolicy": "Yes"}},
                "notes": "free text"
            },
            "sectionZ": {}
        });
        let flat = flatten(&schema(), &doc);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.get("sectionb_policymatrix_p1_hasPolicy"), Some(&json!("No")));
    }

    #[test]
    fn non_object_intermediate_stops_descent() {
        let doc = json!({"sectionB": {"policyMatrix": "n/a"}});
        assert!(flatten(&schema(), &doc).is_empty());
        assert!(flatten(&schema(), &json!(null)).is_empty());
    }

    #[test]
    fn present_nulls_are_kept() {
        let doc = json!({"sectionB": {"policyMatrix": {"p1": {"webLink": null}}}});
        let flat = flatten(&schema(), &doc);
        assert_eq!(flat.get("sectionb_policymatrix_p1_webLink"), Some(&Value::Null));
    }
}
