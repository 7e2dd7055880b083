//! Model mapping utilities for converting azure_devops_rust_api types to our domain types.
//!
//! The generated work item type carries its fields as a loose JSON map keyed
//! by reference name; these conversions pull out the fields the CLI displays.

use crate::models::WorkItem;
use azure_devops_rust_api::wit::models as wit_models;

/// Convert azure_devops_rust_api WorkItem to our WorkItem model.
impl From<wit_models::WorkItem> for WorkItem {
    fn from(wi: wit_models::WorkItem) -> Self {
        let fields = &wi.fields;

        let string_field = |name: &str| {
            fields
                .get(name)
                .and_then(|v| v.as_str().map(String::from))
        };

        WorkItem {
            id: wi.id,
            title: string_field("System.Title"),
            state: string_field("System.State"),
            work_item_type: string_field("System.WorkItemType"),
            // AssignedTo is an identity object, not a plain string
            assigned_to: fields.get("System.AssignedTo").and_then(|v| {
                v.get("displayName")
                    .and_then(|name| name.as_str())
                    .map(String::from)
            }),
            area_path: string_field("System.AreaPath"),
            iteration_path: string_field("System.IterationPath"),
            description: string_field("System.Description"),
            steps_xml: string_field("Microsoft.VSTS.TCM.Steps"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Helper to create a WorkItem for testing
    fn create_test_work_item(id: i32, fields: serde_json::Value) -> wit_models::WorkItem {
        wit_models::WorkItem {
            work_item_tracking_resource: wit_models::WorkItemTrackingResource {
                work_item_tracking_resource_reference:
                    wit_models::WorkItemTrackingResourceReference { url: String::new() },
                links: None,
            },
            comment_version_ref: None,
            id,
            rev: None,
            fields,
            relations: vec![],
        }
    }

    /// # WorkItem Conversion - Full Fields
    ///
    /// Tests conversion of WorkItem with all fields populated.
    ///
    /// ## Test Scenario
    /// - Creates a WorkItem with all standard fields plus the steps document
    /// - Converts to our WorkItem model
    ///
    /// ## Expected Outcome
    /// - All fields are correctly extracted from JSON
    #[test]
    fn test_work_item_from_wit_work_item_full() {
        let fields = json!({
            "System.Title": "Login works",
            "System.State": "Design",
            "System.WorkItemType": "Test Case",
            "System.AssignedTo": {
                "displayName": "Jane Smith"
            },
            "System.AreaPath": "Shop\\Web",
            "System.IterationPath": "Shop\\Sprint 1",
            "System.Description": "Smoke test for the login flow",
            "Microsoft.VSTS.TCM.Steps": "<steps id=\"0\" last=\"0\"></steps>"
        });

        let wi = create_test_work_item(456, fields);
        let converted: WorkItem = wi.into();

        assert_eq!(converted.id, 456);
        assert_eq!(converted.title, Some("Login works".to_string()));
        assert_eq!(converted.state, Some("Design".to_string()));
        assert_eq!(converted.work_item_type, Some("Test Case".to_string()));
        assert_eq!(converted.assigned_to, Some("Jane Smith".to_string()));
        assert_eq!(converted.area_path, Some("Shop\\Web".to_string()));
        assert_eq!(converted.iteration_path, Some("Shop\\Sprint 1".to_string()));
        assert_eq!(
            converted.description,
            Some("Smoke test for the login flow".to_string())
        );
        assert_eq!(
            converted.steps_xml,
            Some("<steps id=\"0\" last=\"0\"></steps>".to_string())
        );
    }

    /// # WorkItem Conversion - Empty Fields
    ///
    /// Tests conversion of WorkItem with no fields.
    ///
    /// ## Test Scenario
    /// - Creates a WorkItem with an empty fields object
    /// - Converts to our WorkItem model
    ///
    /// ## Expected Outcome
    /// - All field values are None
    #[test]
    fn test_work_item_from_wit_work_item_empty_fields() {
        let wi = create_test_work_item(789, json!({}));
        let converted: WorkItem = wi.into();

        assert_eq!(converted.id, 789);
        assert!(converted.title.is_none());
        assert!(converted.state.is_none());
        assert!(converted.work_item_type.is_none());
        assert!(converted.assigned_to.is_none());
        assert!(converted.steps_xml.is_none());
    }

    /// # WorkItem Conversion - Non-String AssignedTo
    ///
    /// Tests that a malformed AssignedTo value is tolerated.
    ///
    /// ## Test Scenario
    /// - AssignedTo is a plain string instead of an identity object
    ///
    /// ## Expected Outcome
    /// - assigned_to is None, everything else converts normally
    #[test]
    fn test_work_item_assigned_to_shape() {
        let fields = json!({
            "System.Title": "Partial Item",
            "System.AssignedTo": "just-a-string"
        });
        let wi = create_test_work_item(111, fields);
        let converted: WorkItem = wi.into();

        assert_eq!(converted.title, Some("Partial Item".to_string()));
        assert!(converted.assigned_to.is_none());
    }
}
