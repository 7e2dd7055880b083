//! Typed Azure DevOps work item client built on the azure_devops_rust_api crate.
//!
//! This client covers work item tracking: creating and updating work items,
//! test cases and bugs, and managing the links between them. Endpoints the
//! crate does not model (WIQL, test plans, attachments) live in
//! [`super::rest::RestClient`].

use azure_devops_rust_api::wit;
use futures::stream::{self, StreamExt};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, warn};

use super::credential::PatCredential;
use crate::error::{ApiError, ApiResult};
use crate::models::{TestStep, WorkItem};
use crate::steps::build_steps_xml;

/// Fields requested when reading work items.
const WORK_ITEM_FIELDS: &str = "System.Title,System.State,System.WorkItemType,System.AssignedTo,\
    System.AreaPath,System.IterationPath,System.Description,Microsoft.VSTS.TCM.Steps";

/// The batch read endpoint accepts at most this many ids per request.
const BATCH_CHUNK_SIZE: usize = 200;

/// Maximum concurrent batch read requests.
const MAX_CONCURRENT_BATCHES: usize = 4;

/// Azure DevOps work item tracking client.
///
/// # Example
///
/// ```rust,no_run
/// use witkit::api::AzureDevOpsClient;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = AzureDevOpsClient::new(
///     "my-org".to_string(),
///     "my-project".to_string(),
///     "my-pat".to_string(),
/// )?;
///
/// let item = client.get_work_item(42).await?;
/// println!("{}: {:?}", item.id, item.title);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AzureDevOpsClient {
    organization: String,
    project: String,
    wit_client: wit::Client,
}

impl AzureDevOpsClient {
    /// Creates a new client from a plain-string PAT.
    pub fn new(organization: String, project: String, pat: String) -> ApiResult<Self> {
        Self::new_with_secret(organization, project, SecretString::from(pat))
    }

    /// Creates a new client with a SecretString PAT.
    ///
    /// This is the preferred constructor when the PAT is already wrapped.
    pub fn new_with_secret(
        organization: String,
        project: String,
        pat: SecretString,
    ) -> ApiResult<Self> {
        let credential = Arc::new(PatCredential::new(pat));
        let ado_credential = azure_devops_rust_api::Credential::TokenCredential(credential);

        let wit_client = wit::ClientBuilder::new(ado_credential).build();

        Ok(Self {
            organization,
            project,
            wit_client,
        })
    }

    /// Returns the organization name.
    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Returns the project name.
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Creates a work item of the given type.
    ///
    /// `fields` are applied verbatim as `/fields/{reference name}` patch
    /// operations; the server validates reference names and value types.
    pub async fn create_work_item(
        &self,
        work_item_type: &str,
        fields: &[(String, serde_json::Value)],
    ) -> ApiResult<WorkItem> {
        let patch = build_field_patch(fields);

        let created = self
            .wit_client
            .work_items_client()
            .create(&self.organization, patch, &self.project, work_item_type)
            .await?;

        debug!(id = ?created.id, work_item_type, "created work item");
        Ok(WorkItem::from(created))
    }

    /// Updates fields on an existing work item.
    ///
    /// Each field is a full replacement of that field's value.
    pub async fn update_work_item(
        &self,
        id: i32,
        fields: &[(String, serde_json::Value)],
    ) -> ApiResult<WorkItem> {
        let patch = build_field_patch(fields);

        let updated = self
            .wit_client
            .work_items_client()
            .update(&self.organization, patch, id, &self.project)
            .await?;

        debug!(id, count = fields.len(), "updated work item fields");
        Ok(WorkItem::from(updated))
    }

    /// Fetches a single work item.
    pub async fn get_work_item(&self, id: i32) -> ApiResult<WorkItem> {
        let response = self
            .wit_client
            .work_items_client()
            .list(&self.organization, id.to_string(), &self.project)
            .fields(WORK_ITEM_FIELDS)
            .await?;

        response
            .value
            .into_iter()
            .next()
            .map(WorkItem::from)
            .ok_or_else(|| ApiError::NotFound {
                resource: format!("work item {id}"),
            })
    }

    /// Fetches multiple work items, chunking requests to the batch limit.
    ///
    /// Chunks are fetched concurrently but results keep the id order.
    pub async fn get_work_items(&self, ids: &[i32]) -> ApiResult<Vec<WorkItem>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        let chunk_results: Vec<ApiResult<Vec<WorkItem>>> = stream::iter(
            ids.chunks(BATCH_CHUNK_SIZE).map(|chunk| {
                let client = self.clone();
                let ids_str = chunk
                    .iter()
                    .map(|i| i.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                async move {
                    let response = client
                        .wit_client
                        .work_items_client()
                        .list(&client.organization, &ids_str, &client.project)
                        .fields(WORK_ITEM_FIELDS)
                        .await?;
                    Ok(response.value.into_iter().map(WorkItem::from).collect())
                }
            }),
        )
        .buffered(MAX_CONCURRENT_BATCHES)
        .collect()
        .await;

        let mut work_items = Vec::with_capacity(ids.len());
        for chunk in chunk_results {
            work_items.extend(chunk?);
        }
        Ok(work_items)
    }

    /// Creates a test case work item with encoded steps.
    pub async fn create_test_case(
        &self,
        title: &str,
        description: Option<&str>,
        test_steps: &[TestStep],
        additional_fields: &[(String, serde_json::Value)],
    ) -> ApiResult<WorkItem> {
        let mut fields: Vec<(String, serde_json::Value)> = vec![(
            "System.Title".to_string(),
            serde_json::json!(title),
        )];
        if let Some(description) = description {
            fields.push((
                "System.Description".to_string(),
                serde_json::json!(description),
            ));
        }
        if !test_steps.is_empty() {
            fields.push((
                "Microsoft.VSTS.TCM.Steps".to_string(),
                serde_json::json!(build_steps_xml(test_steps)),
            ));
        }
        fields.extend_from_slice(additional_fields);

        self.create_work_item("Test Case", &fields).await
    }

    /// Replaces the full step sequence of a test case.
    pub async fn update_test_steps(&self, id: i32, test_steps: &[TestStep]) -> ApiResult<WorkItem> {
        let fields = [(
            "Microsoft.VSTS.TCM.Steps".to_string(),
            serde_json::json!(build_steps_xml(test_steps)),
        )];
        self.update_work_item(id, &fields).await
    }

    /// Appends steps after the existing ones.
    ///
    /// The stored document is decoded, extended and written back as a whole;
    /// the field is always replaced, never patched in place.
    pub async fn append_test_steps(&self, id: i32, new_steps: &[TestStep]) -> ApiResult<WorkItem> {
        let current = self.get_work_item(id).await?;
        let mut steps = current
            .steps_xml
            .as_deref()
            .map(crate::steps::parse_steps_xml)
            .unwrap_or_default();
        steps.extend_from_slice(new_steps);
        self.update_test_steps(id, &steps).await
    }

    /// Nudges the Azure DevOps UI into re-rendering the steps grid.
    ///
    /// The web UI caches the rendered steps per revision and only refreshes on
    /// a state transition, so the state is flipped to a sibling value and back.
    /// Purely cosmetic: any failure is logged and never fails the caller,
    /// since the steps themselves were already saved.
    pub async fn refresh_steps_view(&self, id: i32) {
        let current = match self.get_work_item(id).await {
            Ok(item) => item,
            Err(e) => {
                warn!(id, error = %e, "could not read state for steps view refresh");
                return;
            }
        };
        let Some(original_state) = current.state else {
            return;
        };

        let intermediate = refresh_transition_state(&original_state);

        let set_state = |state: String| {
            let fields = [("System.State".to_string(), serde_json::json!(state))];
            let client = self.clone();
            async move { client.update_work_item(id, &fields).await }
        };

        if let Err(e) = set_state(intermediate.to_string()).await {
            warn!(id, error = %e, "steps view refresh skipped, state unchanged");
            return;
        }
        if let Err(e) = set_state(original_state.clone()).await {
            warn!(
                id,
                state = intermediate,
                error = %e,
                "could not restore state {original_state} after steps view refresh"
            );
        }
    }

    /// Creates a work item and links it as a child of `parent_id`.
    ///
    /// If the link step fails the newly created item is deleted again so the
    /// operation never leaves an orphan behind.
    pub async fn create_child_work_item(
        &self,
        parent_id: i32,
        work_item_type: &str,
        fields: &[(String, serde_json::Value)],
    ) -> ApiResult<WorkItem> {
        let created = self.create_work_item(work_item_type, fields).await?;

        match self.link_parent(created.id, parent_id).await {
            Ok(()) => Ok(created),
            Err(link_error) => {
                if let Err(delete_error) = self.delete_work_item(created.id).await {
                    warn!(
                        id = created.id,
                        error = %delete_error,
                        "failed to clean up work item after link failure"
                    );
                }
                Err(link_error)
            }
        }
    }

    /// Links `child_id` to `parent_id` with a hierarchy relation.
    pub async fn link_parent(&self, child_id: i32, parent_id: i32) -> ApiResult<()> {
        let relation_url = format!(
            "https://dev.azure.com/{}/_apis/wit/workItems/{}",
            self.organization, parent_id
        );
        let patch = vec![wit::models::JsonPatchOperation {
            op: Some(wit::models::json_patch_operation::Op::Add),
            path: Some("/relations/-".to_string()),
            value: Some(serde_json::json!({
                "rel": "System.LinkTypes.Hierarchy-Reverse",
                "url": relation_url,
            })),
            from: None,
        }];

        self.wit_client
            .work_items_client()
            .update(&self.organization, patch, child_id, &self.project)
            .await?;

        Ok(())
    }

    /// Deletes a work item (moves it to the recycle bin).
    pub async fn delete_work_item(&self, id: i32) -> ApiResult<()> {
        self.wit_client
            .work_items_client()
            .delete(&self.organization, id, &self.project)
            .await?;
        Ok(())
    }

    /// Creates a bug with repro steps, severity and priority.
    pub async fn create_bug(
        &self,
        title: &str,
        repro_steps: Option<&str>,
        severity: Option<&str>,
        priority: Option<i32>,
        additional_fields: &[(String, serde_json::Value)],
    ) -> ApiResult<WorkItem> {
        let mut fields: Vec<(String, serde_json::Value)> = vec![(
            "System.Title".to_string(),
            serde_json::json!(title),
        )];
        if let Some(repro_steps) = repro_steps {
            fields.push((
                "Microsoft.VSTS.TCM.ReproSteps".to_string(),
                serde_json::json!(repro_steps),
            ));
        }
        if let Some(severity) = severity {
            fields.push((
                "Microsoft.VSTS.Common.Severity".to_string(),
                serde_json::json!(severity),
            ));
        }
        if let Some(priority) = priority {
            fields.push((
                "Microsoft.VSTS.Common.Priority".to_string(),
                serde_json::json!(priority),
            ));
        }
        fields.extend_from_slice(additional_fields);

        self.create_work_item("Bug", &fields).await
    }

    /// Links a previously uploaded attachment to a work item.
    ///
    /// `attachment_url` is the URL returned by the attachment upload endpoint.
    pub async fn add_attachment_link(
        &self,
        id: i32,
        attachment_url: &str,
        comment: Option<&str>,
    ) -> ApiResult<()> {
        let mut attributes = serde_json::Map::new();
        if let Some(comment) = comment {
            attributes.insert("comment".to_string(), serde_json::json!(comment));
        }

        let patch = vec![wit::models::JsonPatchOperation {
            op: Some(wit::models::json_patch_operation::Op::Add),
            path: Some("/relations/-".to_string()),
            value: Some(serde_json::json!({
                "rel": "AttachedFile",
                "url": attachment_url,
                "attributes": attributes,
            })),
            from: None,
        }];

        self.wit_client
            .work_items_client()
            .update(&self.organization, patch, id, &self.project)
            .await?;

        Ok(())
    }
}

/// Picks the sibling state used for the steps view refresh round trip.
///
/// "Ready" is valid for test cases in every stock process template, so it is
/// the intermediate of choice unless the item is already there.
fn refresh_transition_state(current: &str) -> &'static str {
    if current == "Ready" { "Design" } else { "Ready" }
}

/// Builds the JSON patch document for a set of field assignments.
fn build_field_patch(
    fields: &[(String, serde_json::Value)],
) -> Vec<wit::models::JsonPatchOperation> {
    fields
        .iter()
        .map(|(name, value)| wit::models::JsonPatchOperation {
            op: Some(wit::models::json_patch_operation::Op::Add),
            path: Some(format!("/fields/{name}")),
            value: Some(value.clone()),
            from: None,
        })
        .collect()
}
