//! Raw REST client for Azure DevOps endpoints not covered by the typed client.
//!
//! Handles WIQL queries, field and type listings, classification nodes,
//! attachment uploads and the test plan/suite endpoints. Authentication uses
//! Basic auth with an empty username and the PAT as password, which is the
//! scheme Azure DevOps expects for PATs.

use base64::Engine;
use reqwest::{Client, header::HeaderMap};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    ClassificationNode, ClassificationPath, FieldDefinition, NodeGroup, RelationTypeDefinition,
    SuiteTestCase, TestPlan, TestSuite, WorkItemTypeDefinition,
};

/// Standard list response envelope used by most Azure DevOps endpoints.
#[derive(Deserialize)]
struct ValueResponse<T> {
    value: Vec<T>,
}

#[derive(Clone)]
pub struct RestClient {
    client: Client,
    base_url: String,
    project: String,
    api_version: String,
}

impl RestClient {
    /// Creates a REST client bound to one organization and project.
    ///
    /// `organization_url` is the full organization URL, e.g.
    /// `https://dev.azure.com/contoso`.
    pub fn new(
        organization_url: &str,
        project: String,
        pat: &str,
        api_version: String,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = HeaderMap::new();
                let auth_value =
                    base64::engine::general_purpose::STANDARD.encode(format!(":{pat}"));
                headers.insert(
                    reqwest::header::AUTHORIZATION,
                    reqwest::header::HeaderValue::from_str(&format!("Basic {auth_value}"))
                        .map_err(|e| ApiError::ParseError {
                            message: format!("invalid authorization header: {e}"),
                        })?,
                );
                headers.insert(
                    reqwest::header::CONTENT_TYPE,
                    reqwest::header::HeaderValue::from_static("application/json"),
                );
                headers
            })
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: organization_url.trim_end_matches('/').to_string(),
            project,
            api_version,
        })
    }

    /// Builds an organization-scoped API URL.
    fn org_url(&self, path: &str) -> String {
        format!("{}/_apis/{}", self.base_url, path)
    }

    /// Builds a project-scoped API URL.
    fn project_url(&self, path: &str) -> String {
        format!("{}/{}/_apis/{}", self.base_url, self.project, path)
    }

    /// Turns a non-success response into the matching error.
    ///
    /// Errors are surfaced immediately with status and body; there is no
    /// retry layer.
    async fn check(response: reqwest::Response, resource: &str) -> ApiResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status.as_u16(), resource, body))
    }

    /// Decodes a JSON response body.
    async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::ParseError {
            message: e.to_string(),
        })
    }

    /// Runs a WIQL query and returns the matching work item ids.
    pub async fn query_wiql(&self, wiql: &str) -> ApiResult<Vec<i32>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct WiqlResponse {
            #[serde(default)]
            work_items: Vec<WiqlWorkItemRef>,
        }
        #[derive(Deserialize)]
        struct WiqlWorkItemRef {
            id: i32,
        }

        let url = self.project_url("wit/wiql");
        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .json(&serde_json::json!({ "query": wiql }))
            .send()
            .await?;
        let response = Self::check(response, "WIQL query").await?;
        let parsed: WiqlResponse = Self::decode(response).await?;

        debug!(matches = parsed.work_items.len(), "ran WIQL query");
        Ok(parsed.work_items.into_iter().map(|r| r.id).collect())
    }

    /// Checks whether a test case with exactly this title already exists.
    pub async fn test_case_exists(&self, title: &str) -> ApiResult<bool> {
        let wiql = format!(
            "SELECT [System.Id] FROM WorkItems \
             WHERE [System.TeamProject] = @project \
             AND [System.WorkItemType] = 'Test Case' \
             AND [System.Title] = '{}'",
            escape_wiql_literal(title)
        );
        let ids = self.query_wiql(&wiql).await?;
        Ok(!ids.is_empty())
    }

    /// Lists the work item field definitions of the project.
    pub async fn list_fields(&self) -> ApiResult<Vec<FieldDefinition>> {
        let url = self.project_url("wit/fields");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(response, "field definitions").await?;
        let parsed: ValueResponse<FieldDefinition> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Lists the work item types available in the project.
    pub async fn list_work_item_types(&self) -> ApiResult<Vec<WorkItemTypeDefinition>> {
        let url = self.project_url("wit/workitemtypes");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(response, "work item types").await?;
        let parsed: ValueResponse<WorkItemTypeDefinition> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Lists the work item relation types of the organization.
    pub async fn list_relation_types(&self) -> ApiResult<Vec<RelationTypeDefinition>> {
        let url = self.org_url("wit/workitemrelationtypes");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(response, "relation types").await?;
        let parsed: ValueResponse<RelationTypeDefinition> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Fetches the area or iteration tree, flattened to backslash paths.
    pub async fn list_classification_paths(
        &self,
        group: NodeGroup,
    ) -> ApiResult<Vec<ClassificationPath>> {
        let url = self.project_url(&format!(
            "wit/classificationnodes/{}",
            group.as_path_segment()
        ));
        let response = self
            .client
            .get(&url)
            .query(&[
                ("api-version", self.api_version.as_str()),
                ("$depth", "20"),
            ])
            .send()
            .await?;
        let response = Self::check(response, "classification nodes").await?;
        let root: ClassificationNode = Self::decode(response).await?;
        Ok(flatten_classification_tree(&root))
    }

    /// Uploads a file as a work item attachment and returns its URL.
    ///
    /// The returned URL is what gets linked onto a work item with an
    /// `AttachedFile` relation.
    pub async fn upload_attachment(&self, file_name: &str, bytes: Vec<u8>) -> ApiResult<String> {
        #[derive(Deserialize)]
        struct AttachmentResponse {
            url: String,
        }

        let url = self.project_url("wit/attachments");
        let response = self
            .client
            .post(&url)
            .query(&[
                ("fileName", file_name),
                ("api-version", self.api_version.as_str()),
            ])
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        let response = Self::check(response, "attachment upload").await?;
        let parsed: AttachmentResponse = Self::decode(response).await?;

        debug!(file_name, "uploaded attachment");
        Ok(parsed.url)
    }

    /// Lists the test plans of the project.
    pub async fn list_test_plans(&self) -> ApiResult<Vec<TestPlan>> {
        let url = self.project_url("test/plans");
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(response, "test plans").await?;
        let parsed: ValueResponse<TestPlan> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Lists the suites of a test plan.
    pub async fn list_test_suites(&self, plan_id: i32) -> ApiResult<Vec<TestSuite>> {
        let url = self.project_url(&format!("test/plans/{plan_id}/suites"));
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(response, &format!("test plan {plan_id}")).await?;
        let parsed: ValueResponse<TestSuite> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Lists the test cases of a suite.
    pub async fn list_suite_test_cases(
        &self,
        plan_id: i32,
        suite_id: i32,
    ) -> ApiResult<Vec<SuiteTestCase>> {
        let url = self.project_url(&format!("test/plans/{plan_id}/suites/{suite_id}/testcases"));
        let response = self
            .client
            .get(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        let response = Self::check(
            response,
            &format!("suite {suite_id} of test plan {plan_id}"),
        )
        .await?;
        let parsed: ValueResponse<SuiteTestCase> = Self::decode(response).await?;
        Ok(parsed.value)
    }

    /// Associates an existing test case with a suite.
    pub async fn add_test_case_to_suite(
        &self,
        plan_id: i32,
        suite_id: i32,
        test_case_id: i32,
    ) -> ApiResult<()> {
        let url = self.project_url(&format!(
            "test/plans/{plan_id}/suites/{suite_id}/testcases/{test_case_id}"
        ));
        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await?;
        Self::check(
            response,
            &format!("suite {suite_id} of test plan {plan_id}"),
        )
        .await?;

        debug!(plan_id, suite_id, test_case_id, "added test case to suite");
        Ok(())
    }
}

/// Escapes a string literal for use inside a WIQL query.
///
/// WIQL follows SQL quoting: a single quote inside a literal is doubled.
pub fn escape_wiql_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Flattens a classification tree into backslash-joined paths.
///
/// Iteration date attributes are carried along so sprint listings can show
/// their time window.
pub fn flatten_classification_tree(root: &ClassificationNode) -> Vec<ClassificationPath> {
    let mut paths = Vec::new();
    flatten_node(root, "", &mut paths);
    paths
}

fn flatten_node(node: &ClassificationNode, prefix: &str, out: &mut Vec<ClassificationPath>) {
    let path = if prefix.is_empty() {
        node.name.clone()
    } else {
        format!("{prefix}\\{}", node.name)
    };

    out.push(ClassificationPath {
        path: path.clone(),
        start_date: node
            .attributes
            .as_ref()
            .and_then(|a| a.start_date.clone()),
        finish_date: node
            .attributes
            .as_ref()
            .and_then(|a| a.finish_date.clone()),
    });

    for child in &node.children {
        flatten_node(child, &path, out);
    }
}
