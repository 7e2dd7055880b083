use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::{ConfigError, ConfigResult},
    parsed_property::ParsedProperty,
};

/// Shared arguments used by all commands
#[derive(ClapArgs, Clone, Default, Debug)]
pub struct SharedArgs {
    // Azure DevOps Connection
    /// Azure DevOps organization URL, e.g. https://dev.azure.com/contoso
    #[arg(short = 'u', long, help_heading = "Azure DevOps Connection")]
    pub organization_url: Option<String>,

    /// Azure DevOps project name
    #[arg(short, long, help_heading = "Azure DevOps Connection")]
    pub project: Option<String>,

    /// Personal access token (prefer the AZURE_DEVOPS_PAT environment variable)
    #[arg(short = 't', long, help_heading = "Azure DevOps Connection")]
    pub pat: Option<String>,

    /// REST API version to request
    #[arg(long, help_heading = "Azure DevOps Connection")]
    pub api_version: Option<String>,

    /// Path to the credentials file (defaults to the XDG config location)
    #[arg(long, help_heading = "Azure DevOps Connection")]
    pub config: Option<PathBuf>,
}

/// Trait for accessing shared arguments from any command args struct
pub trait HasSharedArgs {
    fn shared(&self) -> &SharedArgs;
}

/// Output format for command results and progress reporting
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// Single JSON document written at the end
    Json,
    /// Newline-delimited JSON, one event per line
    Ndjson,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}

/// Classification node group selector
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeGroup {
    #[default]
    Areas,
    Iterations,
}

impl NodeGroup {
    /// URL path segment for the classification nodes endpoint.
    #[must_use]
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            NodeGroup::Areas => "areas",
            NodeGroup::Iterations => "iterations",
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "witkit",
    version = crate::FULL_VERSION,
    about = "Manage Azure DevOps work items and test cases from the command line",
    after_help = "Run 'witkit <COMMAND> --help' for command-specific examples."
)]
pub struct Args {
    /// Write a sample credentials file and exit
    #[arg(long)]
    pub create_config: bool,

    // Logging (parsed again early, before clap, so declared here only for help
    // output and validation)
    /// Minimum log level: trace, debug, info, warn, error
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_file: Option<PathBuf>,

    /// Write a per-run timestamped log file into this directory
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_dir: Option<PathBuf>,

    /// Log output format: text or json
    #[arg(long, global = true, help_heading = "Logging")]
    pub log_format: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, update and inspect work items
    #[command(visible_alias = "wi")]
    WorkItem(WorkItemArgs),

    /// Manage test cases and their steps
    #[command(visible_alias = "tc")]
    TestCase(TestCaseArgs),

    /// Bulk-import test cases from JSON or CSV files
    Import(ImportArgs),

    /// Browse test plans, suites and their test cases
    Plan(PlanArgs),

    /// List area or iteration paths of the project
    Nodes(NodesArgs),

    /// Inspect work item field definitions
    Fields(FieldsArgs),

    /// Run a WIQL query and print the matching work item ids
    Query(QueryArgs),
}

impl Commands {
    /// Access the shared connection arguments of whichever command was given.
    #[must_use]
    pub fn shared(&self) -> &SharedArgs {
        match self {
            Commands::WorkItem(args) => args.shared(),
            Commands::TestCase(args) => args.shared(),
            Commands::Import(args) => args.shared(),
            Commands::Plan(args) => args.shared(),
            Commands::Nodes(args) => args.shared(),
            Commands::Fields(args) => args.shared(),
            Commands::Query(args) => args.shared(),
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct WorkItemArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    #[command(subcommand)]
    pub command: WorkItemCommand,
}

impl HasSharedArgs for WorkItemArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(Subcommand, Debug)]
pub enum WorkItemCommand {
    /// Create a work item of any type
    #[command(after_help = "EXAMPLES:\n    \
        witkit work-item create -T Task --title \"Fix login redirect\"\n    \
        witkit work-item create -T \"User Story\" --title \"Checkout\" \
        -f System.AreaPath='Shop\\Web' --parent 1234")]
    Create {
        /// Work item type, e.g. Task, Bug, "User Story"
        #[arg(short = 'T', long)]
        work_item_type: String,

        /// Title of the new work item
        #[arg(long)]
        title: String,

        /// Extra field assignment as ReferenceName=value (repeatable)
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,

        /// Link the new item as a child of this work item
        #[arg(long)]
        parent: Option<i32>,
    },

    /// Create a bug with repro steps, severity and priority
    CreateBug {
        /// Title of the bug
        #[arg(long)]
        title: String,

        /// Steps to reproduce (HTML allowed)
        #[arg(long)]
        repro_steps: Option<String>,

        /// Severity, e.g. "2 - High"
        #[arg(long)]
        severity: Option<String>,

        /// Priority from 1 (highest) to 4
        #[arg(long)]
        priority: Option<i32>,

        /// Extra field assignment as ReferenceName=value (repeatable)
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },

    /// Update fields on an existing work item
    Update {
        /// Work item id
        id: i32,

        /// Field assignment as ReferenceName=value (repeatable)
        #[arg(
            short = 'f',
            long = "field",
            value_name = "NAME=VALUE",
            required = true
        )]
        fields: Vec<String>,
    },

    /// Show a work item
    Show {
        /// Work item id
        id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Upload a file and attach it to a work item
    Attach {
        /// Work item id
        id: i32,

        /// File to upload
        file: PathBuf,

        /// Comment stored on the attachment link
        #[arg(long)]
        comment: Option<String>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct TestCaseArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    #[command(subcommand)]
    pub command: TestCaseCommand,
}

impl HasSharedArgs for TestCaseArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(Subcommand, Debug)]
pub enum TestCaseCommand {
    /// Create a test case with ordered steps
    #[command(after_help = "EXAMPLES:\n    \
        witkit test-case create --title \"Login works\" \\\n        \
        -s \"Open the login page :: Login form is shown\" \\\n        \
        -s \"Submit valid credentials :: Dashboard is shown\"")]
    Create {
        /// Title of the test case
        #[arg(long)]
        title: String,

        /// Description of the test case
        #[arg(long)]
        description: Option<String>,

        /// Test step as "action :: expected result" (repeatable, ordered)
        #[arg(short = 's', long = "step", value_name = "ACTION :: EXPECTED")]
        steps: Vec<String>,

        /// Extra field assignment as ReferenceName=value (repeatable)
        #[arg(short = 'f', long = "field", value_name = "NAME=VALUE")]
        fields: Vec<String>,
    },

    /// Decode and print the steps of a test case
    ShowSteps {
        /// Test case work item id
        id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Replace all steps of a test case
    UpdateSteps {
        /// Test case work item id
        id: i32,

        /// Test step as "action :: expected result" (repeatable, ordered)
        #[arg(
            short = 's',
            long = "step",
            value_name = "ACTION :: EXPECTED",
            required = true
        )]
        steps: Vec<String>,
    },

    /// Append steps after the existing ones
    AddSteps {
        /// Test case work item id
        id: i32,

        /// Test step as "action :: expected result" (repeatable, ordered)
        #[arg(
            short = 's',
            long = "step",
            value_name = "ACTION :: EXPECTED",
            required = true
        )]
        steps: Vec<String>,
    },
}

#[derive(ClapArgs, Debug)]
#[command(after_help = "EXAMPLES:\n    \
    witkit import testcases.json\n    \
    witkit import ./drop-folder --archive-dir ./processed --output ndjson")]
pub struct ImportArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// A JSON/CSV file, or a directory scanned for such files
    pub path: PathBuf,

    /// Directory processed files are moved into
    #[arg(long)]
    pub archive_dir: Option<PathBuf>,

    /// Leave processed files in place
    #[arg(long)]
    pub no_archive: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Only print failures and the final summary
    #[arg(short, long)]
    pub quiet: bool,
}

impl HasSharedArgs for ImportArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(ClapArgs, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    #[command(subcommand)]
    pub command: PlanCommand,
}

impl HasSharedArgs for PlanArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// List the test plans of the project
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List the suites of a test plan
    Suites {
        /// Test plan id
        plan_id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List the test cases of a suite
    Cases {
        /// Test plan id
        plan_id: i32,

        /// Test suite id
        suite_id: i32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Associate an existing test case with a suite
    AddCase {
        /// Test plan id
        plan_id: i32,

        /// Test suite id
        suite_id: i32,

        /// Test case work item id
        test_case_id: i32,
    },
}

#[derive(ClapArgs, Debug)]
pub struct NodesArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// Classification group to list
    #[arg(long, value_enum, default_value_t = NodeGroup::Areas)]
    pub group: NodeGroup,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl HasSharedArgs for NodesArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(ClapArgs, Debug)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    #[command(subcommand)]
    pub command: FieldsCommand,
}

impl HasSharedArgs for FieldsArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

#[derive(Subcommand, Debug)]
pub enum FieldsCommand {
    /// List field names and reference names
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Generate a Rust module of field reference name constants
    Generate {
        /// Write the generated module to this path instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
pub struct QueryArgs {
    #[command(flatten)]
    pub shared: SharedArgs,

    /// WIQL query text
    #[arg(long)]
    pub wiql: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

impl HasSharedArgs for QueryArgs {
    fn shared(&self) -> &SharedArgs {
        &self.shared
    }
}

/// Fully resolved connection settings with source tracking
#[derive(Debug, Clone)]
pub struct SharedConfig {
    /// Organization URL, e.g. https://dev.azure.com/contoso
    pub organization_url: ParsedProperty<String>,
    /// Organization name derived from the URL
    pub organization: String,
    pub project: ParsedProperty<String>,
    pub pat: ParsedProperty<String>,
    pub api_version: ParsedProperty<String>,
    /// Default archive directory for processed import files
    pub archive_dir: Option<ParsedProperty<PathBuf>>,
}

impl SharedConfig {
    /// Resolve connection settings from all sources.
    ///
    /// Precedence, lowest to highest: credentials file, environment, CLI.
    pub fn resolve(args: &SharedArgs) -> ConfigResult<Self> {
        let file = Config::load_from_file(args.config.as_deref())?;
        let env = Config::load_from_env();
        let cli = Config::from_cli(args);
        file.merge(env).merge(cli).into_shared_config()
    }
}

/// Derive the organization name from an organization URL.
///
/// Accepts both URL shapes Azure DevOps uses:
/// `https://dev.azure.com/{organization}` and
/// `https://{organization}.visualstudio.com`.
pub fn organization_name(organization_url: &str) -> ConfigResult<String> {
    let parsed = url::Url::parse(organization_url).map_err(|e| ConfigError::InvalidValue {
        field: "organization_url".to_string(),
        message: e.to_string(),
    })?;

    let host = parsed.host_str().ok_or_else(|| ConfigError::InvalidValue {
        field: "organization_url".to_string(),
        message: format!("'{organization_url}' has no host"),
    })?;

    if let Some(account) = host.strip_suffix(".visualstudio.com") {
        return Ok(account.to_string());
    }

    parsed
        .path_segments()
        .and_then(|mut segments| segments.find(|s| !s.is_empty()).map(String::from))
        .ok_or_else(|| ConfigError::InvalidValue {
            field: "organization_url".to_string(),
            message: format!(
                "'{organization_url}' does not look like https://dev.azure.com/{{organization}}"
            ),
        })
}

/// Parse a `ReferenceName=value` CLI field assignment.
///
/// Numbers and booleans are passed through as JSON values so that numeric
/// fields like `Microsoft.VSTS.Common.Priority` get the type the API expects;
/// everything else stays a string.
pub fn parse_field_assignment(raw: &str) -> ConfigResult<(String, serde_json::Value)> {
    let (name, value) = raw.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
        field: "field".to_string(),
        message: format!("expected NAME=VALUE, got '{raw}'"),
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: "field".to_string(),
            message: format!("empty field name in '{raw}'"),
        });
    }

    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(parsed @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => parsed,
        _ => serde_json::Value::String(value.to_string()),
    };

    Ok((name.to_string(), value))
}

/// Parse an `ACTION :: EXPECTED` CLI step argument.
///
/// Without the separator the whole argument becomes the action and the
/// expected result is left empty.
#[must_use]
pub fn parse_step_argument(raw: &str) -> TestStep {
    match raw.split_once("::") {
        Some((action, expected)) => TestStep {
            action: action.trim().to_string(),
            expected: expected.trim().to_string(),
        },
        None => TestStep {
            action: raw.trim().to_string(),
            expected: String::new(),
        },
    }
}

/// One test step: an action and its expected result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStep {
    pub action: String,
    #[serde(default)]
    pub expected: String,
}

/// One test case record from an import file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCaseRecord {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub test_steps: Vec<TestStep>,

    /// Field reference name to value, applied verbatim on creation
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub additional_fields: serde_json::Map<String, serde_json::Value>,
}

/// A work item with the commonly displayed fields extracted
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkItem {
    pub id: i32,
    pub title: Option<String>,
    pub state: Option<String>,
    pub work_item_type: Option<String>,
    pub assigned_to: Option<String>,
    pub area_path: Option<String>,
    pub iteration_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Raw `Microsoft.VSTS.TCM.Steps` document, if present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps_xml: Option<String>,
}

/// A test plan as returned by the test management API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub area_path: Option<String>,
}

/// A test suite within a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSuite {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub suite_type: Option<String>,
    #[serde(default)]
    pub test_case_count: Option<i32>,
}

/// A test case reference inside a suite listing.
///
/// The suite membership endpoint returns work item ids as strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseRef {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// One entry of a suite test case listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteTestCase {
    #[serde(rename = "testCase")]
    pub test_case: TestCaseRef,
}

/// A work item field definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    pub name: String,
    pub reference_name: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
}

/// A work item type available in the project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItemTypeDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A work item relation type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationTypeDefinition {
    pub name: String,
    pub reference_name: String,
}

/// A node of the area or iteration tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationNode {
    pub name: String,
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub has_children: Option<bool>,
    #[serde(default)]
    pub children: Vec<ClassificationNode>,
    #[serde(default)]
    pub attributes: Option<NodeAttributes>,
}

/// Date attributes carried by iteration nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeAttributes {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub finish_date: Option<String>,
}

/// A flattened classification path, e.g. `Project\Team\Sprint 3`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationPath {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
}

/// Aggregate counts for an import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ImportSummary {
    /// Fold another summary into this one.
    pub fn absorb(&mut self, other: ImportSummary) {
        self.created += other.created;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }

    /// Total number of records seen.
    #[must_use]
    pub fn total(&self) -> usize {
        self.created + self.skipped + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// # CLI Definition Consistency
    ///
    /// Verifies the clap command tree is internally consistent.
    ///
    /// ## Test Scenario
    /// - Runs clap's debug assertions over the full Args definition
    ///
    /// ## Expected Outcome
    /// - No conflicting flags, missing values or invalid defaults
    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    /// # Organization Name Derivation
    ///
    /// Tests deriving the organization name from both URL shapes.
    ///
    /// ## Test Scenario
    /// - Parses dev.azure.com and visualstudio.com style URLs
    /// - Parses invalid and organization-less URLs
    ///
    /// ## Expected Outcome
    /// - Valid URLs yield the organization name
    /// - Invalid URLs yield a configuration error
    #[test]
    fn test_organization_name() {
        assert_eq!(
            organization_name("https://dev.azure.com/contoso").unwrap(),
            "contoso"
        );
        assert_eq!(
            organization_name("https://dev.azure.com/contoso/").unwrap(),
            "contoso"
        );
        assert_eq!(
            organization_name("https://contoso.visualstudio.com").unwrap(),
            "contoso"
        );
        assert!(organization_name("not a url").is_err());
        assert!(organization_name("https://dev.azure.com/").is_err());
    }

    /// # Field Assignment Parsing
    ///
    /// Tests parsing of NAME=VALUE field assignments.
    ///
    /// ## Test Scenario
    /// - Parses string, numeric and boolean values
    /// - Parses assignments with '=' inside the value
    /// - Parses malformed assignments
    ///
    /// ## Expected Outcome
    /// - Numbers and booleans become typed JSON values, strings stay strings
    /// - Missing '=' or empty names are rejected
    #[test]
    fn test_parse_field_assignment() {
        let (name, value) = parse_field_assignment("System.AreaPath=Shop\\Web").unwrap();
        assert_eq!(name, "System.AreaPath");
        assert_eq!(value, serde_json::json!("Shop\\Web"));

        let (_, value) = parse_field_assignment("Microsoft.VSTS.Common.Priority=2").unwrap();
        assert_eq!(value, serde_json::json!(2));

        let (_, value) = parse_field_assignment("Custom.Flag=true").unwrap();
        assert_eq!(value, serde_json::json!(true));

        // '=' inside the value belongs to the value
        let (name, value) = parse_field_assignment("Custom.Formula=a=b").unwrap();
        assert_eq!(name, "Custom.Formula");
        assert_eq!(value, serde_json::json!("a=b"));

        assert!(parse_field_assignment("no-separator").is_err());
        assert!(parse_field_assignment("=value").is_err());
    }

    /// # Step Argument Parsing
    ///
    /// Tests parsing of "ACTION :: EXPECTED" CLI step arguments.
    ///
    /// ## Test Scenario
    /// - Parses a full action/expected pair
    /// - Parses an argument without the separator
    ///
    /// ## Expected Outcome
    /// - Both halves are trimmed; a missing separator leaves expected empty
    #[test]
    fn test_parse_step_argument() {
        assert_eq!(
            parse_step_argument("Open the page :: Page is shown"),
            TestStep {
                action: "Open the page".to_string(),
                expected: "Page is shown".to_string(),
            }
        );
        assert_eq!(
            parse_step_argument("Just an action"),
            TestStep {
                action: "Just an action".to_string(),
                expected: String::new(),
            }
        );
    }

    /// # Import Record Deserialization
    ///
    /// Tests the JSON import record shape.
    ///
    /// ## Test Scenario
    /// - Deserializes a full record and a title-only record
    ///
    /// ## Expected Outcome
    /// - Optional members default cleanly when absent
    #[test]
    fn test_test_case_record_deserialization() {
        let json = r#"{
            "title": "Login works",
            "description": "Smoke test",
            "test_steps": [
                {"action": "Open the login page", "expected": "Login form is shown"}
            ],
            "additional_fields": {"Microsoft.VSTS.Common.Priority": 1}
        }"#;
        let record: TestCaseRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title, "Login works");
        assert_eq!(record.test_steps.len(), 1);
        assert_eq!(
            record.additional_fields.get("Microsoft.VSTS.Common.Priority"),
            Some(&serde_json::json!(1))
        );

        let record: TestCaseRecord = serde_json::from_str(r#"{"title": "Bare"}"#).unwrap();
        assert_eq!(record.title, "Bare");
        assert!(record.description.is_none());
        assert!(record.test_steps.is_empty());
        assert!(record.additional_fields.is_empty());
    }

    /// # Import Summary Aggregation
    ///
    /// Tests folding per-file summaries into a run summary.
    ///
    /// ## Test Scenario
    /// - Absorbs two summaries into an empty one
    ///
    /// ## Expected Outcome
    /// - Counts add up per category and in total
    #[test]
    fn test_import_summary_absorb() {
        let mut run = ImportSummary::default();
        run.absorb(ImportSummary {
            created: 3,
            skipped: 1,
            failed: 0,
        });
        run.absorb(ImportSummary {
            created: 2,
            skipped: 0,
            failed: 1,
        });
        assert_eq!(
            run,
            ImportSummary {
                created: 5,
                skipped: 1,
                failed: 1,
            }
        );
        assert_eq!(run.total(), 7);
    }
}
