use std::io;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use secrecy::SecretString;
use tracing::{debug, info};

use witkit::{
    api::{AzureDevOpsClient, RestClient},
    config::Config,
    error::{WitkitError, WitkitResult},
    import::{AzureDevOpsTarget, Importer},
    logging,
    models::{
        Args, Commands, FieldsCommand, ImportArgs, NodesArgs, OutputFormat, PlanCommand,
        QueryArgs, SharedConfig, TestCaseCommand, TestStep, WorkItem, WorkItemCommand,
        parse_field_assignment, parse_step_argument,
    },
    output::OutputWriter,
    steps::parse_steps_xml,
};

#[tokio::main]
async fn main() {
    // Logging has to be up before clap runs so that argument parsing
    // failures and config errors are captured too.
    let raw_args: Vec<String> = std::env::args().collect();
    let log_config = logging::parse_early_log_config(&raw_args);
    let _log_guard = logging::init_logging(log_config);

    if let Err(error) = run().await {
        tracing::error!(error = %error, "command failed");
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> WitkitResult<()> {
    let args = Args::parse();

    if args.create_config {
        let path = Config::create_sample_config()?;
        println!("Credentials file at {}", path.display());
        println!("Fill in organization_url, project and personal_access_token.");
        return Ok(());
    }

    let Some(command) = args.command else {
        Args::command()
            .print_help()
            .map_err(|e| WitkitError::Other(e.into()))?;
        return Ok(());
    };

    let config = SharedConfig::resolve(command.shared())?;
    debug!(
        organization = %config.organization,
        project = %config.project.value(),
        organization_source = config.organization_url.source_name(),
        pat_source = config.pat.source_name(),
        "resolved connection settings"
    );

    let client = AzureDevOpsClient::new_with_secret(
        config.organization.clone(),
        config.project.value().clone(),
        SecretString::from(config.pat.value().clone()),
    )?;
    let rest = RestClient::new(
        config.organization_url.value(),
        config.project.value().clone(),
        config.pat.value(),
        config.api_version.value().clone(),
    )?;

    match command {
        Commands::WorkItem(args) => run_work_item(&client, &rest, args.command).await,
        Commands::TestCase(args) => run_test_case(&client, args.command).await,
        Commands::Import(args) => run_import(client, rest, &config, args).await,
        Commands::Plan(args) => run_plan(&rest, args.command).await,
        Commands::Nodes(args) => run_nodes(&rest, args).await,
        Commands::Fields(args) => run_fields(&rest, args.command).await,
        Commands::Query(args) => run_query(&rest, args).await,
    }
}

async fn run_work_item(
    client: &AzureDevOpsClient,
    rest: &RestClient,
    command: WorkItemCommand,
) -> WitkitResult<()> {
    match command {
        WorkItemCommand::Create {
            work_item_type,
            title,
            fields,
            parent,
        } => {
            let mut patch = vec![("System.Title".to_string(), serde_json::json!(title))];
            patch.extend(parse_fields(&fields)?);

            let created = match parent {
                Some(parent_id) => {
                    client
                        .create_child_work_item(parent_id, &work_item_type, &patch)
                        .await?
                }
                None => client.create_work_item(&work_item_type, &patch).await?,
            };
            info!(id = created.id, "created work item");
            println!("Created {} #{}", work_item_type, created.id);
            if let Some(parent_id) = parent {
                println!("Linked as child of #{parent_id}");
            }
        }

        WorkItemCommand::CreateBug {
            title,
            repro_steps,
            severity,
            priority,
            fields,
        } => {
            let extra = parse_fields(&fields)?;
            let created = client
                .create_bug(
                    &title,
                    repro_steps.as_deref(),
                    severity.as_deref(),
                    priority,
                    &extra,
                )
                .await?;
            info!(id = created.id, "created bug");
            println!("Created Bug #{}", created.id);
        }

        WorkItemCommand::Update { id, fields } => {
            let patch = parse_fields(&fields)?;
            let updated = client.update_work_item(id, &patch).await?;
            println!("Updated work item #{}", updated.id);
        }

        WorkItemCommand::Show { id, output } => {
            let item = client.get_work_item(id).await?;
            print_work_item(&item, output)?;
        }

        WorkItemCommand::Attach { id, file, comment } => {
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| {
                    WitkitError::Other(anyhow::anyhow!(
                        "cannot derive a file name from {}",
                        file.display()
                    ))
                })?
                .to_string();
            let bytes = std::fs::read(&file).map_err(|e| {
                WitkitError::Other(anyhow::anyhow!("failed to read {}: {e}", file.display()))
            })?;

            let url = rest.upload_attachment(&file_name, bytes).await?;
            client
                .add_attachment_link(id, &url, comment.as_deref())
                .await?;
            println!("Attached {file_name} to work item #{id}");
        }
    }
    Ok(())
}

async fn run_test_case(client: &AzureDevOpsClient, command: TestCaseCommand) -> WitkitResult<()> {
    match command {
        TestCaseCommand::Create {
            title,
            description,
            steps,
            fields,
        } => {
            let test_steps: Vec<TestStep> = steps.iter().map(|s| parse_step_argument(s)).collect();
            let extra = parse_fields(&fields)?;
            let created = client
                .create_test_case(&title, description.as_deref(), &test_steps, &extra)
                .await?;
            info!(id = created.id, steps = test_steps.len(), "created test case");
            println!(
                "Created Test Case #{} with {} step(s)",
                created.id,
                test_steps.len()
            );
        }

        TestCaseCommand::ShowSteps { id, output } => {
            let item = client.get_work_item(id).await?;
            let steps = item
                .steps_xml
                .as_deref()
                .map(parse_steps_xml)
                .unwrap_or_default();
            print_steps(&steps, output)?;
        }

        TestCaseCommand::UpdateSteps { id, steps } => {
            let test_steps: Vec<TestStep> = steps.iter().map(|s| parse_step_argument(s)).collect();
            client.update_test_steps(id, &test_steps).await?;
            client.refresh_steps_view(id).await;
            println!(
                "Replaced steps of test case #{id} ({} step(s))",
                test_steps.len()
            );
        }

        TestCaseCommand::AddSteps { id, steps } => {
            let test_steps: Vec<TestStep> = steps.iter().map(|s| parse_step_argument(s)).collect();
            let updated = client.append_test_steps(id, &test_steps).await?;
            client.refresh_steps_view(id).await;
            let total = updated
                .steps_xml
                .as_deref()
                .map(|xml| parse_steps_xml(xml).len())
                .unwrap_or_default();
            println!("Appended {} step(s) to test case #{id} ({total} total)", test_steps.len());
        }
    }
    Ok(())
}

async fn run_import(
    client: AzureDevOpsClient,
    rest: RestClient,
    config: &SharedConfig,
    args: ImportArgs,
) -> WitkitResult<()> {
    let archive_dir: Option<PathBuf> = if args.no_archive {
        None
    } else {
        args.archive_dir
            .clone()
            .or_else(|| config.archive_dir.as_ref().map(|p| p.value().clone()))
            .or_else(|| default_archive_dir(&args.path))
    };

    let mut writer = OutputWriter::new(io::stdout(), args.output, args.quiet);
    let mut importer = Importer::new(AzureDevOpsTarget::new(client, rest));
    let summary = importer
        .import_path(&args.path, archive_dir.as_deref(), &mut writer)
        .await?;

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Default archive location: an `archive` directory next to the import path.
fn default_archive_dir(import_path: &Path) -> Option<PathBuf> {
    let base = if import_path.is_dir() {
        import_path
    } else {
        import_path.parent()?
    };
    Some(base.join("archive"))
}

async fn run_plan(rest: &RestClient, command: PlanCommand) -> WitkitResult<()> {
    match command {
        PlanCommand::List { output } => {
            let plans = rest.list_test_plans().await?;
            match output {
                OutputFormat::Text => {
                    for plan in &plans {
                        let state = plan.state.as_deref().unwrap_or("-");
                        println!("#{:<8} {:<12} {}", plan.id, state, plan.name);
                    }
                }
                _ => print_json(&plans, output)?,
            }
        }

        PlanCommand::Suites { plan_id, output } => {
            let suites = rest.list_test_suites(plan_id).await?;
            match output {
                OutputFormat::Text => {
                    for suite in &suites {
                        let kind = suite.suite_type.as_deref().unwrap_or("-");
                        let count = suite
                            .test_case_count
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        println!("#{:<8} {:<20} {:>5}  {}", suite.id, kind, count, suite.name);
                    }
                }
                _ => print_json(&suites, output)?,
            }
        }

        PlanCommand::Cases {
            plan_id,
            suite_id,
            output,
        } => {
            let cases = rest.list_suite_test_cases(plan_id, suite_id).await?;
            match output {
                OutputFormat::Text => {
                    for case in &cases {
                        let name = case.test_case.name.as_deref().unwrap_or("");
                        println!("#{:<8} {}", case.test_case.id, name);
                    }
                }
                _ => print_json(&cases, output)?,
            }
        }

        PlanCommand::AddCase {
            plan_id,
            suite_id,
            test_case_id,
        } => {
            rest.add_test_case_to_suite(plan_id, suite_id, test_case_id)
                .await?;
            println!("Added test case #{test_case_id} to suite #{suite_id} of plan #{plan_id}");
        }
    }
    Ok(())
}

async fn run_nodes(rest: &RestClient, args: NodesArgs) -> WitkitResult<()> {
    let paths = rest.list_classification_paths(args.group).await?;
    match args.output {
        OutputFormat::Text => {
            for node in &paths {
                match (&node.start_date, &node.finish_date) {
                    (Some(start), Some(finish)) => {
                        println!("{}  [{} .. {}]", node.path, start, finish)
                    }
                    _ => println!("{}", node.path),
                }
            }
        }
        output => print_json(&paths, output)?,
    }
    Ok(())
}

async fn run_fields(rest: &RestClient, command: FieldsCommand) -> WitkitResult<()> {
    match command {
        FieldsCommand::List { output } => {
            let fields = rest.list_fields().await?;
            match output {
                OutputFormat::Text => {
                    for field in &fields {
                        let field_type = field.field_type.as_deref().unwrap_or("-");
                        println!("{:<50} {:<10} {}", field.reference_name, field_type, field.name);
                    }
                }
                _ => print_json(&fields, output)?,
            }
        }

        FieldsCommand::Generate { out } => {
            let types = rest.list_work_item_types().await?;
            let fields = rest.list_fields().await?;
            let relations = rest.list_relation_types().await?;
            let module = witkit::constants_gen::render_constants_module(&types, &fields, &relations);

            match out {
                Some(path) => {
                    std::fs::write(&path, module).map_err(|e| {
                        WitkitError::Other(anyhow::anyhow!(
                            "failed to write {}: {e}",
                            path.display()
                        ))
                    })?;
                    println!("Wrote constants module to {}", path.display());
                }
                None => print!("{module}"),
            }
        }
    }
    Ok(())
}

async fn run_query(rest: &RestClient, args: QueryArgs) -> WitkitResult<()> {
    let ids = rest.query_wiql(&args.wiql).await?;
    match args.output {
        OutputFormat::Text => {
            for id in &ids {
                println!("{id}");
            }
            eprintln!("{} work item(s)", ids.len());
        }
        output => print_json(&ids, output)?,
    }
    Ok(())
}

fn parse_fields(raw: &[String]) -> WitkitResult<Vec<(String, serde_json::Value)>> {
    raw.iter()
        .map(|f| parse_field_assignment(f).map_err(WitkitError::Config))
        .collect()
}

fn print_work_item(item: &WorkItem, output: OutputFormat) -> WitkitResult<()> {
    match output {
        OutputFormat::Text => {
            println!("#{}", item.id);
            print_field("Type", item.work_item_type.as_deref());
            print_field("Title", item.title.as_deref());
            print_field("State", item.state.as_deref());
            print_field("Assigned To", item.assigned_to.as_deref());
            print_field("Area Path", item.area_path.as_deref());
            print_field("Iteration", item.iteration_path.as_deref());
            if let Some(description) = &item.description {
                println!("Description:\n{description}");
            }
            Ok(())
        }
        output => print_json(item, output),
    }
}

fn print_field(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        println!("{label:<12} {value}");
    }
}

fn print_steps(steps: &[TestStep], output: OutputFormat) -> WitkitResult<()> {
    match output {
        OutputFormat::Text => {
            if steps.is_empty() {
                println!("No steps.");
                return Ok(());
            }
            for (index, step) in steps.iter().enumerate() {
                println!("{:>3}. {}", index + 1, step.action);
                if !step.expected.is_empty() {
                    println!("     expected: {}", step.expected);
                }
            }
            Ok(())
        }
        output => print_json(steps, output),
    }
}

/// Serializes any value as pretty JSON (or one compact line for ndjson).
fn print_json<T: serde::Serialize + ?Sized>(value: &T, output: OutputFormat) -> WitkitResult<()> {
    let rendered = match output {
        OutputFormat::Ndjson => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    }
    .map_err(|e| WitkitError::Other(e.into()))?;
    println!("{rendered}");
    Ok(())
}
