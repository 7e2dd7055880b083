//! Bulk test case import from JSON and CSV files.
//!
//! Records are imported sequentially. Duplicate titles are skipped, using an
//! in-memory set for titles already seen in this run and a WIQL existence
//! check against the server for everything else. A failing record is logged
//! and reported, then processing continues with the next one.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::api::{AzureDevOpsClient, RestClient};
use crate::error::{ApiResult, ImportError, ImportResult, WitkitResult};
use crate::models::{ImportSummary, TestCaseRecord, TestStep, WorkItem};
use crate::output::{OutputFormatter, ProgressEvent};

/// Reads import records from a single JSON or CSV file.
pub fn read_records(path: &Path) -> ImportResult<Vec<TestCaseRecord>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let content = fs::read_to_string(path)?;
    match extension.as_str() {
        "json" => parse_json_records(&content),
        "csv" => parse_csv_records(content.as_bytes()),
        _ => Err(ImportError::UnsupportedFormat { extension }),
    }
}

/// Parses a JSON array of test case records.
pub fn parse_json_records(content: &str) -> ImportResult<Vec<TestCaseRecord>> {
    let records: Vec<TestCaseRecord> = serde_json::from_str(content)?;
    for (index, record) in records.iter().enumerate() {
        if record.title.trim().is_empty() {
            return Err(ImportError::RecordInvalid {
                index,
                reason: "empty title".to_string(),
            });
        }
    }
    Ok(records)
}

/// Parses CSV test case records.
///
/// Expected columns: `Title`, optional `Description`, and ordered step pairs
/// `StepAction1`/`StepExpected1`, `StepAction2`/`StepExpected2`, and so on.
/// A step whose action cell is blank is dropped. Any other non-empty column
/// becomes an additional field keyed by its header.
pub fn parse_csv_records<R: std::io::Read>(reader: R) -> ImportResult<Vec<TestCaseRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut title_index = None;
    let mut description_index = None;
    // step number -> (action column, expected column)
    let mut step_columns: std::collections::BTreeMap<u32, (Option<usize>, Option<usize>)> =
        std::collections::BTreeMap::new();
    let mut extra_columns: Vec<(usize, String)> = Vec::new();

    for (index, header) in headers.iter().enumerate() {
        if header.eq_ignore_ascii_case("Title") {
            title_index = Some(index);
        } else if header.eq_ignore_ascii_case("Description") {
            description_index = Some(index);
        } else if let Some(n) = parse_step_header(header, "StepAction") {
            step_columns.entry(n).or_default().0 = Some(index);
        } else if let Some(n) = parse_step_header(header, "StepExpected") {
            step_columns.entry(n).or_default().1 = Some(index);
        } else {
            extra_columns.push((index, header.to_string()));
        }
    }

    let title_index = title_index.ok_or_else(|| ImportError::RecordInvalid {
        index: 0,
        reason: "missing Title column".to_string(),
    })?;

    let mut records = Vec::new();
    for (row_index, row) in csv_reader.records().enumerate() {
        let row = row?;
        let cell = |index: usize| row.get(index).unwrap_or_default().trim();

        let title = cell(title_index);
        if title.is_empty() {
            return Err(ImportError::RecordInvalid {
                index: row_index,
                reason: "empty title".to_string(),
            });
        }

        let description = description_index
            .map(|i| cell(i))
            .filter(|d| !d.is_empty())
            .map(String::from);

        let mut test_steps = Vec::new();
        for (action_index, expected_index) in step_columns.values() {
            let action = action_index.map(|i| cell(i)).unwrap_or_default();
            // A blank action drops the whole step, even if expected is filled
            if action.is_empty() {
                continue;
            }
            let expected = expected_index.map(|i| cell(i)).unwrap_or_default();
            test_steps.push(TestStep {
                action: action.to_string(),
                expected: expected.to_string(),
            });
        }

        let mut additional_fields = serde_json::Map::new();
        for (index, name) in &extra_columns {
            let value = cell(*index);
            if !value.is_empty() {
                additional_fields.insert(name.clone(), serde_json::json!(value));
            }
        }

        records.push(TestCaseRecord {
            title: title.to_string(),
            description,
            test_steps,
            additional_fields,
        });
    }

    Ok(records)
}

/// Extracts the step number from headers like `StepAction3`.
fn parse_step_header(header: &str, prefix: &str) -> Option<u32> {
    let header = header.trim();
    if header.len() <= prefix.len() || !header[..prefix.len()].eq_ignore_ascii_case(prefix) {
        return None;
    }
    header[prefix.len()..].parse().ok()
}

/// Collects the import files under `path` in sorted order.
///
/// A file path is returned as-is; a directory is scanned non-recursively for
/// `.json` and `.csv` files.
pub fn collect_import_files(path: &Path) -> ImportResult<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && matches!(
                    p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| e.to_ascii_lowercase())
                        .as_deref(),
                    Some("json") | Some("csv")
                )
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Moves a processed file into `archive_dir`.
///
/// Rename is tried first; if the archive directory is on another filesystem
/// the file is copied and the original removed.
pub fn archive_file(file: &Path, archive_dir: &Path) -> std::io::Result<PathBuf> {
    fs::create_dir_all(archive_dir)?;
    let file_name = file
        .file_name()
        .ok_or_else(|| std::io::Error::other(format!("no file name in {}", file.display())))?;
    let target = archive_dir.join(file_name);

    if fs::rename(file, &target).is_err() {
        fs::copy(file, &target)?;
        fs::remove_file(file)?;
    }
    Ok(target)
}

/// Server operations the importer needs.
///
/// Split out so the import loop can run against a fake in tests.
#[async_trait]
pub trait ImportTarget: Send + Sync {
    /// Checks whether a test case with this exact title already exists.
    async fn test_case_exists(&self, title: &str) -> ApiResult<bool>;

    /// Creates a test case from one import record.
    async fn create_test_case(&self, record: &TestCaseRecord) -> ApiResult<WorkItem>;
}

/// Live import target backed by the two API clients.
pub struct AzureDevOpsTarget {
    client: AzureDevOpsClient,
    rest: RestClient,
}

impl AzureDevOpsTarget {
    pub fn new(client: AzureDevOpsClient, rest: RestClient) -> Self {
        Self { client, rest }
    }
}

#[async_trait]
impl ImportTarget for AzureDevOpsTarget {
    async fn test_case_exists(&self, title: &str) -> ApiResult<bool> {
        self.rest.test_case_exists(title).await
    }

    async fn create_test_case(&self, record: &TestCaseRecord) -> ApiResult<WorkItem> {
        let additional_fields: Vec<(String, serde_json::Value)> = record
            .additional_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        self.client
            .create_test_case(
                &record.title,
                record.description.as_deref(),
                &record.test_steps,
                &additional_fields,
            )
            .await
    }
}

/// Sequential test case importer.
pub struct Importer<T: ImportTarget> {
    target: T,
    /// Titles already created or seen in this run.
    seen_titles: HashSet<String>,
    /// Per-run subdirectory name for archived files.
    run_stamp: String,
}

impl<T: ImportTarget> Importer<T> {
    pub fn new(target: T) -> Self {
        Self {
            target,
            seen_titles: HashSet::new(),
            run_stamp: chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
        }
    }

    /// Imports everything under `path`, archiving processed files.
    ///
    /// Files that fail to parse are reported and left unarchived; everything
    /// else keeps going.
    pub async fn import_path(
        &mut self,
        path: &Path,
        archive_dir: Option<&Path>,
        out: &mut dyn OutputFormatter,
    ) -> WitkitResult<ImportSummary> {
        let files = collect_import_files(path).map_err(crate::error::WitkitError::Import)?;
        out.write_event(&ProgressEvent::Started {
            total_files: files.len(),
        })
        .map_err(anyhow::Error::from)?;
        info!(path = %path.display(), files = files.len(), "starting import run");

        let mut run_summary = ImportSummary::default();
        for file in &files {
            match self.import_file(file, out).await? {
                Some(file_summary) => {
                    run_summary.absorb(file_summary);
                    if let Some(archive_dir) = archive_dir {
                        self.archive(file, archive_dir, out)?;
                    }
                }
                // Unreadable file: reported, not archived
                None => run_summary.failed += 1,
            }
        }

        out.write_summary(&run_summary).map_err(anyhow::Error::from)?;
        out.flush().map_err(anyhow::Error::from)?;
        info!(
            created = run_summary.created,
            skipped = run_summary.skipped,
            failed = run_summary.failed,
            "import run finished"
        );
        Ok(run_summary)
    }

    /// Imports a single file, returning `None` if it could not be read.
    async fn import_file(
        &mut self,
        file: &Path,
        out: &mut dyn OutputFormatter,
    ) -> WitkitResult<Option<ImportSummary>> {
        let records = match read_records(file) {
            Ok(records) => records,
            Err(e) => {
                error!(file = %file.display(), error = %e, "failed to read import file");
                out.write_event(&ProgressEvent::Error {
                    message: format!("{}: {e}", file.display()),
                })
                .map_err(anyhow::Error::from)?;
                return Ok(None);
            }
        };

        out.write_event(&ProgressEvent::FileStarted {
            path: file.display().to_string(),
            records: records.len(),
        })
        .map_err(anyhow::Error::from)?;

        let mut summary = ImportSummary::default();
        for record in records {
            let event = self.import_record(&record).await;
            match &event {
                ProgressEvent::RecordCreated { .. } => summary.created += 1,
                ProgressEvent::RecordSkipped { .. } => summary.skipped += 1,
                _ => summary.failed += 1,
            }
            out.write_event(&event).map_err(anyhow::Error::from)?;
        }

        out.write_event(&ProgressEvent::FileFinished {
            path: file.display().to_string(),
            created: summary.created,
            skipped: summary.skipped,
            failed: summary.failed,
        })
        .map_err(anyhow::Error::from)?;

        Ok(Some(summary))
    }

    /// Imports one record, translating the outcome into a progress event.
    async fn import_record(&mut self, record: &TestCaseRecord) -> ProgressEvent {
        if self.seen_titles.contains(&record.title) {
            return ProgressEvent::RecordSkipped {
                title: record.title.clone(),
                reason: Some("duplicate title in this run".to_string()),
            };
        }

        match self.target.test_case_exists(&record.title).await {
            Ok(true) => {
                self.seen_titles.insert(record.title.clone());
                return ProgressEvent::RecordSkipped {
                    title: record.title.clone(),
                    reason: Some("test case with this title already exists".to_string()),
                };
            }
            Ok(false) => {}
            Err(e) => {
                warn!(title = %record.title, error = %e, "duplicate check failed");
                return ProgressEvent::RecordFailed {
                    title: record.title.clone(),
                    error: e.to_string(),
                };
            }
        }

        match self.target.create_test_case(record).await {
            Ok(created) => {
                self.seen_titles.insert(record.title.clone());
                info!(id = created.id, title = %record.title, "created test case");
                ProgressEvent::RecordCreated {
                    id: created.id,
                    title: record.title.clone(),
                }
            }
            Err(e) => {
                error!(title = %record.title, error = %e, "failed to create test case");
                ProgressEvent::RecordFailed {
                    title: record.title.clone(),
                    error: e.to_string(),
                }
            }
        }
    }

    /// Archives one processed file into the per-run subdirectory.
    fn archive(
        &self,
        file: &Path,
        archive_dir: &Path,
        out: &mut dyn OutputFormatter,
    ) -> WitkitResult<()> {
        let run_dir = archive_dir.join(&self.run_stamp);
        match archive_file(file, &run_dir) {
            Ok(target) => {
                info!(from = %file.display(), to = %target.display(), "archived import file");
                out.write_event(&ProgressEvent::FileArchived {
                    from: file.display().to_string(),
                    to: target.display().to_string(),
                })
                .map_err(anyhow::Error::from)?;
            }
            Err(e) => {
                // Archiving is bookkeeping; a failure must not undo the import
                warn!(file = %file.display(), error = %e, "failed to archive import file");
                out.write_event(&ProgressEvent::Error {
                    message: format!("could not archive {}: {e}", file.display()),
                })
                .map_err(anyhow::Error::from)?;
            }
        }
        Ok(())
    }
}
