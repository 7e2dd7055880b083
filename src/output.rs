//! Progress reporting for import runs.
//!
//! Events are emitted as they happen and rendered according to the selected
//! output format: plain text for humans, a single JSON document for scripting,
//! or newline-delimited JSON for streaming consumers.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::{ImportSummary, OutputFormat};
use crate::utils::truncate_str;

/// Titles longer than this are shortened in text output.
const TITLE_DISPLAY_WIDTH: usize = 60;

/// One progress event of an import run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// The run started and found this many files to process.
    Started { total_files: usize },

    /// Processing of one import file began.
    FileStarted { path: String, records: usize },

    /// A test case was created.
    RecordCreated { id: i32, title: String },

    /// A record was skipped without contacting the server or after a
    /// duplicate check.
    RecordSkipped {
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A record failed; processing continues with the next one.
    RecordFailed { title: String, error: String },

    /// A processed file was moved to the archive directory.
    FileArchived { from: String, to: String },

    /// One file finished processing.
    FileFinished {
        path: String,
        created: usize,
        skipped: usize,
        failed: usize,
    },

    /// A run-level error outside any single record.
    Error { message: String },
}

/// Sink for progress events and the final summary.
pub trait OutputFormatter {
    fn write_event(&mut self, event: &ProgressEvent) -> io::Result<()>;
    fn write_summary(&mut self, summary: &ImportSummary) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
}

/// Writes progress events to any `Write` target in the selected format.
///
/// In JSON mode events are buffered and emitted once as a single document
/// together with the summary; the other formats write as events arrive.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    quiet: bool,
    events: Vec<ProgressEvent>,
}

impl<W: Write> OutputWriter<W> {
    pub fn new(writer: W, format: OutputFormat, quiet: bool) -> Self {
        Self {
            writer,
            format,
            quiet,
            events: Vec::new(),
        }
    }

    fn write_text(&mut self, event: &ProgressEvent) -> io::Result<()> {
        if self.quiet && !matches!(event, ProgressEvent::RecordFailed { .. } | ProgressEvent::Error { .. })
        {
            return Ok(());
        }

        match event {
            ProgressEvent::Started { total_files } => {
                writeln!(self.writer, "Importing from {total_files} file(s)")
            }
            ProgressEvent::FileStarted { path, records } => {
                writeln!(self.writer, "{path}: {records} record(s)")
            }
            ProgressEvent::RecordCreated { id, title } => {
                writeln!(
                    self.writer,
                    "  created #{id}  {}",
                    truncate_str(title, TITLE_DISPLAY_WIDTH)
                )
            }
            ProgressEvent::RecordSkipped { title, reason } => {
                let reason = reason.as_deref().unwrap_or("already exists");
                writeln!(
                    self.writer,
                    "  skipped      {} ({reason})",
                    truncate_str(title, TITLE_DISPLAY_WIDTH)
                )
            }
            ProgressEvent::RecordFailed { title, error } => {
                writeln!(
                    self.writer,
                    "  FAILED       {}: {error}",
                    truncate_str(title, TITLE_DISPLAY_WIDTH)
                )
            }
            ProgressEvent::FileArchived { from, to } => {
                writeln!(self.writer, "  archived {from} -> {to}")
            }
            ProgressEvent::FileFinished {
                path,
                created,
                skipped,
                failed,
            } => {
                writeln!(
                    self.writer,
                    "{path}: {created} created, {skipped} skipped, {failed} failed"
                )
            }
            ProgressEvent::Error { message } => {
                writeln!(self.writer, "error: {message}")
            }
        }
    }

    fn write_ndjson(&mut self, event: &ProgressEvent) -> io::Result<()> {
        let line = serde_json::to_string(event).map_err(io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Consumes the writer and returns the underlying target.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputFormatter for OutputWriter<W> {
    fn write_event(&mut self, event: &ProgressEvent) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(event),
            OutputFormat::Ndjson => self.write_ndjson(event),
            OutputFormat::Json => {
                self.events.push(event.clone());
                Ok(())
            }
        }
    }

    fn write_summary(&mut self, summary: &ImportSummary) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => {
                if summary.total() == 0 {
                    writeln!(self.writer, "Nothing to import")
                } else {
                    writeln!(
                        self.writer,
                        "Done: {} created, {} skipped, {} failed",
                        summary.created, summary.skipped, summary.failed
                    )
                }
            }
            OutputFormat::Ndjson => {
                #[derive(Serialize)]
                struct SummaryLine<'a> {
                    event: &'static str,
                    #[serde(flatten)]
                    summary: &'a ImportSummary,
                }
                let line = serde_json::to_string(&SummaryLine {
                    event: "summary",
                    summary,
                })
                .map_err(io::Error::other)?;
                writeln!(self.writer, "{line}")
            }
            OutputFormat::Json => {
                #[derive(Serialize)]
                struct Document<'a> {
                    events: &'a [ProgressEvent],
                    summary: &'a ImportSummary,
                }
                let doc = serde_json::to_string_pretty(&Document {
                    events: &self.events,
                    summary,
                })
                .map_err(io::Error::other)?;
                writeln!(self.writer, "{doc}")
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
