//! Job orchestrator - concurrent per-file extraction into one graph.
//!
//! A fixed-size worker pool pulls files off a channel, each worker hands back
//! an immutable ParseUnit, and the coordinator alone merges units into the
//! CodeGraph. No worker ever touches the shared graph, and merged state is
//! keyed by path, so the final graph is identical whatever order workers
//! finish in.
//!
//! Per file: `Pending -> Parsing -> Extracted | Failed | TimedOut`. All
//! failure modes are file-local; one broken file never blocks another.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::adapter::{default_registry, AdapterRegistry, ExtractRequest};
use crate::graph::CodeGraph;
use crate::language::Language;
use crate::unit::{content_hash, Diagnostic, DiagnosticKind, ParseUnit};
use crate::{Error, FileStatus, Result};

/// One file handed in by the external discovery collaborator.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path relative to the workspace root
    pub path: String,
    /// Language tag; detected from path/content when absent
    pub language: Option<Language>,
    /// Raw file content
    pub content: Vec<u8>,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { path: path.into(), language: None, content: content.into() }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

/// Cooperative cancellation signal.
///
/// Workers finish their current file (aborting mid-parse could leave partial
/// definitions); the dispatcher stops handing out new work. The graph
/// accumulated so far remains a valid, if incomplete, result.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-file state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    /// Submitted, not yet dispatched (also final for cancelled-out files)
    Pending,
    /// A worker is analyzing the file
    Parsing,
    /// Unit produced and merged
    Extracted,
    /// File-local failure; diagnostics carry the cause
    Failed,
    /// Per-file deadline expired
    TimedOut,
}

impl std::fmt::Display for FileState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FileState::Pending => "pending",
            FileState::Parsing => "parsing",
            FileState::Extracted => "extracted",
            FileState::Failed => "failed",
            FileState::TimedOut => "timed_out",
        };
        write!(f, "{}", s)
    }
}

/// Outcome for one submitted file.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub state: FileState,
    /// Merge effect, when a unit reached the graph
    pub status: Option<FileStatus>,
    /// Error text for files that produced no unit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of one indexing run. Partial success is the normal case: a
/// completed job always returns the graph plus this report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobSummary {
    /// Per-file reports, sorted by path
    pub reports: Vec<FileReport>,
}

impl JobSummary {
    pub fn count(&self, state: FileState) -> usize {
        self.reports.iter().filter(|r| r.state == state).count()
    }

    pub fn extracted(&self) -> usize {
        self.count(FileState::Extracted)
    }

    pub fn failed(&self) -> usize {
        self.count(FileState::Failed)
    }

    pub fn timed_out(&self) -> usize {
        self.count(FileState::TimedOut)
    }

    pub fn pending(&self) -> usize {
        self.count(FileState::Pending)
    }

    pub fn unchanged(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.status == Some(FileStatus::Unchanged))
            .count()
    }
}

impl std::fmt::Display for JobSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files: {} extracted ({} unchanged), {} failed, {} timed out, {} pending",
            self.reports.len(),
            self.extracted(),
            self.unchanged(),
            self.failed(),
            self.timed_out(),
            self.pending()
        )
    }
}

/// Orchestrator tuning knobs.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Worker pool size
    pub workers: usize,
    /// Per-file parse deadline
    pub file_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            file_timeout: Duration::from_secs(30),
        }
    }
}

/// Schedules per-file extraction over a bounded worker pool and owns the
/// merge into the shared graph.
pub struct Orchestrator {
    registry: AdapterRegistry,
    config: OrchestratorConfig,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// Orchestrator with the built-in adapters and default config
    pub fn new() -> Self {
        Self { registry: default_registry(), config: OrchestratorConfig::default() }
    }

    pub fn with_config(config: OrchestratorConfig) -> Self {
        Self { registry: default_registry(), config }
    }

    /// Custom adapter set (e.g. a registry without a fallback)
    pub fn with_registry(registry: AdapterRegistry, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    /// Index files into a fresh graph.
    pub fn index(&self, files: Vec<SourceFile>, cancel: &CancelFlag) -> Result<(CodeGraph, JobSummary)> {
        let mut graph = CodeGraph::new();
        let summary = self.index_into(&mut graph, files, cancel)?;
        Ok((graph, summary))
    }

    /// Index files into an existing graph.
    ///
    /// Resubmitting a file with unchanged content is a no-op skip; changed
    /// content replaces its unit wholesale. Duplicate paths in one batch
    /// collapse to the last submission.
    pub fn index_into(
        &self,
        graph: &mut CodeGraph,
        files: Vec<SourceFile>,
        cancel: &CancelFlag,
    ) -> Result<JobSummary> {
        let mut by_path: BTreeMap<String, SourceFile> = BTreeMap::new();
        for file in files {
            by_path.insert(file.path.clone(), file);
        }

        let mut reports: BTreeMap<String, FileReport> = BTreeMap::new();
        let mut jobs: Vec<(SourceFile, String)> = Vec::new();
        for (path, file) in by_path {
            let hash = content_hash(&file.content);
            if graph.is_current(&path, &hash) {
                debug!(path = %path, "content unchanged, skipping");
                reports.insert(
                    path.clone(),
                    FileReport {
                        path,
                        state: FileState::Extracted,
                        status: Some(FileStatus::Unchanged),
                        error: None,
                    },
                );
            } else {
                reports.insert(
                    path.clone(),
                    FileReport { path, state: FileState::Pending, status: None, error: None },
                );
                jobs.push((file, hash));
            }
        }

        if !jobs.is_empty() && !cancel.is_cancelled() {
            self.run_pool(graph, jobs, cancel, &mut reports)?;
        }

        let summary = JobSummary { reports: reports.into_values().collect() };
        info!(%summary, "extraction job finished");
        Ok(summary)
    }

    fn run_pool(
        &self,
        graph: &mut CodeGraph,
        jobs: Vec<(SourceFile, String)>,
        cancel: &CancelFlag,
        reports: &mut BTreeMap<String, FileReport>,
    ) -> Result<()> {
        let workers = self.config.workers.clamp(1, jobs.len());
        info!(files = jobs.len(), workers, "extraction job started");

        let registry = &self.registry;
        let timeout = self.config.file_timeout;

        thread::scope(|scope| -> Result<()> {
            // Channels live inside the scope body: if spawning fails midway,
            // dropping them on the early return unblocks already-running
            // workers before the scope joins them.
            let (job_tx, job_rx) = channel::bounded::<(SourceFile, String)>(workers);
            let (result_tx, result_rx) = channel::unbounded::<WorkerMessage>();

            for i in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let cancel = cancel.clone();
                thread::Builder::new()
                    .name(format!("cartograph-worker-{}", i))
                    .spawn_scoped(scope, move || {
                        while let Ok((file, hash)) = job_rx.recv() {
                            // Already-dispatched work after a cancel is left
                            // unprocessed; in-flight files still finish.
                            let message = if cancel.is_cancelled() {
                                WorkerMessage::NotStarted { path: file.path }
                            } else {
                                process_file(registry, file, hash, timeout)
                            };
                            if result_tx.send(message).is_err() {
                                break;
                            }
                        }
                    })
                    .map_err(|e| Error::WorkerPool(format!("failed to spawn worker: {}", e)))?;
            }
            drop(job_rx);
            drop(result_tx);

            for job in jobs {
                if cancel.is_cancelled() {
                    debug!("cancellation requested, dispatch stopped");
                    break;
                }
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);

            // Single-writer merge: only this thread touches the graph.
            for message in result_rx.iter() {
                match message {
                    WorkerMessage::Done { path, state, unit, error } => {
                        let status = unit.map(|u| graph.insert_unit(u));
                        if let Some(report) = reports.get_mut(&path) {
                            report.state = state;
                            report.status = status;
                            report.error = error;
                        }
                    }
                    WorkerMessage::NotStarted { .. } => {}
                }
            }
            Ok(())
        })
    }
}

/// Message sent from workers back to the coordinator.
enum WorkerMessage {
    Done {
        path: String,
        state: FileState,
        unit: Option<ParseUnit>,
        error: Option<String>,
    },
    /// Received after cancellation; the file stays Pending
    NotStarted { path: String },
}

fn process_file(
    registry: &AdapterRegistry,
    file: SourceFile,
    hash: String,
    timeout: Duration,
) -> WorkerMessage {
    let path = file.path;

    let source = match String::from_utf8(file.content) {
        Ok(source) => source,
        Err(_) => {
            warn!(path = %path, "content is not valid UTF-8, skipping");
            let unit = ParseUnit::empty(
                &path,
                file.language.unwrap_or(Language::PlainText),
                &hash,
                vec![Diagnostic::new(
                    DiagnosticKind::EncodingError,
                    format!("{} is not valid UTF-8", path),
                )],
            );
            return WorkerMessage::Done { path, state: FileState::Failed, unit: Some(unit), error: None };
        }
    };

    let language = file
        .language
        .or_else(|| Language::detect(&path, &source))
        .unwrap_or(Language::PlainText);
    debug!(path = %path, language = %language, "parsing");

    let adapter = match registry.lookup(language) {
        Ok(adapter) => adapter,
        Err(e) => {
            warn!(path = %path, language = %language, "no adapter and no fallback");
            let unit = ParseUnit::empty(
                &path,
                language,
                &hash,
                vec![Diagnostic::new(DiagnosticKind::UnsupportedLanguage, e.to_string())],
            );
            return WorkerMessage::Done {
                path,
                state: FileState::Failed,
                unit: Some(unit),
                error: Some(e.to_string()),
            };
        }
    };

    let request = ExtractRequest {
        path: &path,
        source: &source,
        content_hash: &hash,
        timeout: Some(timeout),
    };
    match adapter.extract(&request) {
        Ok(unit) => {
            let state = if unit.has_diagnostic(DiagnosticKind::Timeout) {
                warn!(path = %path, "parse deadline exceeded");
                FileState::TimedOut
            } else {
                FileState::Extracted
            };
            WorkerMessage::Done { path, state, unit: Some(unit), error: None }
        }
        Err(e) => {
            warn!(path = %path, error = %e, "extraction failed");
            WorkerMessage::Done {
                path,
                state: FileState::Failed,
                unit: None,
                error: Some(e.to_string()),
            }
        }
    }
}
