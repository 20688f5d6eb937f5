//! Audit pipeline — one run from project check to written report
//!
//! Validate project → fetch catalog → fetch banks → fetch inclusions per bank →
//! resolve → reconcile → write report. Any failure aborts the run; the WAAPI
//! session is closed on every exit path.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Local};
use rf_waapi::{WaapiCall, WaapiSession};

use crate::error::{AuditError, AuditResult};
use crate::model::ReportRow;
use crate::queries::ProjectQueries;
use crate::reconcile::unincluded_events;
use crate::report::{write_report, AuditReporter};
use crate::resolver::InclusionResolver;

/// What to audit and where the report goes
#[derive(Debug, Clone)]
pub struct AuditRequest {
    /// Project file the connected authoring tool must have open
    pub project_path: PathBuf,

    /// Directory receiving the report
    pub output_dir: PathBuf,

    /// Run start; names the report file
    pub started_at: DateTime<Local>,
}

impl AuditRequest {
    pub fn new(project_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            output_dir: output_dir.into(),
            started_at: Local::now(),
        }
    }

    pub fn with_start(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }
}

/// Result of a completed audit
#[derive(Debug, Clone, PartialEq)]
pub struct AuditOutcome {
    pub report_path: PathBuf,
    pub total_events: usize,
    pub bank_count: usize,
    pub unincluded: Vec<ReportRow>,
}

/// Absolute path with `.` and `..` folded away, without touching the filesystem
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Runs audits, reporting progress to an operator channel
pub struct Auditor<'r> {
    reporter: &'r dyn AuditReporter,
}

impl<'r> Auditor<'r> {
    pub fn new(reporter: &'r dyn AuditReporter) -> Self {
        Self { reporter }
    }

    /// Audit over `session`, then close it whatever the outcome
    pub async fn run<S: WaapiSession>(
        &self,
        session: S,
        request: &AuditRequest,
    ) -> AuditResult<AuditOutcome> {
        let result = self.audit(&session, request).await;

        if let Err(e) = session.close().await {
            log::warn!("[Audit] WAAPI session did not close cleanly: {}", e);
        }

        result
    }

    /// Audit over an already open connection
    pub async fn audit<C: WaapiCall>(
        &self,
        client: &C,
        request: &AuditRequest,
    ) -> AuditResult<AuditOutcome> {
        let queries = ProjectQueries::new(client);

        self.reporter.step("Checking project path");
        let expected = normalize_path(&request.project_path);
        let actual = normalize_path(&queries.project_path().await?);
        if actual != expected {
            return Err(AuditError::ProjectMismatch { expected, actual });
        }

        self.reporter.step("Fetching events");
        let catalog = queries.event_catalog().await?;
        log::info!("[Audit] {} events in project", catalog.len());

        self.reporter.step("Fetching SoundBank inclusions");
        let banks = queries.bank_names().await?;
        let mut roots = Vec::new();
        for bank in &banks {
            let inclusions = queries.bank_inclusions(bank).await?;
            log::debug!("[Audit] SoundBank '{}': {} inclusions", bank, inclusions.len());
            roots.extend(inclusions);
        }
        log::info!("[Audit] {} SoundBanks, {} inclusions", banks.len(), roots.len());

        self.reporter.step("Resolving included events");
        let reachable = InclusionResolver::new(queries).resolve(&roots).await?;

        let unincluded = unincluded_events(&catalog, &reachable);
        let report_path = write_report(&request.output_dir, &unincluded, &request.started_at)?;

        self.reporter.unincluded(&unincluded);
        self.reporter.report_written(&report_path);

        Ok(AuditOutcome {
            report_path,
            total_events: catalog.len(),
            bank_count: banks.len(),
            unincluded,
        })
    }
}
