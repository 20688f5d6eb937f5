//! Report generation — timestamped CSV plus the operator-facing channel

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{AuditError, AuditResult};
use crate::model::ReportRow;

/// CSV header row
pub const REPORT_HEADER: [&str; 2] = ["EventName", "Path"];

/// Highest `_N` suffix tried when reports started in the same second already exist
pub const MAX_REPORT_SUFFIX: u32 = 99;

/// File name for a run started at `started_at`: `YYYYMMDD_HHMMSS.csv`
pub fn report_file_name(started_at: &DateTime<Local>) -> String {
    numbered_report_name(started_at, 0)
}

/// `YYYYMMDD_HHMMSS_N.csv` for `n > 0`
fn numbered_report_name(started_at: &DateTime<Local>, n: u32) -> String {
    let stem = started_at.format("%Y%m%d_%H%M%S");
    match n {
        0 => format!("{}.csv", stem),
        n => format!("{}_{}.csv", stem, n),
    }
}

/// Write header and rows as CSV
pub fn render_csv<W: Write>(rows: &[ReportRow], writer: W) -> csv::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(REPORT_HEADER)?;
    for row in rows {
        csv.write_record([row.name.as_str(), row.path.as_str()])?;
    }
    csv.flush()?;
    Ok(())
}

/// Create `output_dir` if needed and write a new report file into it
///
/// Files are created exclusively, so a report from an earlier run is never
/// overwritten. When `YYYYMMDD_HHMMSS.csv` is taken (two runs in the same
/// second) the report goes to `YYYYMMDD_HHMMSS_1.csv`, `_2` and so on.
pub fn write_report(
    output_dir: &Path,
    rows: &[ReportRow],
    started_at: &DateTime<Local>,
) -> AuditResult<PathBuf> {
    fs::create_dir_all(output_dir)
        .map_err(|e| AuditError::io("creating output directory", output_dir, e))?;

    for n in 0..=MAX_REPORT_SUFFIX {
        let path = output_dir.join(numbered_report_name(started_at, n));
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(AuditError::io("creating report", &path, e)),
        };
        if n > 0 {
            log::info!(
                "[Audit] {} already exists, writing {}",
                report_file_name(started_at),
                path.display()
            );
        }

        render_csv(rows, file)
            .map_err(|e| AuditError::io("writing report", &path, csv_to_io(e)))?;
        return Ok(path);
    }

    let last = output_dir.join(numbered_report_name(started_at, MAX_REPORT_SUFFIX));
    Err(AuditError::io(
        "creating report",
        &last,
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!(
                "{} and suffixes _1 to _{} are all taken",
                report_file_name(started_at),
                MAX_REPORT_SUFFIX
            ),
        ),
    ))
}

fn csv_to_io(err: csv::Error) -> io::Error {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => e,
        other => io::Error::other(format!("{:?}", other)),
    }
}

/// Operator-facing channel for audit progress and results
pub trait AuditReporter {
    /// A pipeline step is starting
    fn step(&self, step: &str);

    /// The events no bank includes
    fn unincluded(&self, rows: &[ReportRow]);

    /// The report file is written
    fn report_written(&self, path: &Path);
}

/// Reporter writing to the log, with event names echoed to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl AuditReporter for LogReporter {
    fn step(&self, step: &str) {
        log::info!("[Audit] {}", step);
    }

    fn unincluded(&self, rows: &[ReportRow]) {
        log::info!("[Audit] Not included events: {}", rows.len());
        for row in rows {
            println!("{}", row.name);
        }
    }

    fn report_written(&self, path: &Path) {
        log::info!("[Audit] Check event inclusion done. Output: {}", path.display());
    }
}

/// Program and arguments that reveal `path` in the platform file browser
pub fn reveal_command(path: &Path) -> (String, Vec<String>) {
    if cfg!(target_os = "windows") {
        ("explorer".to_string(), vec![format!("/select,{}", path.display())])
    } else if cfg!(target_os = "macos") {
        ("open".to_string(), vec!["-R".to_string(), path.display().to_string()])
    } else {
        let dir = path.parent().unwrap_or(path);
        ("xdg-open".to_string(), vec![dir.display().to_string()])
    }
}

/// Show the report in the file browser; failures only warn
pub fn reveal_in_file_browser(path: &Path) {
    let (program, args) = reveal_command(path);
    if let Err(e) = std::process::Command::new(&program).args(&args).spawn() {
        log::warn!("[Audit] Could not open file browser ({}): {}", program, e);
    }
}
