#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **eventflow-reporter** – On-disk JSON run reports for Eventflow.
//!
//! Writes an initial report when a run starts and a completion report
//! when it ends, maintaining a `run.json` symlink that always points at
//! whichever is the latest. Consumes aggregator output; never read by
//! the aggregator itself.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

const REPORT_SUBDIR: &str = "json_reporter";
const INITIAL_REPORT_FILE_NAME: &str = "initial_report.json";
const COMPLETION_REPORT_FILE_NAME: &str = "completion_report.json";
const RUN_LINK_FILE_NAME: &str = "run.json";

/// Errors raised while writing or loading a run report.
#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    /// Failed to create the report directory.
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to write a report file.
    #[error("failed to write report {path}: {source}")]
    Write {
        /// The file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Failed to read a report file.
    #[error("failed to read report {path}: {source}")]
    Read {
        /// The file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A report file's contents were not valid JSON for the expected
    /// shape.
    #[error("malformed report {path}: {source}")]
    Malformed {
        /// The file whose contents did not parse.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Failed to create or repoint the `run.json` symlink.
    #[error("failed to link {link} to {target}: {source}")]
    Link {
        /// The symlink path.
        link: PathBuf,
        /// The file the symlink should point at.
        target: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Submission-time metadata common to both report shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialRunReport {
    /// The root task's uuid.
    pub uuid: String,
    /// The chain name or command line the run was submitted with.
    pub chain: String,
    /// When the run was submitted (RFC 3339).
    pub submission_time: chrono::DateTime<chrono::Utc>,
    /// Always `false` for an initial report.
    pub completed: bool,
}

impl InitialRunReport {
    /// Build a fresh initial report, stamped `completed = false`.
    pub fn new(uuid: impl Into<String>, chain: impl Into<String>, submission_time: chrono::DateTime<chrono::Utc>) -> Self {
        Self { uuid: uuid.into(), chain: chain.into(), submission_time, completed: false }
    }
}

/// The final, on-disk shape of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRunReport {
    /// The root task's uuid.
    pub uuid: String,
    /// The chain name or command line the run was submitted with.
    pub chain: String,
    /// When the run was submitted (RFC 3339).
    pub submission_time: chrono::DateTime<chrono::Utc>,
    /// Always `true` for a completion report.
    pub completed: bool,
    /// Whether the run was revoked rather than finishing on its own.
    pub revoked: bool,
    /// Task results, if the framework captured any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<serde_json::Value>,
}

fn report_dir(run_dir: &Path) -> PathBuf {
    run_dir.join(REPORT_SUBDIR)
}

fn relink(run_dir: &Path, target: &Path) -> Result<(), ReporterError> {
    let link = run_dir.join(RUN_LINK_FILE_NAME);
    if link.exists() || link.symlink_metadata().is_ok() {
        std::fs::remove_file(&link).map_err(|e| ReporterError::Link {
            link: link.clone(),
            target: target.to_path_buf(),
            source: e,
        })?;
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, &link).map_err(|e| ReporterError::Link {
            link: link.clone(),
            target: target.to_path_buf(),
            source: e,
        })
    }

    #[cfg(not(unix))]
    {
        std::fs::copy(target, &link)
            .map(|_| ())
            .map_err(|e| ReporterError::Link { link: link.clone(), target: target.to_path_buf(), source: e })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ReporterError> {
    let body = serde_json::to_string_pretty(value)
        .expect("report types always serialize: no non-finite floats, no map keys that fail");
    std::fs::write(path, body).map_err(|e| ReporterError::Write { path: path.to_path_buf(), source: e })
}

/// Write `report` to `<run_dir>/json_reporter/initial_report.json` and
/// point `<run_dir>/run.json` at it.
pub fn write_initial_report(run_dir: &Path, report: &InitialRunReport) -> Result<PathBuf, ReporterError> {
    let dir = report_dir(run_dir);
    std::fs::create_dir_all(&dir).map_err(|e| ReporterError::CreateDir { path: dir.clone(), source: e })?;

    let path = dir.join(INITIAL_REPORT_FILE_NAME);
    write_json(&path, report)?;
    relink(run_dir, &path)?;
    Ok(path)
}

/// Write `report` to `<run_dir>/json_reporter/completion_report.json`,
/// carrying forward submission metadata from the initial report if one
/// is present (falling back to `report`'s own fields if it can't be
/// read), and repoint `run.json` at it.
pub fn write_completion_report(run_dir: &Path, report: &CompletionRunReport) -> Result<PathBuf, ReporterError> {
    let dir = report_dir(run_dir);
    std::fs::create_dir_all(&dir).map_err(|e| ReporterError::CreateDir { path: dir.clone(), source: e })?;

    let initial_path = dir.join(INITIAL_REPORT_FILE_NAME);
    let merged = match load_initial_report(&initial_path) {
        Ok(initial) => CompletionRunReport {
            uuid: initial.uuid,
            chain: initial.chain,
            submission_time: initial.submission_time,
            ..report.clone()
        },
        Err(err) => {
            warn!(%err, "could not load initial report, writing completion report standalone");
            report.clone()
        }
    };

    let path = dir.join(COMPLETION_REPORT_FILE_NAME);
    write_json(&path, &merged)?;
    relink(run_dir, &path)?;
    Ok(path)
}

fn load_initial_report(path: &Path) -> Result<InitialRunReport, ReporterError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ReporterError::Read { path: path.to_path_buf(), source: e })?;
    serde_json::from_str(&contents).map_err(|e| ReporterError::Malformed { path: path.to_path_buf(), source: e })
}

/// Read a completion report back from disk. Unknown JSON keys are
/// ignored by `serde`'s default behavior.
pub fn load_completion_report(path: &Path) -> Result<CompletionRunReport, ReporterError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ReporterError::Read { path: path.to_path_buf(), source: e })?;
    serde_json::from_str(&contents).map_err(|e| ReporterError::Malformed { path: path.to_path_buf(), source: e })
}

/// Whether `path`'s canonicalized basename matches the completion report
/// file name (following symlinks, so `run.json` reads true once a
/// completion report has been written).
pub fn is_completion_report(path: &Path) -> bool {
    std::fs::canonicalize(path)
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_os_string()))
        .is_some_and(|name| name == COMPLETION_REPORT_FILE_NAME)
}
