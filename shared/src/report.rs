//! Report artifacts
//!
//! The report renderer lives outside this crate. What it gets from a run is
//! exposed verbatim: the ordered results, the aggregate status, the command
//! audit log, and the baseline that was checked against. `timestamp` and
//! `passed` let an aggregator order and count reports without parsing the
//! trail.

use crate::results::{CommandExecution, ResultCollector, ResultStatus, TestResult};
use crate::{ExecutionMode, ParameterTree};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error writing report '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Report serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a report renderer needs from one test case run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub task_id: String,
    pub title: String,
    pub mode: ExecutionMode,
    /// When the report was taken
    pub timestamp: DateTime<Utc>,
    pub status: ResultStatus,
    pub passed: bool,
    pub results: Vec<TestResult>,
    pub command_executions: Vec<CommandExecution>,
    pub parameters: ParameterTree,
}

impl JobReport {
    /// Snapshot a collector together with the baseline used
    pub fn from_collector(
        task_id: impl Into<String>,
        title: impl Into<String>,
        mode: ExecutionMode,
        results: &ResultCollector,
        parameters: ParameterTree,
    ) -> Self {
        let status = results.status();
        Self {
            task_id: task_id.into(),
            title: title.into(),
            mode,
            timestamp: Utc::now(),
            status,
            passed: status == ResultStatus::Passed,
            results: results.results(),
            command_executions: results.command_executions(),
            parameters,
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}_metadata.json", self.task_id)
    }

    /// Write the report as JSON into `dir`, creating it if needed
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.file_name());
        let io_err = |source| ReportError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(dir).map_err(io_err)?;
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        fs::write(&path, content).map_err(io_err)?;

        info!("Wrote report metadata to '{}'", path.display());
        Ok(path)
    }
}
