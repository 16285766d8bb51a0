//! Result collection and aggregate status
//!
//! Every finding produced while a test case runs lands here as an
//! append-only record. Records are never reordered or removed; the
//! aggregate status is derived from them on demand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Outcome of a single verification point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Passed,
    Failed,
    /// Diagnostic only, never affects the aggregate
    Info,
    Skipped,
    Aborted,
    Blocked,
    Errored,
}

impl ResultStatus {
    /// Whether this status overrides `Passed` in the aggregate
    pub fn is_dominant(self) -> bool {
        !matches!(self, ResultStatus::Passed | ResultStatus::Info)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatus::Passed => "PASSED",
            ResultStatus::Failed => "FAILED",
            ResultStatus::Info => "INFO",
            ResultStatus::Skipped => "SKIPPED",
            ResultStatus::Aborted => "ABORTED",
            ResultStatus::Blocked => "BLOCKED",
            ResultStatus::Errored => "ERRORED",
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold a sequence of statuses into one, in order.
///
/// `Info` is ignored, `Passed` is the default, and the first dominant
/// status wins.
pub fn aggregate_status<I>(statuses: I) -> ResultStatus
where
    I: IntoIterator<Item = ResultStatus>,
{
    statuses
        .into_iter()
        .find(|s| s.is_dominant())
        .unwrap_or(ResultStatus::Passed)
}

/// A single recorded finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub status: ResultStatus,
    pub message: String,
}

/// Audit record of one command run against one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandExecution {
    pub device_name: String,
    pub command: String,
    pub output: String,
    pub data: Value,
}

#[derive(Debug, Default)]
struct Records {
    results: Vec<TestResult>,
    command_executions: Vec<CommandExecution>,
}

/// Thread-safe, append-only sink for test results
///
/// Shared between dispatch tasks behind an `Arc`. Appends are serialized
/// through an internal mutex; ordering across concurrent producers is
/// whatever order they acquire the lock in.
#[derive(Debug, Default)]
pub struct ResultCollector {
    records: Mutex<Records>,
}

impl ResultCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking producer must not take the whole trail down with it.
    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a finding
    pub fn add_result(&self, status: ResultStatus, message: impl Into<String>) {
        let message = message.into();
        info!("[RESULT][{}] {}", status, message);
        self.lock().results.push(TestResult { status, message });
    }

    /// Record a command execution for the audit log
    pub fn add_command_execution(
        &self,
        device_name: impl Into<String>,
        command: impl Into<String>,
        output: impl Into<String>,
        data: Option<Value>,
    ) {
        let device_name = device_name.into();
        let command = command.into();
        debug!("Recording command execution on {}: {}", device_name, command);

        self.lock().command_executions.push(CommandExecution {
            device_name,
            command,
            output: output.into(),
            data: data.unwrap_or_else(|| Value::Object(Map::new())),
        });
    }

    /// Aggregate status over everything recorded so far
    pub fn status(&self) -> ResultStatus {
        aggregate_status(self.lock().results.iter().map(|r| r.status))
    }

    /// Snapshot of all results in append order
    pub fn results(&self) -> Vec<TestResult> {
        self.lock().results.clone()
    }

    /// Snapshot of the command audit log in append order
    pub fn command_executions(&self) -> Vec<CommandExecution> {
        self.lock().command_executions.clone()
    }

    /// Number of results recorded with the given status
    pub fn count(&self, status: ResultStatus) -> usize {
        self.lock()
            .results
            .iter()
            .filter(|r| r.status == status)
            .count()
    }

    pub fn len(&self) -> usize {
        self.lock().results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().results.is_empty()
    }
}
