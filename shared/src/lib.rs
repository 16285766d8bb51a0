//! OSPF Verify Shared Types
//!
//! This crate provides the synchronous core used by the verification job:
//! result collection and aggregation, the nested state comparator,
//! parameter file persistence and the report artifacts.

pub mod comparator;
pub mod parameters;
pub mod report;
pub mod results;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use comparator::{CompareError, NeighborAttribute, StateComparator, NEIGHBORS_KEY};
pub use parameters::{ParameterError, ParameterStore, DEFAULT_PARAMETERS_DIR};
pub use report::{JobReport, ReportError};
pub use results::{
    aggregate_status, CommandExecution, ResultCollector, ResultStatus, TestResult,
};

/// Nested device state:
/// device -> interface -> `{"neighbors": {router-id -> {attribute: value}}}`.
///
/// Keys keep insertion order, so walks over a tree are deterministic.
pub type ParameterTree = serde_json::Map<String, serde_json::Value>;

/// Which side of the learn/verify cycle a run performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Capture current state and save it as the baseline
    Learning,
    /// Compare current state against the saved baseline
    #[default]
    Testing,
}

impl ExecutionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionMode::Learning => "learning",
            ExecutionMode::Testing => "testing",
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "learning" => Ok(ExecutionMode::Learning),
            "testing" => Ok(ExecutionMode::Testing),
            other => Err(format!(
                "invalid mode '{}' (expected 'learning' or 'testing')",
                other
            )),
        }
    }
}
