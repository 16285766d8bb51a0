//! Verification cases
//!
//! A case knows which command captures the state it cares about, how to
//! turn parsed output into a parameter tree, and how to compare two trees.
//! The execution mode controller drives cases without knowing any of that.

mod ospf_neighbors;

pub use ospf_neighbors::OspfNeighborCase;

use crate::command::{CommandDispatcher, DispatchError};
use crate::testbed::Testbed;
use async_trait::async_trait;
use ospf_verify_shared::{CompareError, ParameterTree, ResultCollector};

#[async_trait]
pub trait VerificationCase: Send + Sync {
    /// Stable identifier, also used as the parameter file name
    fn id(&self) -> &str;

    /// Human-readable title for reports
    fn title(&self) -> &str;

    /// Capture the current state of every device in the testbed
    async fn gather_current_state(
        &self,
        testbed: &Testbed,
        dispatcher: &CommandDispatcher,
        results: &ResultCollector,
    ) -> Result<ParameterTree, DispatchError>;

    /// Check `expected` against `current`, recording every finding
    fn compare(
        &self,
        current: &ParameterTree,
        expected: &ParameterTree,
        results: &ResultCollector,
    ) -> Result<(), CompareError>;
}
