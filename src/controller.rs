//! Execution mode controller
//!
//! Drives one verification case through either side of the learn/verify
//! cycle and always finishes with exactly one terminal verdict record. The
//! verdict is appended to the itemized trail, it does not summarize it: the
//! collector's aggregate status is what decides pass or fail.

use crate::cases::VerificationCase;
use crate::command::CommandDispatcher;
use crate::testbed::Testbed;
use ospf_verify_shared::{
    ExecutionMode, ParameterStore, ParameterTree, ResultCollector, ResultStatus, TestResult,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// What a single case run leaves behind besides the recorded trail
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    /// The terminal record, also present in the collector
    pub verdict: TestResult,
    /// Baseline the run was checked against; empty in learning mode
    pub baseline: ParameterTree,
}

pub struct ExecutionModeController {
    testbed: Arc<Testbed>,
    store: ParameterStore,
    results: Arc<ResultCollector>,
    dispatcher: CommandDispatcher,
}

impl ExecutionModeController {
    pub fn new(testbed: Arc<Testbed>, store: ParameterStore, results: Arc<ResultCollector>) -> Self {
        let dispatcher = CommandDispatcher::new(results.clone());
        Self {
            testbed,
            store,
            results,
            dispatcher,
        }
    }

    pub fn results(&self) -> &Arc<ResultCollector> {
        &self.results
    }

    /// Run `case` in the given mode
    pub async fn run(&self, case: &dyn VerificationCase, mode: ExecutionMode) -> CaseOutcome {
        info!("Running {} in {} mode", case.id(), mode);
        match mode {
            ExecutionMode::Learning => self.learn(case).await,
            ExecutionMode::Testing => self.verify(case).await,
        }
    }

    async fn learn(&self, case: &dyn VerificationCase) -> CaseOutcome {
        let failed_before = self.results.count(ResultStatus::Failed);
        let current = match self.gather(case).await {
            Ok(state) => state,
            Err(outcome) => return outcome,
        };

        // An incomplete capture must not become the baseline
        if self.results.count(ResultStatus::Failed) > failed_before {
            warn!("Not saving parameters for {}: state capture was incomplete", case.id());
            return self.conclude(
                ResultStatus::Failed,
                "Failed to gather parameters from all devices, parameters not saved",
                ParameterTree::new(),
            );
        }

        if self.store.save(case.id(), &current) {
            self.conclude(
                ResultStatus::Passed,
                "Successfully learned parameters and saved to file",
                ParameterTree::new(),
            )
        } else {
            self.conclude(
                ResultStatus::Failed,
                "Failed to save parameters to file",
                ParameterTree::new(),
            )
        }
    }

    async fn verify(&self, case: &dyn VerificationCase) -> CaseOutcome {
        let expected = self.store.load(case.id());
        if expected.is_empty() {
            return self.conclude(
                ResultStatus::Failed,
                "No expected parameters found. Run in learning mode first.",
                expected,
            );
        }

        let current = match self.gather(case).await {
            Ok(state) => state,
            Err(mut outcome) => {
                outcome.baseline = expected;
                return outcome;
            }
        };

        info!("Comparing current state to expected parameters");
        match case.compare(&current, &expected, &self.results) {
            Ok(()) => self.conclude(
                ResultStatus::Passed,
                "The current state of the device has been successfully validated \
                 against the expected parameters.",
                expected,
            ),
            Err(e) => {
                error!("Comparison of {} aborted: {}", case.id(), e);
                self.conclude(ResultStatus::Failed, e.to_string(), expected)
            }
        }
    }

    /// Capture current state, or the outcome to return if that was impossible
    async fn gather(&self, case: &dyn VerificationCase) -> Result<ParameterTree, CaseOutcome> {
        case.gather_current_state(&self.testbed, &self.dispatcher, &self.results)
            .await
            .map_err(|e| self.conclude(ResultStatus::Errored, e.to_string(), ParameterTree::new()))
    }

    fn conclude(
        &self,
        status: ResultStatus,
        message: impl Into<String>,
        baseline: ParameterTree,
    ) -> CaseOutcome {
        let message = message.into();
        self.results.add_result(status, message.clone());
        CaseOutcome {
            verdict: TestResult { status, message },
            baseline,
        }
    }
}
