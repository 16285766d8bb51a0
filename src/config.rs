//! Job configuration and command-line arguments

use crate::cases::OspfNeighborCase;
use clap::{Parser, ValueEnum};
use indexmap::IndexSet;
use ospf_verify_shared::{ExecutionMode, DEFAULT_PARAMETERS_DIR};
use std::path::PathBuf;

/// Built-in verification cases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum CaseKind {
    /// Neighbor priority values (DR/BDR election)
    Priority,
    /// Neighbor interface IP addresses
    IpAddresses,
    /// Neighbor adjacency states
    Status,
}

impl CaseKind {
    pub const ALL: [CaseKind; 3] = [CaseKind::Priority, CaseKind::IpAddresses, CaseKind::Status];

    pub fn case(self) -> OspfNeighborCase {
        match self {
            CaseKind::Priority => OspfNeighborCase::priority(),
            CaseKind::IpAddresses => OspfNeighborCase::ip_addresses(),
            CaseKind::Status => OspfNeighborCase::status(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ospf-verify")]
#[command(about = "OSPF neighbor validation", long_about = None)]
pub struct Cli {
    /// Mode to run: learning (update test case parameters) or testing
    /// (validate against test case parameters)
    #[arg(long, default_value_t = ExecutionMode::Testing)]
    pub mode: ExecutionMode,

    /// Path to the testbed file
    #[arg(long, default_value = "testbed.json")]
    pub testbed: PathBuf,

    /// Directory holding learned parameter files
    #[arg(long, default_value = DEFAULT_PARAMETERS_DIR)]
    pub parameters_dir: PathBuf,

    /// Directory report metadata is written to in testing mode
    #[arg(long, default_value = "results")]
    pub results_dir: PathBuf,

    /// Case to run; repeat to run several (default: all)
    #[arg(long = "case", value_enum)]
    pub cases: Vec<CaseKind>,
}

/// Settings for one job run
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub mode: ExecutionMode,
    pub testbed_path: PathBuf,
    pub parameters_dir: PathBuf,
    pub results_dir: PathBuf,
    pub cases: Vec<CaseKind>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Testing,
            testbed_path: "testbed.json".into(),
            parameters_dir: DEFAULT_PARAMETERS_DIR.into(),
            results_dir: "results".into(),
            cases: CaseKind::ALL.to_vec(),
        }
    }
}

impl From<Cli> for JobConfig {
    fn from(cli: Cli) -> Self {
        let cases = if cli.cases.is_empty() {
            CaseKind::ALL.to_vec()
        } else {
            // Each case runs once, in first-mentioned order
            cli.cases
                .into_iter()
                .collect::<IndexSet<_>>()
                .into_iter()
                .collect()
        };

        Self {
            mode: cli.mode,
            testbed_path: cli.testbed,
            parameters_dir: cli.parameters_dir,
            results_dir: cli.results_dir,
            cases,
        }
    }
}
