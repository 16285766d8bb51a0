//! Command dispatcher for running one command across many devices

use crate::device::Device;
use anyhow::Context;
use futures::future::join_all;
use ospf_verify_shared::{ResultCollector, ResultStatus};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info};

/// Output of one command on one device
#[derive(Debug, Clone, PartialEq)]
pub struct CommandExecutionResult {
    pub device: String,
    pub command: String,
    pub output: String,
    pub data: Value,
}

/// Successful executions keyed by device name.
///
/// A device missing from the map failed to execute or parse; it is never
/// "no data".
pub type DispatchResults = HashMap<String, CommandExecutionResult>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No target devices specified to execute command '{command}' against")]
    NoTargets { command: String },
}

/// Fans a command out to devices and collects what comes back
#[derive(Clone)]
pub struct CommandDispatcher {
    results: Arc<ResultCollector>,
}

impl CommandDispatcher {
    pub fn new(results: Arc<ResultCollector>) -> Self {
        Self { results }
    }

    /// Run `command` on every device concurrently, one task per device.
    ///
    /// Returns once every task has finished. A device whose execute or parse
    /// step fails (or whose task panics) is left out of the result map and
    /// does not affect the others.
    pub async fn dispatch(
        &self,
        command: &str,
        devices: &[Arc<dyn Device>],
    ) -> Result<DispatchResults, DispatchError> {
        if devices.is_empty() {
            return Err(DispatchError::NoTargets {
                command: command.to_string(),
            });
        }

        info!("Running command '{}' on devices: {}", command, devices.len());
        let start = Instant::now();

        let (names, tasks): (Vec<_>, Vec<_>) = devices
            .iter()
            .cloned()
            .map(|device| {
                let name = device.name().to_string();
                let command = command.to_string();
                let results = self.results.clone();
                let task = tokio::spawn(async move {
                    run_command_on_device(device.as_ref(), &command, &results).await
                });
                (name, task)
            })
            .unzip();

        let mut collected = DispatchResults::with_capacity(devices.len());
        for (name, outcome) in names.into_iter().zip(join_all(tasks).await) {
            match outcome {
                Ok(Ok(result)) => {
                    collected.insert(name, result);
                }
                Ok(Err(e)) => error!("Device {} generated an exception: {:#}", name, e),
                Err(e) => error!("Command task for device {} aborted: {}", name, e),
            }
        }

        info!(
            "Executed command '{}' on {}/{} devices in {:.2} seconds",
            command,
            collected.len(),
            devices.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(collected)
    }
}

/// Execute then parse on one device, recording the execution on success
async fn run_command_on_device(
    device: &dyn Device,
    command: &str,
    results: &ResultCollector,
) -> anyhow::Result<CommandExecutionResult> {
    let name = device.name();

    let output = device
        .execute(command)
        .await
        .with_context(|| format!("Failed to execute '{}' on device {}", command, name))?;
    info!(
        "Output of command '{}' from device {}:\n\n{}\n",
        command, name, output
    );

    let data = device
        .parse(command, &output)
        .with_context(|| format!("Failed to parse output of '{}' from device {}", command, name))?;
    debug!(
        "Parsed data resulting from output of command '{}' from device {}:\n\n{}\n",
        command,
        name,
        serde_json::to_string_pretty(&data).unwrap_or_default()
    );

    results.add_command_execution(name, command, output.clone(), Some(data.clone()));
    results.add_result(
        ResultStatus::Info,
        format!("Executed command '{}' on device {}", command, name),
    );

    Ok(CommandExecutionResult {
        device: name.to_string(),
        command: command.to_string(),
        output,
        data,
    })
}
