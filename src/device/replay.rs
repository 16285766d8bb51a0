//! Replay transport serving recorded command output
//!
//! Lets a job run offline against captured device state. Each recording
//! holds the raw output of a command and, optionally, the structured data a
//! vendor parser produced for it.

use crate::device::traits::Device;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Captured result of one command
#[derive(Debug, Clone, Deserialize)]
pub struct RecordedCommand {
    pub output: String,
    /// Parser output; `None` makes `parse` fail for this command
    #[serde(default)]
    pub parsed: Option<Value>,
}

/// Everything recorded for one device
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceRecording {
    /// An unreachable device fails to connect
    #[serde(default = "default_reachable")]
    pub reachable: bool,
    #[serde(default)]
    pub os: Option<String>,
    #[serde(default)]
    pub commands: HashMap<String, RecordedCommand>,
}

fn default_reachable() -> bool {
    true
}

/// Device that answers commands from a recording
pub struct ReplayDevice {
    name: String,
    recording: DeviceRecording,
    connected: AtomicBool,
}

impl ReplayDevice {
    pub fn new(name: impl Into<String>, recording: DeviceRecording) -> Self {
        Self {
            name: name.into(),
            recording,
            connected: AtomicBool::new(false),
        }
    }

    pub fn os(&self) -> Option<&str> {
        self.recording.os.as_deref()
    }

    fn recorded(&self, command: &str) -> Result<&RecordedCommand> {
        self.recording
            .commands
            .get(command)
            .ok_or_else(|| anyhow!("No recording of '{}' for device {}", command, self.name))
    }
}

#[async_trait]
impl Device for ReplayDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<()> {
        if !self.recording.reachable {
            bail!("Device {} is unreachable", self.name);
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn execute(&self, command: &str) -> Result<String> {
        if !self.is_connected() {
            bail!("Device {} is not connected", self.name);
        }
        debug!("Replaying '{}' on {}", command, self.name);
        Ok(self.recorded(command)?.output.clone())
    }

    fn parse(&self, command: &str, _output: &str) -> Result<Value> {
        self.recorded(command)?
            .parsed
            .clone()
            .ok_or_else(|| anyhow!("No parser output for '{}' on device {}", command, self.name))
    }
}
