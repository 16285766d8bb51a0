//! Testbed device set and connectivity phases

use crate::device::{Device, DeviceRecording, ReplayDevice};
use anyhow::{Context, Result};
use futures::future::join_all;
use indexmap::IndexMap;
use ospf_verify_shared::{ResultCollector, ResultStatus};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// On-disk testbed description for the replay transport
#[derive(Debug, Clone, Deserialize)]
pub struct TestbedFile {
    #[serde(default = "default_testbed_name")]
    pub name: String,
    pub devices: IndexMap<String, DeviceRecording>,
}

fn default_testbed_name() -> String {
    "testbed".into()
}

/// Named, ordered set of devices a job runs against
pub struct Testbed {
    name: String,
    devices: Vec<Arc<dyn Device>>,
}

impl Testbed {
    pub fn new(name: impl Into<String>, devices: Vec<Arc<dyn Device>>) -> Self {
        Self {
            name: name.into(),
            devices,
        }
    }

    /// Build a testbed of replay devices from a parsed testbed file
    pub fn from_recordings(file: TestbedFile) -> Self {
        let devices = file
            .devices
            .into_iter()
            .map(|(name, recording)| {
                let device = ReplayDevice::new(name, recording);
                debug!(
                    "Added device {} (os: {})",
                    device.name(),
                    device.os().unwrap_or("unknown")
                );
                Arc::new(device) as Arc<dyn Device>
            })
            .collect();
        Self::new(file.name, devices)
    }

    /// Load a testbed file from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read testbed file '{}'", path.display()))?;
        let file: TestbedFile = serde_json::from_str(&content)
            .with_context(|| format!("Invalid testbed file '{}'", path.display()))?;

        info!(
            "Loaded testbed '{}' with {} devices from '{}'",
            file.name,
            file.devices.len(),
            path.display()
        );
        Ok(Self::from_recordings(file))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn devices(&self) -> &[Arc<dyn Device>] {
        &self.devices
    }

    pub fn device_names(&self) -> Vec<String> {
        self.devices.iter().map(|d| d.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Connect to every device concurrently, one task per device.
    ///
    /// Connection failures are logged; use [`Testbed::verify_connected`]
    /// afterwards to turn them into results.
    pub async fn connect_all(&self) {
        info!("Connecting to devices in testbed {}", self.name);
        let start = Instant::now();

        let tasks = self.devices.iter().cloned().map(|device| {
            tokio::spawn(async move {
                info!("Connecting to device {}", device.name());
                let started = Instant::now();
                match device.connect().await {
                    Ok(()) => info!(
                        "Successfully connected to device {} in {:.2} seconds",
                        device.name(),
                        started.elapsed().as_secs_f64()
                    ),
                    Err(e) => error!("Failed to connect to device {}: {:#}", device.name(), e),
                }
            })
        });
        for outcome in join_all(tasks).await {
            if let Err(e) = outcome {
                error!("Connect task failed: {}", e);
            }
        }

        info!(
            "Connection phase for all devices finished in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
    }

    /// Record a failure for every device without an open session.
    ///
    /// Returns `true` when all devices are connected.
    pub fn verify_connected(&self, results: &ResultCollector) -> bool {
        info!("Verifying connection to all devices");
        let mut all_connected = true;

        for device in &self.devices {
            if device.is_connected() {
                info!("Device {} is connected", device.name());
            } else {
                all_connected = false;
                results.add_result(
                    ResultStatus::Failed,
                    format!("Failed to connect to device {}", device.name()),
                );
            }
        }

        all_connected
    }

    /// Disconnect every connected device concurrently
    pub async fn disconnect_all(&self) {
        info!("Disconnecting from all devices");
        let start = Instant::now();

        let tasks = self.devices.iter().cloned().map(|device| {
            tokio::spawn(async move {
                if !device.is_connected() {
                    info!("Not currently connected to device {}", device.name());
                    return;
                }
                let started = Instant::now();
                match device.disconnect().await {
                    Ok(()) => info!(
                        "Successfully disconnected from device {} in {:.2} seconds",
                        device.name(),
                        started.elapsed().as_secs_f64()
                    ),
                    Err(e) => error!("Failed to disconnect from device {}: {:#}", device.name(), e),
                }
            })
        });
        for outcome in join_all(tasks).await {
            if let Err(e) = outcome {
                error!("Disconnect task failed: {}", e);
            }
        }

        info!(
            "All device disconnections completed in {:.2} seconds",
            start.elapsed().as_secs_f64()
        );
    }
}
