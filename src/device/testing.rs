//! In-memory devices for tests

use crate::device::traits::Device;
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Barrier;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Behavior {
    Ok,
    FailExecute,
    FailParse,
    Panic,
    Unreachable,
}

/// Device returning canned parsed data, with switchable failure modes
pub struct FakeDevice {
    name: String,
    parsed: Mutex<Value>,
    behavior: Behavior,
    connected: AtomicBool,
    executions: AtomicUsize,
    gate: Option<Arc<Barrier>>,
    delay: Option<Duration>,
}

impl FakeDevice {
    fn with_behavior(name: &str, parsed: Value, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            parsed: Mutex::new(parsed),
            behavior,
            connected: AtomicBool::new(behavior != Behavior::Unreachable),
            executions: AtomicUsize::new(0),
            gate: None,
            delay: None,
        }
    }

    /// A connected device that answers with `parsed`
    pub fn new(name: &str, parsed: Value) -> Self {
        Self::with_behavior(name, parsed, Behavior::Ok)
    }

    pub fn failing_execute(name: &str) -> Self {
        Self::with_behavior(name, json!({}), Behavior::FailExecute)
    }

    pub fn failing_parse(name: &str) -> Self {
        Self::with_behavior(name, json!({}), Behavior::FailParse)
    }

    pub fn panicking(name: &str) -> Self {
        Self::with_behavior(name, json!({}), Behavior::Panic)
    }

    /// Starts disconnected and refuses to connect
    pub fn unreachable(name: &str) -> Self {
        Self::with_behavior(name, json!({}), Behavior::Unreachable)
    }

    /// Blocks in `execute` until every holder of `gate` has arrived
    pub fn gated(name: &str, parsed: Value, gate: Arc<Barrier>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(name, parsed)
        }
    }

    /// Takes `delay` to answer each command
    pub fn slow(name: &str, parsed: Value, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(name, parsed)
        }
    }

    /// Replace the data returned by `parse`
    pub fn set_parsed(&self, parsed: Value) {
        *self.parsed.lock().unwrap() = parsed;
    }

    pub fn executions(&self) -> usize {
        self.executions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Device for FakeDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self) -> Result<()> {
        if self.behavior == Behavior::Unreachable {
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
        self.executions.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.behavior {
            Behavior::FailExecute => Err(anyhow!("connection reset by {}", self.name)),
            Behavior::Panic => panic!("transport crashed on {}", self.name),
            _ if !self.is_connected() => bail!("Device {} is not connected", self.name),
            _ => Ok(format!("{}# {}", self.name, command)),
        }
    }

    fn parse(&self, command: &str, _output: &str) -> Result<Value> {
        if self.behavior == Behavior::FailParse {
            bail!("no parser for '{}'", command);
        }
        Ok(self.parsed.lock().unwrap().clone())
    }
}

/// Parsed `show ip ospf neighbor` output for one interface with the given
/// neighbors as `(router id, address, priority, state)`
pub fn ospf_interface(neighbors: &[(&str, &str, &str, &str)]) -> Value {
    let mut table = serde_json::Map::new();
    for (id, address, priority, state) in neighbors {
        table.insert(
            id.to_string(),
            json!({
                "address": address,
                "priority": priority,
                "state": state,
                "dead_time": "00:00:35"
            }),
        );
    }
    json!({ "neighbors": table })
}

pub fn into_devices(devices: Vec<Arc<FakeDevice>>) -> Vec<Arc<dyn Device>> {
    devices
        .into_iter()
        .map(|d| d as Arc<dyn Device>)
        .collect()
}
