//! Device capability abstraction for pluggable transports

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A network device the job can run show commands against.
///
/// The job never manages transport details itself; it only connects,
/// executes, parses and disconnects through this trait. Implementations are
/// shared across tasks behind an `Arc`, so all methods take `&self`.
#[async_trait]
pub trait Device: Send + Sync {
    /// Name of the device in the testbed
    fn name(&self) -> &str;

    /// Whether the device currently has an open session
    fn is_connected(&self) -> bool;

    /// Open a session to the device
    async fn connect(&self) -> Result<()>;

    /// Close the session gracefully
    async fn disconnect(&self) -> Result<()>;

    /// Run a command and return its raw text output
    async fn execute(&self, command: &str) -> Result<String>;

    /// Turn the raw output of `command` into structured data
    fn parse(&self, command: &str, output: &str) -> Result<Value>;
}
