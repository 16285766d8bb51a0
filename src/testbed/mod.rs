//! Testbed management
//!
//! This module handles:
//! - Loading the device set from a testbed file
//! - Connecting to all devices concurrently
//! - Verifying every device ended up connected
//! - Disconnecting from all devices at the end of a job

mod manager;

pub use manager::Testbed;
