//! Command dispatch across the testbed
//!
//! This module handles:
//! - Running one command on many devices concurrently
//! - Isolating per-device transport and parse failures
//! - Recording each successful execution as it completes

pub mod dispatcher;

pub use dispatcher::{CommandDispatcher, DispatchError, DispatchResults};
