//! Process error types

use std::time::Duration;
use thiserror::Error;

/// Cloneable so a single coalesced start result can reach every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Failed to launch {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("No URL in output of pid {pid} after {waited:?}")]
    DiscoveryTimeout { pid: u32, waited: Duration },

    #[error("Output of pid {pid} ended before a URL appeared")]
    OutputClosed { pid: u32 },

    #[error("Reading output of pid {pid} failed: {reason}")]
    Output { pid: u32, reason: String },

    #[error("Failed to signal process group {pid}: {reason}")]
    Signal { pid: u32, reason: String },
}
