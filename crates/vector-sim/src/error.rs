// crates/vector-sim/src/error.rs

use thiserror::Error;

use vector_core::VectorError;

/// Errors surfaced by the simulator.
#[derive(Debug, Error)]
pub enum SimError {
    /// Config file could not be read.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for `SimConfig`.
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A decimal amount in the config is malformed.
    #[error("Invalid amount '{value}': {reason}")]
    Amount { value: String, reason: String },

    /// A protocol operation failed.
    #[error("Protocol error: {0}")]
    Protocol(#[from] VectorError),
}
