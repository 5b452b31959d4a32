//! Error types for the espresso debug controller

use std::io;
use thiserror::Error;

/// Top-level error type
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Debugger error: {0}")]
    Debugger(#[from] DebuggerError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,

    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
}

/// Debugger errors
///
/// Only initialisation and the remote transport can fail. Pausing and
/// breakpoint bookkeeping are infallible.
#[derive(Error, Debug)]
pub enum DebuggerError {
    #[error("Debugger has already been initialised")]
    AlreadyInitialised,

    #[error("Failed to connect to debugger at {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("No debugger connected")]
    NotConnected,

    #[error("Debugger channel closed")]
    ChannelClosed,

    #[error("Failed to spawn debugger thread: {0}")]
    ThreadSpawn(String),
}

/// Result alias used across the workspace
pub type Result<T> = std::result::Result<T, EmulatorError>;
