//! Core infrastructure for the espresso debug controller
//!
//! Shared by every crate in the workspace:
//! - Configuration loading and persistence
//! - Error types
//! - Logging initialisation and component log macros

pub mod config;
pub mod error;
pub mod logging;

pub use config::Config;
pub use error::{EmulatorError, Result};
