//! Logging infrastructure for the espresso debug controller

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogLevel};

/// Map a configured log level to a tracing level
pub fn level_for(log_level: LogLevel) -> Option<Level> {
    match log_level {
        LogLevel::Off => None,
        LogLevel::Error => Some(Level::ERROR),
        LogLevel::Warn => Some(Level::WARN),
        LogLevel::Info => Some(Level::INFO),
        LogLevel::Debug => Some(Level::DEBUG),
        LogLevel::Trace => Some(Level::TRACE),
    }
}

/// Initialize the logging system based on configuration
pub fn init(config: &Config) {
    let Some(level) = level_for(config.debug.log_level) else {
        return;
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true),
    );

    if config.debug.log_to_file {
        if let Ok(file) = std::fs::File::create(&config.debug.log_path) {
            let file_layer = fmt::layer().with_writer(file).with_ansi(false);
            let _ = subscriber.with(file_layer).try_init();
        } else {
            let _ = subscriber.try_init();
        }
    } else {
        let _ = subscriber.try_init();
    }
}

/// Initialize logging with default settings (for tests and quick starts)
pub fn init_default() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_test_writer())
        .try_init();
}

// Convenience macros for component-specific logging

/// Log a CPU core trace message
#[macro_export]
macro_rules! cpu_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "cpu", $($arg)*)
    };
}

/// Log a CPU core debug message
#[macro_export]
macro_rules! cpu_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "cpu", $($arg)*)
    };
}

/// Log a debugger trace message
#[macro_export]
macro_rules! debugger_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "debugger", $($arg)*)
    };
}

/// Log a debugger debug message
#[macro_export]
macro_rules! debugger_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "debugger", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_for(LogLevel::Off), None);
        assert_eq!(level_for(LogLevel::Warn), Some(Level::WARN));
        assert_eq!(level_for(LogLevel::Trace), Some(Level::TRACE));
    }

    #[test]
    fn test_init_is_idempotent() {
        init_default();
        init_default();
        init(&Config::default());
    }
}
