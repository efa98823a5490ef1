//! Error handling for vibscope
//!
//! This module defines custom error types and a Result alias for use
//! throughout the crate. The decoder, history buffer and viewport logic are
//! infallible; errors come from the transport, configuration and channels.

use thiserror::Error;

/// Main error type for vibscope operations
#[derive(Error, Debug)]
pub enum VibError {
    /// Transport-level failures (open/read/write) not covered by a more specific variant
    #[error("Transport error: {0}")]
    Transport(String),

    /// Errors reported by the serial port driver
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<VibError>,
    },
}

impl VibError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        VibError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Returns true if the error originated in the transport layer
    pub fn is_transport(&self) -> bool {
        match self {
            VibError::Transport(_) | VibError::Serial(_) | VibError::Io(_) => true,
            VibError::WithContext { source, .. } => source.is_transport(),
            _ => false,
        }
    }
}

impl From<toml::de::Error> for VibError {
    fn from(err: toml::de::Error) -> Self {
        VibError::Serialization(err.to_string())
    }
}

impl From<toml::ser::Error> for VibError {
    fn from(err: toml::ser::Error) -> Self {
        VibError::Serialization(err.to_string())
    }
}

/// Result type alias for vibscope operations
pub type Result<T> = std::result::Result<T, VibError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}
