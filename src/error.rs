//! Error types for the panel.
//!
//! None of these reach the widget's user as a failure: the widget turns
//! transport problems into a status colour and logs the rest. They exist
//! for the host (config loading, terminal setup) and for transports.

use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the config file failed
    #[error("Config file I/O failed for {path}: {source}")]
    Io {
        /// The config file path.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The default config could not be serialized
    #[error("Config serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of its accepted range
    #[error("Invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Transport errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    /// The connection is not open
    #[error("Transport not connected")]
    NotConnected,

    /// Publishing on a topic that was never advertised
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// The configured message type is not a velocity message
    #[error("Unsupported message type: {0}")]
    UnsupportedType(String),
}

/// Top-level error type for the panel host
#[derive(Error, Debug)]
pub enum PanelError {
    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Terminal or other I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Gamepad backend could not start
    #[error("Gamepad init failed: {0}")]
    Gamepad(String),
}

/// Result type alias using `PanelError`
pub type Result<T> = std::result::Result<T, PanelError>;
