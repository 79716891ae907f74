//! Error types.
//!
//! Two layers:
//!
//! - `ValuationError` is what the valuation core returns (config, lookup, input guards)
//! - `AppError` is what the binary reports: a message plus a process exit code

use std::path::PathBuf;

use thiserror::Error;

/// Factor table schema violations. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read factor file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse factor configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Missing required factor entry '{0}'")]
    MissingKey(String),

    #[error("Factor '{key}' must be positive (got {value})")]
    NonPositive { key: String, value: f64 },

    #[error("Factor '{key}' is invalid: {reason}")]
    Invalid { key: String, reason: String },
}

/// Which factor table a failed lookup was made against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    Location,
    PropertyType,
}

impl std::fmt::Display for LookupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupKind::Location => write!(f, "location"),
            LookupKind::PropertyType => write!(f, "property type"),
        }
    }
}

/// Errors surfaced by rule evaluation and blending.
#[derive(Debug, Error)]
pub enum ValuationError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Unknown {kind} '{key}' (not present in the factor table)")]
    Lookup { kind: LookupKind, key: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ValuationError {
    pub fn lookup(kind: LookupKind, key: impl Into<String>) -> Self {
        Self::Lookup {
            kind,
            key: key.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Exit code used when this error terminates the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            ValuationError::Config(_) => 2,
            ValuationError::Lookup { .. } => 3,
            ValuationError::InvalidInput(_) => 4,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::new(2, err.to_string())
    }
}

impl From<ValuationError> for AppError {
    fn from(err: ValuationError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
