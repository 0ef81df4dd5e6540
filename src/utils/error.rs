use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Storage request `{operation}` failed for key {key}: {source}")]
    StorageFailure {
        operation: &'static str,
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("Not able to encode incoming document {path}: {source}")]
    TransferFailure {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Listed key {key} does not start with store root {root:?}")]
    ForeignKey { key: String, root: String },

    #[error("Serialization error: {message}")]
    SerializationError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value {value:?} for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    Storage,
    Transfer,
    Input,
    Configuration,
}

impl StoreError {
    pub fn storage(operation: &'static str, key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::StorageFailure {
            operation,
            key: key.into(),
            source: source.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    pub fn is_transfer_failure(&self) -> bool {
        matches!(self, StoreError::TransferFailure { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StoreError::NotFound { .. } => ErrorCategory::NotFound,
            StoreError::StorageFailure { .. } | StoreError::ForeignKey { .. } => ErrorCategory::Storage,
            StoreError::TransferFailure { .. } => ErrorCategory::Transfer,
            StoreError::InvalidPath { .. } | StoreError::SerializationError { .. } => ErrorCategory::Input,
            StoreError::IoError(_)
            | StoreError::ConfigError { .. }
            | StoreError::ConfigValidationError { .. }
            | StoreError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
