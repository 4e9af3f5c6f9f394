use thiserror::Error;

/// Failures a sort invocation can report.
///
/// None of these are fatal: callers keep the last sorted output and retry on
/// the next trigger.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SortError {
    #[error("unsupported position format code {0}")]
    UnsupportedFormat(u8),

    #[error("position buffer holds {actual} bytes, expected {expected}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("required sort resource is missing: {0}")]
    MissingResource(&'static str),

    #[error("position transfer failed: {0}")]
    TransferFailure(String),

    #[error("invalid sort configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{count} elements exceed the key/index grid capacity of {capacity}")]
    CapacityExceeded { count: usize, capacity: usize },
}

impl SortError {
    /// Whether retrying with unchanged input can succeed. Everything else
    /// stays wrong until the source, the configuration or the camera changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::MissingResource(_) | Self::TransferFailure(_))
    }
}

pub type Result<T> = std::result::Result<T, SortError>;
