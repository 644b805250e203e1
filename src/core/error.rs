use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────────────────────

/// The two failure kinds the core reports.
///
/// `Validation` means the request itself was rejected and nothing changed.
/// `Io` means the store or a file could not be read or written; the session
/// keeps its last good in-memory state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Io(String),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        CoreError::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Io(format!("invalid stored data: {}", e))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
