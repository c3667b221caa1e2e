// ⚠️ Error taxonomy for the build planner
// Every failure path ends in a usable build list: hydration falls through,
// imports leave state untouched, clipboard failures are ignored.

use thiserror::Error;

/// Result type for library operations
pub type Result<T> = std::result::Result<T, BuildError>;

/// Why an import file was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// Content is not JSON at all
    #[error("Error parsing JSON file: {0}")]
    InvalidJson(String),

    /// Content is JSON but not an array
    #[error("Invalid JSON format: expected an array of rows")]
    NotAnArray,

    /// Element at `index` is not a row-shaped object
    #[error("Invalid JSON format: element {index} is not a row")]
    InvalidRow { index: usize },
}

#[derive(Debug, Error)]
pub enum BuildError {
    /// Default document could not be retrieved (missing file, non-success status)
    #[error("default document unavailable: {0}")]
    NetworkUnavailable(String),

    /// Stored value is absent, empty or not an array of rows
    #[error("persisted build is unusable: {0}")]
    MalformedPersistedState(String),

    /// Import file rejected; current build is left untouched
    #[error(transparent)]
    MalformedImportFile(#[from] FormatError),

    /// Clipboard sink refused the summary text
    #[error("clipboard write failed: {0}")]
    ClipboardWriteFailure(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for BuildError {
    fn from(err: toml::de::Error) -> Self {
        BuildError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for BuildError {
    fn from(err: toml::ser::Error) -> Self {
        BuildError::Config(err.to_string())
    }
}
