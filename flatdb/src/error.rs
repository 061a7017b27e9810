use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the store and the driver.
///
/// Underlying I/O and parse errors are held behind `Arc` so that an error can
/// be both returned to the caller and kept in the driver's error list.
#[derive(Error, Debug, Clone)]
pub enum FlatDbError {
    #[error("record not found")]
    RecordNotFound,

    #[error("update failed, no record(s) to update")]
    UpdateFailed,

    #[error("failed to delete, unable to find any {entity} record with {key} {id}")]
    DeleteNotFound {
        entity: String,
        key: String,
        id: String,
    },

    #[error("no entity opened, call open() before reading results")]
    NotOpened,

    #[error("Unknown query operator: {0}")]
    UnknownOperator(String),

    #[error("Document at {} is not a JSON array", path.display())]
    InvalidDocument { path: PathBuf },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to persist {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    #[error("YAML error: {0}")]
    Yaml(#[source] Arc<serde_yaml::Error>),
}

impl From<std::io::Error> for FlatDbError {
    fn from(e: std::io::Error) -> Self {
        FlatDbError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for FlatDbError {
    fn from(e: serde_json::Error) -> Self {
        FlatDbError::Json(Arc::new(e))
    }
}

impl From<serde_yaml::Error> for FlatDbError {
    fn from(e: serde_yaml::Error) -> Self {
        FlatDbError::Yaml(Arc::new(e))
    }
}

pub type Result<T> = std::result::Result<T, FlatDbError>;
