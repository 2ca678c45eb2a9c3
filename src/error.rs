use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentAuditError {
    #[error("Could not read document '{document}': {source}")]
    DocumentParse {
        document: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not load the reference table: {0}")]
    TableLoad(String),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, IntentAuditError>;
