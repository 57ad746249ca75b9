use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Type mismatch: column is {expected}, got value {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Duplicate dictionary value: {0}")]
    DuplicateValue(String),

    #[error("Invalid {value_type} value: {raw:?}")]
    InvalidValue { value_type: String, raw: String },

    #[error("Column not found: {0}")]
    UnknownColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
