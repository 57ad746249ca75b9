use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexError>;

/// Errors raised while configuring measures or building an index
///
/// None of them is transient: the caller decides whether to skip the
/// column pair or abort the run.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Cannot score {left} against {right}: {reason}")]
    Computation {
        left: String,
        right: String,
        reason: String,
    },

    #[error("Input shape mismatch: right dictionary has {dictionary} entries, cluster table has {clusters}")]
    InputShape { dictionary: usize, clusters: usize },

    #[error("Index build cancelled")]
    Cancelled,
}

impl IndexError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        IndexError::Configuration(msg.into())
    }
}
