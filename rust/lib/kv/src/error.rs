use thiserror::Error;

#[derive(Error, Debug)]
pub enum KVError {
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored value could not be interpreted (e.g. a sequence counter
    /// that is not 8 bytes).
    #[error("corrupt value at '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

impl KVError {
    pub(crate) fn storage(e: impl std::fmt::Display) -> Self {
        KVError::Storage(e.to_string())
    }
}
