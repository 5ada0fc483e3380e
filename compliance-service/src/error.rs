use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("Sanctions list not loaded: {0}")]
    ListNotLoaded(String),

    #[error("Entry not found: {principal} in {list}")]
    EntryNotFound { list: String, principal: String },

    #[error("Invalid screening input: {0}")]
    InvalidInput(String),

    #[error("Sanctions list import failed: {0}")]
    ImportFailed(String),
}

impl From<serde_json::Error> for ComplianceError {
    fn from(err: serde_json::Error) -> Self {
        ComplianceError::ImportFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ComplianceError>;
