use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

impl FieldError {
    pub fn new(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        FieldError {
            field: field.to_string(),
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug, Serialize)]
pub enum SplitError {
    #[error("Email is required")]
    MissingEmail,
    #[error("Email {0} already registered")]
    EmailAlreadyRegistered(String),
    #[error("Username {0} is already taken")]
    UsernameTaken(String),
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("Cannot remove group creator")]
    CannotRemoveCreator,
    #[error("Invalid split user: {0}")]
    InvalidSplitUser(String),
    #[error("Invalid split amounts")]
    InvalidSplit,
    #[error("Invalid updates")]
    InvalidUpdates,
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl SplitError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_input(field: &str, title: impl Into<String>, description: impl Into<String>) -> Self {
        SplitError::InvalidInput(field.to_string(), FieldError::new(field, title, description))
    }
}
