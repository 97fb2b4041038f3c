use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::core::errors::SplitError;
use crate::core::models::User;

// Request structs for JSON payloads
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: String,
}

/// The authenticated caller, placed in request extensions by the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

// Error response struct
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for SplitError to implement IntoResponse
pub struct ApiError(pub SplitError);

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            SplitError::MissingEmail
            | SplitError::InvalidEmail(_)
            | SplitError::InvalidSplitUser(_)
            | SplitError::InvalidSplit
            | SplitError::InvalidUpdates
            | SplitError::InvalidInput(..)
            | SplitError::AlreadyGroupMember(_)
            | SplitError::CannotRemoveCreator => StatusCode::BAD_REQUEST,
            SplitError::InvalidCredentials | SplitError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SplitError::NotGroupMember(_) => StatusCode::FORBIDDEN,
            SplitError::UserNotFound(_) | SplitError::GroupNotFound(_) | SplitError::ExpenseNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            SplitError::EmailAlreadyRegistered(_) | SplitError::UsernameTaken(_) => StatusCode::CONFLICT,
            SplitError::InternalServerError(_) | SplitError::StorageError(_) | SplitError::LoggingError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error_message = match self.0 {
            SplitError::InvalidInput(field, detail) => {
                format!("Invalid input for {}: {}", field, detail.description)
            }
            SplitError::InternalServerError(msg) | SplitError::StorageError(msg) | SplitError::LoggingError(msg) => {
                tracing::error!(error = %msg, "request failed");
                "Something went wrong".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
