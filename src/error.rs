use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_VCARD_NOT_FOUND, ERR_VCARD_NOT_FOUND_MESSAGE};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Database open error: {0}")]
    DatabaseOpen(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("vCard not found: {requested_id}")]
    VCardNotFound {
        requested_id: String,
        sample_ids: Vec<String>,
    },

    /// Unknown public id; unlike `VCardNotFound` it lists no other ids
    #[error("vCard not found: {requested_id}")]
    PublicVCardNotFound { requested_id: String },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_)
            | AppError::VCardNotFound { .. }
            | AppError::PublicVCardNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::InvalidInput(ref msg)
            | AppError::Forbidden(ref msg)
            | AppError::NotFound(ref msg)
            | AppError::Conflict(ref msg) => json!({ "error": msg }),
            AppError::Unauthorized | AppError::InvalidCredentials => {
                json!({ "error": self.to_string() })
            }
            AppError::VCardNotFound {
                ref requested_id,
                ref sample_ids,
            } => json!({
                "error": ERR_VCARD_NOT_FOUND,
                "message": ERR_VCARD_NOT_FOUND_MESSAGE,
                "requestedId": requested_id,
                "sampleIds": sample_ids,
            }),
            AppError::PublicVCardNotFound { ref requested_id } => json!({
                "error": ERR_VCARD_NOT_FOUND,
                "message": ERR_VCARD_NOT_FOUND_MESSAGE,
                "requestedId": requested_id,
            }),
            ref internal => {
                tracing::error!("{:?}", internal);
                json!({
                    "error": "Internal Server Error",
                    "details": internal.to_string(),
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::Forbidden("x".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::VCardNotFound {
                requested_id: "x".into(),
                sample_ids: vec![],
            }
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::PasswordHash("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_public_vcard_not_found_body() {
        let error = AppError::PublicVCardNotFound {
            requested_id: "missing".into(),
        };
        assert_eq!(error.status(), StatusCode::NOT_FOUND);

        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"], ERR_VCARD_NOT_FOUND);
        assert_eq!(body["message"], ERR_VCARD_NOT_FOUND_MESSAGE);
        assert_eq!(body["requestedId"], "missing");
        assert!(body.get("sampleIds").is_none());
    }
}
