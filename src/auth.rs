//! Session extractors
//!
//! Handlers take `CurrentUser` when a session is mandatory and `MaybeUser`
//! when anonymous callers are allowed. A token that is present but invalid
//! is rejected in both cases.

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use redb::ReadableDatabase;

use crate::db::{self, users::find_user};
use crate::error::{AppError, Result};
use crate::models::UserRecord;
use crate::security::verify_token;
use crate::AppState;

/// The signed-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserRecord);

/// The signed-in user, if the request carried a session token
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<UserRecord>);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn load_session_user(state: &AppState, token: &str) -> Result<UserRecord> {
    let user_id = verify_token(token, &state.config.session_secret, db::now()).ok_or_else(|| {
        tracing::warn!("Rejected invalid or expired session token");
        AppError::Unauthorized
    })?;

    let db = state.db.clone();
    let user = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        find_user(&read_txn, &user_id)
    })
    .await??;

    user.ok_or_else(|| {
        tracing::warn!("Session token refers to a missing user");
        AppError::Unauthorized
    })
}

#[axum::async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        Ok(Self(load_session_user(state, token).await?))
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match bearer_token(parts) {
            Some(token) => Ok(Self(Some(load_session_user(state, token).await?))),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header_value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header_value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc.1.ff"))), Some("abc.1.ff"));
        assert_eq!(bearer_token(&parts_with(Some("Basic xyz"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
