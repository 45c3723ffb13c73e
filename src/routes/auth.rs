use axum::{Json, extract::State};
use redb::ReadableDatabase;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::constants::{
    DUMMY_USER_EMAIL, ERR_EMAIL_RESERVED, ERR_INVALID_EMAIL, ERR_PASSWORD_TOO_SHORT,
    ERR_USER_EXISTS, MIN_PASSWORD_LENGTH,
};
use crate::db::users::{find_user_by_email, save_user};
use crate::db::{new_id, now};
use crate::error::{AppError, Result};
use crate::models::{User, UserRecord};
use crate::models::user::normalize_email;
use crate::models::vcard::present;
use crate::security::{hash_password, issue_token, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: User,
}

fn session_for(state: &AppState, user: &UserRecord) -> SessionResponse {
    SessionResponse {
        token: issue_token(&user.id, &state.config.session_secret, now(), state.config.session_ttl_secs),
        user: User::from(user),
    }
}

/// Register a password account
///
/// An email that only exists as a placeholder (invited to a team, or the
/// anonymous card owner) is claimed by the first registration.
///
/// Returns 409 Conflict if the email already has a password or belongs to the
/// anonymous card owner.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<SessionResponse>> {
    let email = present(payload.email.as_deref())
        .filter(|email| User::validate_email(email))
        .ok_or_else(|| AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()))?;

    if normalize_email(&email) == DUMMY_USER_EMAIL {
        tracing::warn!("Registration rejected, placeholder owner address");
        return Err(AppError::Conflict(ERR_EMAIL_RESERVED.to_string()));
    }

    let password = payload.password.unwrap_or_default();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(ERR_PASSWORD_TOO_SHORT.to_string()));
    }

    let name = present(payload.name.as_deref()).unwrap_or_else(|| User::default_name(&email));
    let db = state.db.clone();

    let user = tokio::task::spawn_blocking(move || {
        let password_hash = hash_password(&password)?;

        let write_txn = db.begin_write()?;
        let user = match find_user_by_email(&write_txn, &email)? {
            Some(existing) if !existing.is_placeholder() => {
                tracing::info!("Registration rejected, email already registered");
                return Err(AppError::Conflict(ERR_USER_EXISTS.to_string()));
            }
            Some(placeholder) => {
                tracing::info!("Claiming placeholder account {}", placeholder.id);
                UserRecord {
                    name,
                    password_hash: Some(password_hash),
                    ..placeholder
                }
            }
            None => UserRecord {
                password_hash: Some(password_hash),
                ..UserRecord::new(new_id(), &name, &email, now())
            },
        };
        save_user(&write_txn, &user)?;
        write_txn.commit()?;

        Ok::<_, AppError>(user)
    })
    .await??;

    tracing::info!("User {} registered", user.id);
    Ok(Json(session_for(&state, &user)))
}

/// Exchange email and password for a session token
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let email = present(payload.email.as_deref()).ok_or(AppError::InvalidCredentials)?;
    let password = payload.password.unwrap_or_default();
    let db = state.db.clone();

    let user = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let user = find_user_by_email(&read_txn, &email)?.ok_or(AppError::InvalidCredentials)?;

        let hash = user.password_hash.as_deref().ok_or(AppError::InvalidCredentials)?;
        if !verify_password(&password, hash)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok::<_, AppError>(user)
    })
    .await??;

    tracing::info!("User {} signed in", user.id);
    Ok(Json(session_for(&state, &user)))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(User::from(&user))
}
