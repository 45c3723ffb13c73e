use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::auth::MaybeUser;
use crate::constants::ERR_UPLOAD_FIELDS_REQUIRED;
use crate::db::files::save_file;
use crate::db::users::resolve_owner;
use crate::db::{new_id, now};
use crate::error::{AppError, Result};
use crate::models::vcard::present;
use crate::models::{File, FileRecord};
use crate::security::generate_storage_key;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file: File,
}

/// Record upload metadata and hand out the storage key
///
/// The file bytes never pass through this server.
pub async fn upload_file(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(payload): Json<UploadRequest>,
) -> Result<Json<UploadResponse>> {
    let (Some(filename), Some(content_type)) = (
        present(payload.filename.as_deref()),
        present(payload.content_type.as_deref()),
    ) else {
        return Err(AppError::InvalidInput(ERR_UPLOAD_FIELDS_REQUIRED.to_string()));
    };
    let db = state.db.clone();

    let file = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        let owner = resolve_owner(&write_txn, caller.as_ref())?;
        let record = FileRecord {
            id: new_id(),
            key: generate_storage_key(&owner.id, &filename),
            filename,
            content_type,
            user_id: owner.id,
            created_at: now(),
        };
        save_file(&write_txn, &record)?;
        write_txn.commit()?;

        Ok::<_, AppError>(record)
    })
    .await??;

    tracing::info!("Saved upload metadata {} ({})", file.key, file.content_type);
    Ok(Json(UploadResponse {
        message: "File metadata saved successfully",
        file: File::from(file),
    }))
}
