use axum::{
    Json,
    extract::{Path, State},
};
use redb::ReadableDatabase;
use serde::Serialize;

use crate::auth::MaybeUser;
use crate::constants::{ADMIN_USER_ROLE, DUMMY_USER_EMAIL, ERR_VCARD_NOT_OWNER, NOT_FOUND_SAMPLE_SIZE};
use crate::db::users::{find_user, resolve_owner};
use crate::db::vcards::{
    compose, delete_vcard, ensure_public_id, find_vcard, list_vcards, public_id_for,
    replace_social_links, resolve_identifier, sample_ids, save_vcard,
};
use crate::db::{ReadTables, new_id, now};
use crate::error::{AppError, Result};
use crate::models::{UserRecord, VCard, VCardInput, VCardRecord};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// 404 for an unknown card, listing a few ids that do exist
pub(crate) fn vcard_not_found(txn: &impl ReadTables, requested_id: &str) -> AppError {
    tracing::info!("vCard {} not found", requested_id);
    match sample_ids(txn, NOT_FOUND_SAMPLE_SIZE) {
        Ok(sample_ids) => AppError::VCardNotFound {
            requested_id: requested_id.to_string(),
            sample_ids,
        },
        Err(e) => e,
    }
}

/// Check that `caller` may modify `vcard`
///
/// Cards owned by the anonymous placeholder account are open to everyone.
fn ensure_can_modify(
    txn: &impl ReadTables,
    vcard: &VCardRecord,
    caller: Option<&UserRecord>,
) -> Result<()> {
    let owner = find_user(txn, &vcard.user_id)?;
    if owner.is_none_or(|owner| owner.email == DUMMY_USER_EMAIL) {
        return Ok(());
    }

    let caller = caller.ok_or(AppError::Unauthorized)?;
    if caller.id == vcard.user_id || caller.role == ADMIN_USER_ROLE {
        return Ok(());
    }

    tracing::warn!("User {} may not modify vCard {}", caller.id, vcard.id);
    Err(AppError::Forbidden(ERR_VCARD_NOT_OWNER.to_string()))
}

/// Create a card with its social links and public id
pub async fn create_vcard(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Json(input): Json<VCardInput>,
) -> Result<Json<VCard>> {
    let db = state.db.clone();

    let vcard = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        let owner = resolve_owner(&write_txn, caller.as_ref())?;
        let timestamp = now();
        let record = VCardRecord::create(new_id(), &owner.id, &input, timestamp)?;

        save_vcard(&write_txn, &record)?;
        if let Some(links) = &input.social_links {
            replace_social_links(&write_txn, &record.id, links.normalize())?;
        }
        ensure_public_id(&write_txn, &record.id, timestamp)?;

        let vcard = compose(&write_txn, record)?;
        write_txn.commit()?;
        Ok::<_, AppError>(vcard)
    })
    .await??;

    tracing::info!("Created vCard {} for user {}", vcard.id, vcard.user_id);
    Ok(Json(vcard))
}

/// Every card, newest first
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<VCard>>> {
    let db = state.db.clone();

    let vcards = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        list_vcards(&read_txn)?
            .into_iter()
            .map(|record| compose(&read_txn, record))
            .collect::<Result<Vec<_>>>()
    })
    .await??;

    Ok(Json(vcards))
}

/// Fetch a card by primary id or public id
///
/// A card without a public id gets one on first read.
pub async fn get_vcard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<VCard>> {
    let db = state.db.clone();

    let vcard = tokio::task::spawn_blocking(move || {
        {
            let read_txn = db.begin_read()?;
            let record = resolve_identifier(&read_txn, &id)?
                .ok_or_else(|| vcard_not_found(&read_txn, &id))?;
            if public_id_for(&read_txn, &record.id)?.is_some() {
                return compose(&read_txn, record);
            }
        }

        let write_txn = db.begin_write()?;
        let record = resolve_identifier(&write_txn, &id)?
            .ok_or_else(|| vcard_not_found(&write_txn, &id))?;
        ensure_public_id(&write_txn, &record.id, now())?;
        let vcard = compose(&write_txn, record)?;
        write_txn.commit()?;
        Ok::<_, AppError>(vcard)
    })
    .await??;

    Ok(Json(vcard))
}

pub async fn update_vcard(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
    Json(input): Json<VCardInput>,
) -> Result<Json<VCard>> {
    let db = state.db.clone();

    let vcard = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        let mut record = find_vcard(&write_txn, &id)?
            .ok_or_else(|| vcard_not_found(&write_txn, &id))?;
        ensure_can_modify(&write_txn, &record, caller.as_ref())?;

        record.apply_update(&input, now())?;
        save_vcard(&write_txn, &record)?;
        if let Some(links) = &input.social_links {
            replace_social_links(&write_txn, &record.id, links.normalize())?;
        }

        let vcard = compose(&write_txn, record)?;
        write_txn.commit()?;
        Ok::<_, AppError>(vcard)
    })
    .await??;

    tracing::info!("Updated vCard {}", vcard.id);
    Ok(Json(vcard))
}

/// Delete a card and everything hanging off it except its scan history
pub async fn remove_vcard(
    State(state): State<AppState>,
    MaybeUser(caller): MaybeUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let db = state.db.clone();
    let vcard_id = id.clone();

    tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        let record = find_vcard(&write_txn, &vcard_id)?
            .ok_or_else(|| vcard_not_found(&write_txn, &vcard_id))?;
        ensure_can_modify(&write_txn, &record, caller.as_ref())?;

        delete_vcard(&write_txn, &record.id)?;
        write_txn.commit()?;
        Ok::<_, AppError>(())
    })
    .await??;

    tracing::info!("Deleted vCard {}", id);
    Ok(Json(DeleteResponse { success: true }))
}
