use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
};
use redb::ReadableDatabase;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_NFC_CARD_ID_REQUIRED, ERR_NFC_LINK_NOT_FOUND, ERR_PUBLIC_LINK_NOT_FOUND,
    ERR_VCARD_NOT_FOUND,
};
use crate::db::scans::{record_scan, scan_stats, scans_for};
use crate::db::vcards::{compose, find_by_public_id, find_nfc_link, find_vcard, public_id_for, upsert_nfc_link};
use crate::db::{ReadTables, now};
use crate::error::{AppError, Result};
use crate::models::scan::classify_device;
use crate::models::vcard::present;
use crate::models::{NfcLink, ScanLogRecord, ScanType, VCard, VCardRecord};
use crate::routes::validation::{required_text, timestamp_to_rfc3339};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub via: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LastScan {
    pub created_at: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub qr_code_url: String,
    pub public_id: String,
    pub scan_count: u64,
    pub last_scan: Option<LastScan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramNfcRequest {
    pub nfc_card_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfcLinkResponse {
    #[serde(flatten)]
    pub link: NfcLink,
    pub scan_count: u64,
}

fn existing_vcard(txn: &impl ReadTables, vcard_id: &str) -> Result<VCardRecord> {
    find_vcard(txn, vcard_id)?.ok_or_else(|| AppError::NotFound(ERR_VCARD_NOT_FOUND.to_string()))
}

/// Public card view, logging one scan per request
///
/// `?via=nfc` marks the scan as an NFC tap; the device class comes from
/// `?device=` or the User-Agent.
pub async fn view_public(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
    Query(query): Query<ScanQuery>,
    headers: HeaderMap,
) -> Result<Json<VCard>> {
    let scan_type = ScanType::from_query(query.via.as_deref());
    let device_type = present(query.device.as_deref()).unwrap_or_else(|| {
        classify_device(
            headers
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok()),
        )
    });
    let db = state.db.clone();

    let vcard = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        let record = find_by_public_id(&write_txn, &public_id)?.ok_or_else(|| {
            tracing::info!("Public vCard {} not found", public_id);
            AppError::PublicVCardNotFound {
                requested_id: public_id.clone(),
            }
        })?;

        let scan = ScanLogRecord {
            vcard_id: record.id.clone(),
            scan_type,
            device_type,
            created_at: now(),
        };
        record_scan(&write_txn, &scan)?;

        let vcard = compose(&write_txn, record)?;
        write_txn.commit()?;
        Ok::<_, AppError>(vcard)
    })
    .await??;

    tracing::info!("{} scan of vCard {}", scan_type.as_str(), vcard.id);
    Ok(Json(vcard))
}

/// Share link for the card's QR code with its QR scan stats
pub async fn qr_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QrCodeResponse>> {
    let db = state.db.clone();

    let (public_id, scans) = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;

        existing_vcard(&read_txn, &id)?;
        let public_id = public_id_for(&read_txn, &id)?
            .ok_or_else(|| AppError::NotFound(ERR_PUBLIC_LINK_NOT_FOUND.to_string()))?;

        Ok::<_, AppError>((public_id, scans_for(&read_txn, &id)?))
    })
    .await??;

    let (scan_count, last_scan) = scan_stats(&scans, ScanType::Qr);

    Ok(Json(QrCodeResponse {
        qr_code_url: state.config.share_url(&public_id),
        public_id,
        scan_count,
        last_scan: last_scan.map(|created_at| LastScan {
            created_at: timestamp_to_rfc3339(created_at),
        }),
    }))
}

/// Associate the card with a physical NFC tag
pub async fn program_nfc(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<ProgramNfcRequest>,
) -> Result<Json<NfcLink>> {
    let db = state.db.clone();

    let link = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;

        existing_vcard(&write_txn, &id)?;
        let nfc_card_id = required_text(payload.nfc_card_id.as_deref(), ERR_NFC_CARD_ID_REQUIRED)?;

        let record = upsert_nfc_link(&write_txn, &id, &nfc_card_id, now())?;
        write_txn.commit()?;
        Ok::<_, AppError>(NfcLink::new(&id, &record))
    })
    .await??;

    tracing::info!("Programmed NFC tag {} for vCard {}", link.nfc_card_id, link.vcard_id);
    Ok(Json(link))
}

pub async fn nfc_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NfcLinkResponse>> {
    let db = state.db.clone();

    let response = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;

        existing_vcard(&read_txn, &id)?;
        let record = find_nfc_link(&read_txn, &id)?
            .ok_or_else(|| AppError::NotFound(ERR_NFC_LINK_NOT_FOUND.to_string()))?;
        let (scan_count, _) = scan_stats(&scans_for(&read_txn, &id)?, ScanType::Nfc);

        Ok::<_, AppError>(NfcLinkResponse {
            link: NfcLink::new(&id, &record),
            scan_count,
        })
    })
    .await??;

    Ok(Json(response))
}
