use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use redb::ReadableDatabase;
use serde::Deserialize;

use crate::analytics::{self, AnalyticsSummary, CardAnalytics, Overview};
use crate::db::scans::{all_scans, scans_for};
use crate::db::vcards::{find_vcard, list_vcards};
use crate::error::{AppError, Result};
use crate::models::TimeRange;
use crate::routes::vcards::vcard_not_found;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    pub time_range: Option<String>,
}

impl AnalyticsQuery {
    /// Selected window and its start as a Unix timestamp
    fn window(&self) -> (TimeRange, i64) {
        let time_range = TimeRange::from_param(self.time_range.as_deref());
        (time_range, time_range.start(Utc::now()).timestamp())
    }
}

/// Scan analytics across every card
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsSummary>> {
    let (time_range, since) = query.window();
    let db = state.db.clone();

    let summary = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let vcards = list_vcards(&read_txn)?;
        let scans = all_scans(&read_txn)?;
        Ok::<_, AppError>(analytics::summarize(&vcards, &scans, time_range, since))
    })
    .await??;

    Ok(Json(summary))
}

pub async fn card_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<CardAnalytics>> {
    let (time_range, since) = query.window();
    let db = state.db.clone();

    let card = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let vcard = find_vcard(&read_txn, &id)?.ok_or_else(|| vcard_not_found(&read_txn, &id))?;
        let scans = scans_for(&read_txn, &vcard.id)?;
        Ok::<_, AppError>(analytics::summarize_card(&vcard.id, &scans, time_range, since))
    })
    .await??;

    Ok(Json(card))
}

/// All-time totals for the dashboard
pub async fn overview(State(state): State<AppState>) -> Result<Json<Overview>> {
    let db = state.db.clone();

    let overview = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        let vcards = list_vcards(&read_txn)?;
        let scans = all_scans(&read_txn)?;
        Ok::<_, AppError>(analytics::overview(vcards.len(), &scans))
    })
    .await??;

    Ok(Json(overview))
}
