//! Scan tallies for the analytics endpoints
//!
//! Everything here is pure: handlers load cards and scan logs in a read
//! transaction and hand them over together with the window start.

use chrono::DateTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::constants::TOP_VCARDS_LIMIT;
use crate::models::{ScanLogRecord, ScanType, TimeRange, VCardRecord};
use crate::routes::validation::timestamp_to_rfc3339;

/// Scans on one UTC day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopVCard {
    pub id: String,
    pub name: String,
    pub scans: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanMethod {
    pub method: ScanType,
    pub count: u64,
    pub percentage: u64,
}

/// Dashboard analytics over a time window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub time_range: TimeRange,
    #[serde(rename = "totalVCards")]
    pub total_vcards: u64,
    #[serde(rename = "newVCards")]
    pub new_vcards: u64,
    pub total_scans: u64,
    pub qr_scans: u64,
    pub nfc_scans: u64,
    pub scan_activity: Vec<DailyCount>,
    #[serde(rename = "topVCards")]
    pub top_vcards: Vec<TopVCard>,
    pub scan_methods: Vec<ScanMethod>,
}

/// Analytics of a single card over a time window
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardAnalytics {
    #[serde(rename = "vCardId")]
    pub vcard_id: String,
    pub time_range: TimeRange,
    pub total_scans: u64,
    pub qr_scans: u64,
    pub nfc_scans: u64,
    pub scan_activity: Vec<DailyCount>,
    pub last_scan: Option<String>,
}

/// All-time totals shown on the dashboard home page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    #[serde(rename = "totalVCards")]
    pub total_vcards: u64,
    pub total_scans: u64,
    pub qr_scans: u64,
    pub nfc_taps: u64,
}

fn count_type<'a>(scans: impl IntoIterator<Item = &'a ScanLogRecord>, scan_type: ScanType) -> u64 {
    scans
        .into_iter()
        .filter(|scan| scan.scan_type == scan_type)
        .count() as u64
}

/// Share of `count` in `total`, rounded to a whole percent
fn percentage(count: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    ((count as f64 / total as f64) * 100.0).round() as u64
}

/// Scan counts per UTC day, ascending
fn daily_activity<'a>(scans: impl IntoIterator<Item = &'a ScanLogRecord>) -> Vec<DailyCount> {
    let mut days: BTreeMap<String, u64> = BTreeMap::new();
    for scan in scans {
        let date = DateTime::from_timestamp(scan.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        *days.entry(date).or_default() += 1;
    }

    days.into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

pub fn summarize(
    vcards: &[VCardRecord],
    scans: &[ScanLogRecord],
    time_range: TimeRange,
    since: i64,
) -> AnalyticsSummary {
    let in_window: Vec<&ScanLogRecord> = scans.iter().filter(|s| s.created_at >= since).collect();

    let total_scans = in_window.len() as u64;
    let qr_scans = count_type(in_window.iter().copied(), ScanType::Qr);
    let nfc_scans = count_type(in_window.iter().copied(), ScanType::Nfc);

    let mut per_card: HashMap<&str, u64> = HashMap::new();
    for scan in &in_window {
        *per_card.entry(scan.vcard_id.as_str()).or_default() += 1;
    }

    let mut top_vcards: Vec<TopVCard> = vcards
        .iter()
        .map(|vcard| TopVCard {
            id: vcard.id.clone(),
            name: vcard.name.clone(),
            scans: per_card.get(vcard.id.as_str()).copied().unwrap_or(0),
        })
        .collect();
    top_vcards.sort_by(|a, b| b.scans.cmp(&a.scans).then_with(|| a.name.cmp(&b.name)));
    top_vcards.truncate(TOP_VCARDS_LIMIT);

    AnalyticsSummary {
        time_range,
        total_vcards: vcards.len() as u64,
        new_vcards: vcards.iter().filter(|v| v.created_at >= since).count() as u64,
        total_scans,
        qr_scans,
        nfc_scans,
        scan_activity: daily_activity(in_window.iter().copied()),
        top_vcards,
        scan_methods: vec![
            ScanMethod {
                method: ScanType::Qr,
                count: qr_scans,
                percentage: percentage(qr_scans, total_scans),
            },
            ScanMethod {
                method: ScanType::Nfc,
                count: nfc_scans,
                percentage: percentage(nfc_scans, total_scans),
            },
        ],
    }
}

/// Per-card view; `scans` may contain other cards' rows
pub fn summarize_card(
    vcard_id: &str,
    scans: &[ScanLogRecord],
    time_range: TimeRange,
    since: i64,
) -> CardAnalytics {
    let in_window: Vec<&ScanLogRecord> = scans
        .iter()
        .filter(|s| s.vcard_id == vcard_id && s.created_at >= since)
        .collect();

    CardAnalytics {
        vcard_id: vcard_id.to_string(),
        time_range,
        total_scans: in_window.len() as u64,
        qr_scans: count_type(in_window.iter().copied(), ScanType::Qr),
        nfc_scans: count_type(in_window.iter().copied(), ScanType::Nfc),
        scan_activity: daily_activity(in_window.iter().copied()),
        last_scan: in_window
            .iter()
            .map(|s| s.created_at)
            .max()
            .map(timestamp_to_rfc3339),
    }
}

pub fn overview(total_vcards: usize, scans: &[ScanLogRecord]) -> Overview {
    Overview {
        total_vcards: total_vcards as u64,
        total_scans: scans.len() as u64,
        qr_scans: count_type(scans, ScanType::Qr),
        nfc_taps: count_type(scans, ScanType::Nfc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VCardInput;

    const DAY: i64 = 86_400;
    // 2024-03-15T00:00:00Z
    const NOW: i64 = 1_710_460_800;

    fn card(id: &str, name: &str, created_at: i64) -> VCardRecord {
        let input = VCardInput {
            name: Some(name.into()),
            email: Some("x@example.com".into()),
            phone: Some("1".into()),
            ..Default::default()
        };
        VCardRecord::create(id.into(), "owner", &input, created_at).unwrap()
    }

    fn scan(vcard_id: &str, scan_type: ScanType, created_at: i64) -> ScanLogRecord {
        ScanLogRecord {
            vcard_id: vcard_id.into(),
            scan_type,
            device_type: "Unknown".into(),
            created_at,
        }
    }

    #[test]
    fn test_summary_counts_only_window() {
        let vcards = vec![card("a", "Alice", NOW - 40 * DAY), card("b", "Bob", NOW - DAY)];
        let scans = vec![
            scan("a", ScanType::Qr, NOW - 45 * DAY),
            scan("a", ScanType::Qr, NOW - 2 * DAY),
            scan("a", ScanType::Nfc, NOW - 2 * DAY + 60),
            scan("b", ScanType::Qr, NOW - 3600),
        ];

        let since = NOW - 30 * DAY;
        let summary = summarize(&vcards, &scans, TimeRange::ThirtyDays, since);

        assert_eq!(summary.total_vcards, 2);
        assert_eq!(summary.new_vcards, 1);
        assert_eq!(summary.total_scans, 3);
        assert_eq!(summary.qr_scans, 2);
        assert_eq!(summary.nfc_scans, 1);
        assert_eq!(
            summary.scan_activity,
            vec![
                DailyCount { date: "2024-03-13".into(), count: 2 },
                DailyCount { date: "2024-03-14".into(), count: 1 },
            ]
        );
        assert_eq!(summary.top_vcards[0].id, "a");
        assert_eq!(summary.top_vcards[0].scans, 2);
        assert_eq!(summary.scan_methods[0].percentage, 67);
        assert_eq!(summary.scan_methods[1].percentage, 33);
    }

    #[test]
    fn test_summary_without_scans_is_zero() {
        let summary = summarize(&[card("a", "Alice", NOW)], &[], TimeRange::SevenDays, NOW - 7 * DAY);

        assert_eq!(summary.total_scans, 0);
        assert!(summary.scan_activity.is_empty());
        assert!(summary.scan_methods.iter().all(|m| m.count == 0 && m.percentage == 0));
        assert_eq!(summary.top_vcards[0].scans, 0);
    }

    #[test]
    fn test_top_vcards_limited() {
        let vcards: Vec<VCardRecord> = (0..8)
            .map(|i| card(&format!("c{i}"), &format!("Card {i}"), NOW))
            .collect();
        let summary = summarize(&vcards, &[], TimeRange::ThirtyDays, NOW - 30 * DAY);

        assert_eq!(summary.top_vcards.len(), TOP_VCARDS_LIMIT);
    }

    #[test]
    fn test_card_analytics_filters_by_card() {
        let scans = vec![
            scan("a", ScanType::Nfc, NOW - DAY),
            scan("b", ScanType::Qr, NOW - DAY),
        ];

        let analytics = summarize_card("a", &scans, TimeRange::SevenDays, NOW - 7 * DAY);
        assert_eq!(analytics.total_scans, 1);
        assert_eq!(analytics.nfc_scans, 1);
        assert_eq!(analytics.qr_scans, 0);
        assert!(analytics.last_scan.is_some());

        let empty = summarize_card("c", &scans, TimeRange::SevenDays, NOW - 7 * DAY);
        assert_eq!(empty.total_scans, 0);
        assert_eq!(empty.qr_scans, 0);
        assert_eq!(empty.nfc_scans, 0);
        assert!(empty.last_scan.is_none());
    }

    #[test]
    fn test_overview() {
        let scans = vec![
            scan("a", ScanType::Qr, NOW),
            scan("a", ScanType::Nfc, NOW),
            scan("b", ScanType::Nfc, NOW),
        ];
        let overview = overview(2, &scans);

        assert_eq!(overview.total_vcards, 2);
        assert_eq!(overview.total_scans, 3);
        assert_eq!(overview.qr_scans, 1);
        assert_eq!(overview.nfc_taps, 2);
    }

    #[test]
    fn test_json_keys() {
        let summary = summarize(&[card("a", "Alice", NOW)], &[], TimeRange::SevenDays, NOW - 7 * DAY);
        let json = serde_json::to_value(&summary).unwrap();
        for key in ["totalVCards", "newVCards", "topVCards", "scanActivity", "scanMethods"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["timeRange"], "7days");

        let json = serde_json::to_value(overview(1, &[])).unwrap();
        assert_eq!(json["totalVCards"], 1);
        assert_eq!(json["nfcTaps"], 0);

        let json = serde_json::to_value(summarize_card("a", &[], TimeRange::Year, NOW)).unwrap();
        assert_eq!(json["vCardId"], "a");
        assert_eq!(json["timeRange"], "year");
    }
}
