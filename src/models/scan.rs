use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::UNKNOWN_DEVICE;

/// How a card was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanType {
    #[serde(rename = "QR")]
    Qr,
    #[serde(rename = "NFC")]
    Nfc,
}

impl ScanType {
    /// Parse a `?via=` value; anything unrecognised counts as a QR scan
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("nfc") => ScanType::Nfc,
            _ => ScanType::Qr,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScanType::Qr => "QR",
            ScanType::Nfc => "NFC",
        }
    }
}

/// One access of a card; rows are appended and never modified
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanLogRecord {
    pub vcard_id: String,
    pub scan_type: ScanType,
    pub device_type: String,
    pub created_at: i64,
}

/// Analytics window selected with `?timeRange=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeRange {
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "90days")]
    NinetyDays,
    #[serde(rename = "year")]
    Year,
}

impl TimeRange {
    /// Unknown or missing values fall back to 30 days
    pub fn from_param(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("7days") => TimeRange::SevenDays,
            Some("90days") => TimeRange::NinetyDays,
            Some("year") => TimeRange::Year,
            _ => TimeRange::ThirtyDays,
        }
    }

    /// First instant inside the window ending at `now`
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            TimeRange::SevenDays => now - Duration::days(7),
            TimeRange::ThirtyDays => now - Duration::days(30),
            TimeRange::NinetyDays => now - Duration::days(90),
            TimeRange::Year => now
                .checked_sub_months(Months::new(12))
                .unwrap_or_else(|| now - Duration::days(365)),
        }
    }
}

/// Coarse device class from a User-Agent header
pub fn classify_device(user_agent: Option<&str>) -> String {
    let Some(agent) = user_agent.map(str::trim).filter(|a| !a.is_empty()) else {
        return UNKNOWN_DEVICE.to_string();
    };

    let agent = agent.to_ascii_lowercase();
    let device = if agent.contains("ipad") || agent.contains("tablet") {
        "Tablet"
    } else if agent.contains("mobile") || agent.contains("iphone") || agent.contains("android") {
        "Mobile"
    } else {
        "Desktop"
    };
    device.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_scan_type_from_query() {
        assert_eq!(ScanType::from_query(Some("NFC")), ScanType::Nfc);
        assert_eq!(ScanType::from_query(Some("qr")), ScanType::Qr);
        assert_eq!(ScanType::from_query(Some("bluetooth")), ScanType::Qr);
        assert_eq!(ScanType::from_query(None), ScanType::Qr);
    }

    #[test]
    fn test_time_range_parsing() {
        assert_eq!(TimeRange::from_param(Some("7days")), TimeRange::SevenDays);
        assert_eq!(TimeRange::from_param(Some("year")), TimeRange::Year);
        assert_eq!(TimeRange::from_param(Some("forever")), TimeRange::ThirtyDays);
        assert_eq!(TimeRange::from_param(None), TimeRange::ThirtyDays);
    }

    #[test]
    fn test_time_range_start() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();

        assert_eq!(
            TimeRange::SevenDays.start(now),
            Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap()
        );
        assert_eq!(
            TimeRange::Year.start(now),
            Utc.with_ymd_and_hms(2023, 3, 15, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_classify_device() {
        assert_eq!(classify_device(None), UNKNOWN_DEVICE);
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Mobile")),
            "Mobile"
        );
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X)")),
            "Tablet"
        );
        assert_eq!(
            classify_device(Some("Mozilla/5.0 (X11; Linux x86_64) Firefox/126.0")),
            "Desktop"
        );
    }
}
