use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::vcard::present;

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Trimmed value of a required text field, or a 400 with `message`
pub fn required_text(value: Option<&str>, message: &str) -> Result<String> {
    present(value).ok_or_else(|| {
        tracing::warn!("Rejected request: {}", message);
        AppError::InvalidInput(message.to_string())
    })
}
