use serde::{Deserialize, Serialize};

use crate::routes::validation::timestamp_to_rfc3339;

/// Upload metadata; no file bytes are stored by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    /// Object storage key the client uploads to
    pub key: String,
    pub user_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub key: String,
    pub user_id: String,
    pub created_at: String,
}

impl From<FileRecord> for File {
    fn from(record: FileRecord) -> Self {
        Self {
            id: record.id,
            filename: record.filename,
            content_type: record.content_type,
            key: record.key,
            user_id: record.user_id,
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}
