use redb::TableDefinition;

/// Key/value table keyed by a string id, holding a bincode record
pub type RecordTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Append-only table keyed by a sequence number
pub type LogTable = TableDefinition<'static, u64, &'static [u8]>;

/// Users table: user_id -> UserRecord
pub const USERS: RecordTable = TableDefinition::new("users");

/// Email index: lowercased email -> user_id
pub const USERS_BY_EMAIL: RecordTable = TableDefinition::new("users_by_email");

/// Teams table: team_id -> TeamRecord
pub const TEAMS: RecordTable = TableDefinition::new("teams");

/// Team members table: member_id -> TeamMemberRecord (permissions embedded)
pub const TEAM_MEMBERS: RecordTable = TableDefinition::new("team_members");

/// Team roster index: team_id -> Vec<member_id>
pub const TEAM_MEMBER_INDEX: RecordTable = TableDefinition::new("team_member_index");

/// Membership index: user_id -> Vec<member_id>
pub const USER_MEMBERSHIP_INDEX: RecordTable = TableDefinition::new("user_membership_index");

/// vCards table: vcard_id -> VCardRecord
pub const VCARDS: RecordTable = TableDefinition::new("vcards");

/// Social links table: vcard_id -> Vec<SocialLinkRecord>
/// Replaced wholesale whenever a card's links change
pub const SOCIAL_LINKS: RecordTable = TableDefinition::new("social_links");

/// Public alias table: vcard_id -> VCardPublicRecord (at most one per card)
pub const VCARD_PUBLIC: RecordTable = TableDefinition::new("vcard_public");

/// Public id index: public_id -> vcard_id
pub const PUBLIC_IDS: RecordTable = TableDefinition::new("public_ids");

/// NFC links table: vcard_id -> NfcLinkRecord (at most one per card)
pub const NFC_LINKS: RecordTable = TableDefinition::new("nfc_links");

/// Scan log: sequence number -> ScanLogRecord
/// Append-only, never rewritten
pub const SCAN_LOGS: LogTable = TableDefinition::new("scan_logs");

/// Scan index: vcard_id -> Vec<sequence> into SCAN_LOGS, ascending
pub const SCAN_INDEX: RecordTable = TableDefinition::new("scan_index");

/// Uploaded file metadata: file_id -> FileRecord
pub const FILES: RecordTable = TableDefinition::new("files");
