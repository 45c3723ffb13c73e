use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_USER_ROLE;
use crate::routes::validation::timestamp_to_rfc3339;

/// User record stored in redb
/// Uses Unix timestamp for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    /// Normalized (trimmed, lowercase) email, unique across users
    pub email: String,
    /// Argon2 PHC string; `None` for placeholder accounts that never signed in
    pub password_hash: Option<String>,
    pub role: String,
    pub image: Option<String>,
    /// When the user was created (Unix timestamp)
    pub created_at: i64,
}

impl UserRecord {
    pub fn new(id: String, name: &str, email: &str, now: i64) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash: None,
            role: DEFAULT_USER_ROLE.to_string(),
            image: None,
            created_at: now,
        }
    }

    /// Placeholder accounts exist only as owners or invitees
    pub fn is_placeholder(&self) -> bool {
        self.password_hash.is_none()
    }
}

/// User model for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl From<&UserRecord> for User {
    fn from(record: &UserRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            email: record.email.clone(),
            image: record.image.clone(),
            role: record.role.clone(),
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

impl User {
    /// Loose email check: one `@` with text on both sides and no whitespace
    pub fn validate_email(email: &str) -> bool {
        let email = email.trim();
        match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        }
    }

    /// Name used for an invitee who did not give one: the email's local part
    pub fn default_name(email: &str) -> String {
        email.trim().split('@').next().unwrap_or_default().to_string()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(User::validate_email("jane@example.com"));
        assert!(User::validate_email("  jane@example.com "));

        assert!(!User::validate_email(""));
        assert!(!User::validate_email("jane"));
        assert!(!User::validate_email("@example.com"));
        assert!(!User::validate_email("jane@"));
        assert!(!User::validate_email("ja ne@example.com"));
        assert!(!User::validate_email("a@b@c"));
    }

    #[test]
    fn test_default_name() {
        assert_eq!(User::default_name("jane.doe@example.com"), "jane.doe");
    }

    #[test]
    fn test_new_record_normalizes_email() {
        let record = UserRecord::new("u1".into(), " Jane ", " Jane@Example.COM ", 0);
        assert_eq!(record.email, "jane@example.com");
        assert_eq!(record.name, "Jane");
        assert_eq!(record.role, DEFAULT_USER_ROLE);
        assert!(record.is_placeholder());
    }

    #[test]
    fn test_user_record_serialization() {
        let record = UserRecord::new("u1".into(), "Jane", "jane@example.com", 1733788800);

        let bytes = crate::db::encode(&record).unwrap();
        let deserialized: UserRecord = crate::db::decode(&bytes).unwrap();

        assert_eq!(record.created_at, deserialized.created_at);
        assert_eq!(record.email, deserialized.email);
    }
}
