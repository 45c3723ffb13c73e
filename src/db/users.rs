use redb::WriteTransaction;

use crate::constants::{DUMMY_USER_EMAIL, DUMMY_USER_NAME};
use crate::db::{ReadTables, new_id, now, put_record, tables};
use crate::error::Result;
use crate::models::UserRecord;
use crate::models::user::normalize_email;

pub fn find_user(txn: &impl ReadTables, user_id: &str) -> Result<Option<UserRecord>> {
    txn.get_record(tables::USERS, user_id)
}

pub fn find_user_by_email(txn: &impl ReadTables, email: &str) -> Result<Option<UserRecord>> {
    let user_id: Option<String> = txn.get_record(tables::USERS_BY_EMAIL, &normalize_email(email))?;
    match user_id {
        Some(user_id) => find_user(txn, &user_id),
        None => Ok(None),
    }
}

/// Insert or update a user and its email index entry
pub fn save_user(txn: &WriteTransaction, user: &UserRecord) -> Result<()> {
    put_record(txn, tables::USERS, &user.id, user)?;
    put_record(txn, tables::USERS_BY_EMAIL, &user.email, &user.id)?;
    Ok(())
}

/// Look a user up by email, creating a placeholder account when absent
pub fn find_or_create_user(txn: &WriteTransaction, email: &str, name: &str) -> Result<UserRecord> {
    if let Some(user) = find_user_by_email(txn, email)? {
        return Ok(user);
    }

    let user = UserRecord::new(new_id(), name, email, now());
    save_user(txn, &user)?;
    tracing::info!("Created placeholder user {} <{}>", user.id, user.email);

    Ok(user)
}

/// Owner for rows created by an optionally signed-in caller
pub fn resolve_owner(txn: &WriteTransaction, caller: Option<&UserRecord>) -> Result<UserRecord> {
    match caller {
        Some(user) => Ok(user.clone()),
        None => find_or_create_user(txn, DUMMY_USER_EMAIL, DUMMY_USER_NAME),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use tempfile::TempDir;

    #[test]
    fn test_find_or_create_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let txn = db.begin_write().unwrap();
        let first = find_or_create_user(&txn, "Jane@Example.com", "Jane").unwrap();
        let second = find_or_create_user(&txn, "jane@example.com", "Someone Else").unwrap();
        txn.commit().unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Jane");
    }

    #[test]
    fn test_resolve_owner_falls_back_to_dummy_user() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let txn = db.begin_write().unwrap();
        let owner = resolve_owner(&txn, None).unwrap();
        assert_eq!(owner.email, DUMMY_USER_EMAIL);

        let again = resolve_owner(&txn, None).unwrap();
        assert_eq!(owner.id, again.id);
    }
}
