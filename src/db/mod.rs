pub mod files;
pub mod scans;
pub mod tables;
pub mod teams;
pub mod users;
pub mod vcards;

use redb::{Database, Error as RedbError, Key, ReadTransaction, ReadableTable, WriteTransaction};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use tables::{LogTable, RecordTable};

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;

    // Initialize tables on first run
    let write_txn = db.begin_write()?;
    {
        for table in [
            tables::USERS,
            tables::USERS_BY_EMAIL,
            tables::TEAMS,
            tables::TEAM_MEMBERS,
            tables::TEAM_MEMBER_INDEX,
            tables::USER_MEMBERSHIP_INDEX,
            tables::VCARDS,
            tables::SOCIAL_LINKS,
            tables::VCARD_PUBLIC,
            tables::PUBLIC_IDS,
            tables::NFC_LINKS,
            tables::SCAN_INDEX,
            tables::FILES,
        ] {
            let _ = write_txn.open_table(table)?;
        }
        let _ = write_txn.open_table(tables::SCAN_LOGS)?;
    }
    write_txn.commit()?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Fresh random identifier for a new row
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Current time as a Unix timestamp (seconds)
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn encode<R: Serialize + ?Sized>(record: &R) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(record, BINCODE_CONFIG)?)
}

pub fn decode<R: DeserializeOwned>(bytes: &[u8]) -> Result<R> {
    let (record, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(record)
}

fn read_one<T, R>(table: &T, key: &str) -> Result<Option<R>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
    R: DeserializeOwned,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(decode(guard.value())?)),
        None => Ok(None),
    }
}

fn read_all<K, T, R>(table: &T) -> Result<Vec<R>>
where
    K: Key + 'static,
    T: ReadableTable<K, &'static [u8]>,
    R: DeserializeOwned,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        records.push(decode(value.value())?);
    }
    Ok(records)
}

/// Log entries at the given sequence numbers, skipping any that are gone
fn read_sequences<T, R>(table: &T, sequences: &[u64]) -> Result<Vec<R>>
where
    T: ReadableTable<u64, &'static [u8]>,
    R: DeserializeOwned,
{
    let mut records = Vec::with_capacity(sequences.len());
    for &sequence in sequences {
        if let Some(guard) = table.get(sequence)? {
            records.push(decode(guard.value())?);
        }
    }
    Ok(records)
}

fn read_keys<T>(table: &T, limit: usize) -> Result<Vec<String>>
where
    T: ReadableTable<&'static str, &'static [u8]>,
{
    let mut keys = Vec::new();
    for entry in table.iter()?.take(limit) {
        let (key, _) = entry?;
        keys.push(key.value().to_string());
    }
    Ok(keys)
}

/// Lookups shared by read and write transactions
///
/// Each call opens the table for the duration of the lookup only, so callers
/// must not hold a handle to the same table across it.
pub trait ReadTables {
    fn get_record<R: DeserializeOwned>(&self, table: RecordTable, key: &str) -> Result<Option<R>>;

    fn all_records<R: DeserializeOwned>(&self, table: RecordTable) -> Result<Vec<R>>;

    fn all_log_entries<R: DeserializeOwned>(&self, table: LogTable) -> Result<Vec<R>>;

    fn log_entries<R: DeserializeOwned>(&self, table: LogTable, sequences: &[u64]) -> Result<Vec<R>>;

    fn record_keys(&self, table: RecordTable, limit: usize) -> Result<Vec<String>>;
}

impl ReadTables for ReadTransaction {
    fn get_record<R: DeserializeOwned>(&self, table: RecordTable, key: &str) -> Result<Option<R>> {
        let table = self.open_table(table)?;
        read_one(&table, key)
    }

    fn all_records<R: DeserializeOwned>(&self, table: RecordTable) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_all(&table)
    }

    fn all_log_entries<R: DeserializeOwned>(&self, table: LogTable) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_all(&table)
    }

    fn log_entries<R: DeserializeOwned>(&self, table: LogTable, sequences: &[u64]) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_sequences(&table, sequences)
    }

    fn record_keys(&self, table: RecordTable, limit: usize) -> Result<Vec<String>> {
        let table = self.open_table(table)?;
        read_keys(&table, limit)
    }
}

impl ReadTables for WriteTransaction {
    fn get_record<R: DeserializeOwned>(&self, table: RecordTable, key: &str) -> Result<Option<R>> {
        let table = self.open_table(table)?;
        read_one(&table, key)
    }

    fn all_records<R: DeserializeOwned>(&self, table: RecordTable) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_all(&table)
    }

    fn all_log_entries<R: DeserializeOwned>(&self, table: LogTable) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_all(&table)
    }

    fn log_entries<R: DeserializeOwned>(&self, table: LogTable, sequences: &[u64]) -> Result<Vec<R>> {
        let table = self.open_table(table)?;
        read_sequences(&table, sequences)
    }

    fn record_keys(&self, table: RecordTable, limit: usize) -> Result<Vec<String>> {
        let table = self.open_table(table)?;
        read_keys(&table, limit)
    }
}

/// Insert or overwrite a record
pub fn put_record<R: Serialize + ?Sized>(
    txn: &WriteTransaction,
    table: RecordTable,
    key: &str,
    record: &R,
) -> Result<()> {
    let bytes = encode(record)?;
    let mut table = txn.open_table(table)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}

/// Remove a record, returning whether it existed
pub fn remove_record(txn: &WriteTransaction, table: RecordTable, key: &str) -> Result<bool> {
    let mut table = txn.open_table(table)?;
    let removed = table.remove(key)?.is_some();
    Ok(removed)
}

/// Add `value` to the id list stored under `key` (no duplicates)
pub fn push_index(txn: &WriteTransaction, table: RecordTable, key: &str, value: &str) -> Result<()> {
    let mut ids: Vec<String> = txn.get_record(table, key)?.unwrap_or_default();
    if !ids.iter().any(|id| id == value) {
        ids.push(value.to_string());
        put_record(txn, table, key, &ids)?;
    }
    Ok(())
}

/// Drop `value` from the id list stored under `key`, removing empty lists
pub fn pull_index(txn: &WriteTransaction, table: RecordTable, key: &str, value: &str) -> Result<()> {
    let mut ids: Vec<String> = txn.get_record(table, key)?.unwrap_or_default();
    ids.retain(|id| id != value);
    if ids.is_empty() {
        remove_record(txn, table, key)?;
    } else {
        put_record(txn, table, key, &ids)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use redb::ReadableDatabase;
    use tempfile::TempDir;

    fn test_db(temp_dir: &TempDir) -> Db {
        open_database(temp_dir.path().join("test.db")).unwrap()
    }

    #[test]
    fn test_put_and_get_record() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let txn = db.begin_write().unwrap();
        put_record(&txn, tables::USERS_BY_EMAIL, "a@example.com", "user-1").unwrap();
        txn.commit().unwrap();

        let txn = db.begin_read().unwrap();
        let value: Option<String> = txn.get_record(tables::USERS_BY_EMAIL, "a@example.com").unwrap();
        assert_eq!(value.as_deref(), Some("user-1"));
    }

    #[test]
    fn test_index_push_and_pull() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let txn = db.begin_write().unwrap();
        push_index(&txn, tables::TEAM_MEMBER_INDEX, "team", "m1").unwrap();
        push_index(&txn, tables::TEAM_MEMBER_INDEX, "team", "m2").unwrap();
        push_index(&txn, tables::TEAM_MEMBER_INDEX, "team", "m1").unwrap();

        let ids: Vec<String> = txn
            .get_record(tables::TEAM_MEMBER_INDEX, "team")
            .unwrap()
            .unwrap();
        assert_eq!(ids, vec!["m1".to_string(), "m2".to_string()]);

        pull_index(&txn, tables::TEAM_MEMBER_INDEX, "team", "m1").unwrap();
        pull_index(&txn, tables::TEAM_MEMBER_INDEX, "team", "m2").unwrap();
        let ids: Option<Vec<String>> = txn.get_record(tables::TEAM_MEMBER_INDEX, "team").unwrap();
        assert!(ids.is_none());
        txn.commit().unwrap();
    }

    #[test]
    fn test_record_keys_limit() {
        let temp_dir = TempDir::new().unwrap();
        let db = test_db(&temp_dir);

        let txn = db.begin_write().unwrap();
        for i in 0..4 {
            put_record(&txn, tables::FILES, &format!("file-{i}"), &i).unwrap();
        }
        txn.commit().unwrap();

        let txn = db.begin_read().unwrap();
        assert_eq!(txn.record_keys(tables::FILES, 2).unwrap().len(), 2);
    }
}
