use redb::WriteTransaction;

use crate::db::{put_record, tables};
use crate::error::Result;
use crate::models::FileRecord;

pub fn save_file(txn: &WriteTransaction, file: &FileRecord) -> Result<()> {
    put_record(txn, tables::FILES, &file.id, file)
}
