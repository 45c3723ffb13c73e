use redb::{ReadableTable, WriteTransaction};

use crate::db::{ReadTables, encode, put_record, tables};
use crate::error::Result;
use crate::models::{ScanLogRecord, ScanType};

/// Append a scan event, returning its sequence number
///
/// The card's entry in the scan index gets the new sequence in the same
/// transaction.
pub fn record_scan(txn: &WriteTransaction, scan: &ScanLogRecord) -> Result<u64> {
    let bytes = encode(scan)?;
    let sequence = {
        let mut table = txn.open_table(tables::SCAN_LOGS)?;
        let sequence = match table.last()? {
            Some((key, _)) => key.value() + 1,
            None => 1,
        };
        table.insert(sequence, bytes.as_slice())?;
        sequence
    };

    let mut sequences = scan_sequences(txn, &scan.vcard_id)?;
    sequences.push(sequence);
    put_record(txn, tables::SCAN_INDEX, &scan.vcard_id, &sequences)?;

    Ok(sequence)
}

/// Log sequence numbers of a card's scans, ascending
pub fn scan_sequences(txn: &impl ReadTables, vcard_id: &str) -> Result<Vec<u64>> {
    Ok(txn
        .get_record(tables::SCAN_INDEX, vcard_id)?
        .unwrap_or_default())
}

/// Every scan ever logged, oldest first
pub fn all_scans(txn: &impl ReadTables) -> Result<Vec<ScanLogRecord>> {
    txn.all_log_entries(tables::SCAN_LOGS)
}

/// Scans of one card, oldest first
pub fn scans_for(txn: &impl ReadTables, vcard_id: &str) -> Result<Vec<ScanLogRecord>> {
    let sequences = scan_sequences(txn, vcard_id)?;
    txn.log_entries(tables::SCAN_LOGS, &sequences)
}

/// Number of scans of a card through one channel, with the latest timestamp
pub fn scan_stats(scans: &[ScanLogRecord], scan_type: ScanType) -> (u64, Option<i64>) {
    scans
        .iter()
        .filter(|scan| scan.scan_type == scan_type)
        .fold((0, None), |(count, last), scan| {
            (count + 1, last.max(Some(scan.created_at)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_database;
    use redb::ReadableDatabase;
    use tempfile::TempDir;

    fn scan(vcard_id: &str, scan_type: ScanType, created_at: i64) -> ScanLogRecord {
        ScanLogRecord {
            vcard_id: vcard_id.to_string(),
            scan_type,
            device_type: "Mobile".to_string(),
            created_at,
        }
    }

    #[test]
    fn test_record_scan_appends_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let txn = db.begin_write().unwrap();
        assert_eq!(record_scan(&txn, &scan("a", ScanType::Qr, 10)).unwrap(), 1);
        assert_eq!(record_scan(&txn, &scan("b", ScanType::Nfc, 20)).unwrap(), 2);
        assert_eq!(record_scan(&txn, &scan("a", ScanType::Nfc, 30)).unwrap(), 3);

        let scans = scans_for(&txn, "a").unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].created_at, 10);
        assert_eq!(scans[1].created_at, 30);
    }

    #[test]
    fn test_scan_index_tracks_sequences_per_card() {
        let temp_dir = TempDir::new().unwrap();
        let db = open_database(temp_dir.path().join("test.db")).unwrap();

        let txn = db.begin_write().unwrap();
        record_scan(&txn, &scan("a", ScanType::Qr, 10)).unwrap();
        record_scan(&txn, &scan("b", ScanType::Qr, 20)).unwrap();
        record_scan(&txn, &scan("a", ScanType::Nfc, 30)).unwrap();
        record_scan(&txn, &scan("b", ScanType::Nfc, 40)).unwrap();
        txn.commit().unwrap();

        let txn = db.begin_read().unwrap();
        assert_eq!(scan_sequences(&txn, "a").unwrap(), vec![1, 3]);
        assert_eq!(scan_sequences(&txn, "b").unwrap(), vec![2, 4]);
        assert!(scan_sequences(&txn, "c").unwrap().is_empty());

        let scans = scans_for(&txn, "b").unwrap();
        assert_eq!(
            scans.iter().map(|s| s.created_at).collect::<Vec<_>>(),
            vec![20, 40]
        );
        assert!(scans.iter().all(|s| s.vcard_id == "b"));
        assert!(scans_for(&txn, "c").unwrap().is_empty());
        assert_eq!(all_scans(&txn).unwrap().len(), 4);
    }

    #[test]
    fn test_scan_stats() {
        let scans = vec![
            scan("a", ScanType::Qr, 10),
            scan("a", ScanType::Qr, 50),
            scan("a", ScanType::Nfc, 70),
        ];

        assert_eq!(scan_stats(&scans, ScanType::Qr), (2, Some(50)));
        assert_eq!(scan_stats(&scans, ScanType::Nfc), (1, Some(70)));
        assert_eq!(scan_stats(&[], ScanType::Qr), (0, None));
    }
}
