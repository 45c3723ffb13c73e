use redb::WriteTransaction;

use crate::db::{ReadTables, new_id, put_record, remove_record, tables};
use crate::error::Result;
use crate::models::{
    NewSocialLink, NfcLinkRecord, SocialLinkRecord, VCard, VCardPublicRecord, VCardRecord,
};
use crate::security::generate_public_id;

pub fn find_vcard(txn: &impl ReadTables, vcard_id: &str) -> Result<Option<VCardRecord>> {
    txn.get_record(tables::VCARDS, vcard_id)
}

/// Every card, newest first
pub fn list_vcards(txn: &impl ReadTables) -> Result<Vec<VCardRecord>> {
    let mut vcards: Vec<VCardRecord> = txn.all_records(tables::VCARDS)?;
    vcards.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(vcards)
}

pub fn save_vcard(txn: &WriteTransaction, vcard: &VCardRecord) -> Result<()> {
    put_record(txn, tables::VCARDS, &vcard.id, vcard)
}

/// A few existing card ids, returned as a hint in 404 bodies
pub fn sample_ids(txn: &impl ReadTables, limit: usize) -> Result<Vec<String>> {
    txn.record_keys(tables::VCARDS, limit)
}

// =============================================================================
// Social Links
// =============================================================================

pub fn social_links(txn: &impl ReadTables, vcard_id: &str) -> Result<Vec<SocialLinkRecord>> {
    Ok(txn
        .get_record(tables::SOCIAL_LINKS, vcard_id)?
        .unwrap_or_default())
}

/// Replace the full link set of a card
pub fn replace_social_links(
    txn: &WriteTransaction,
    vcard_id: &str,
    links: Vec<NewSocialLink>,
) -> Result<Vec<SocialLinkRecord>> {
    let records: Vec<SocialLinkRecord> = links
        .into_iter()
        .map(|link| SocialLinkRecord {
            id: new_id(),
            platform: link.platform,
            url: link.url,
        })
        .collect();

    if records.is_empty() {
        remove_record(txn, tables::SOCIAL_LINKS, vcard_id)?;
    } else {
        put_record(txn, tables::SOCIAL_LINKS, vcard_id, &records)?;
    }

    tracing::debug!("Stored {} social links for vCard {}", records.len(), vcard_id);
    Ok(records)
}

// =============================================================================
// Public Ids
// =============================================================================

pub fn public_id_for(txn: &impl ReadTables, vcard_id: &str) -> Result<Option<String>> {
    let record: Option<VCardPublicRecord> = txn.get_record(tables::VCARD_PUBLIC, vcard_id)?;
    Ok(record.map(|r| r.public_id))
}

/// Return the card's public id, minting one if it has none
///
/// Runs inside the caller's write transaction; redb admits a single writer,
/// so two first reads of the same card cannot both mint.
pub fn ensure_public_id(txn: &WriteTransaction, vcard_id: &str, now: i64) -> Result<String> {
    if let Some(public_id) = public_id_for(txn, vcard_id)? {
        return Ok(public_id);
    }

    let public_id = loop {
        let candidate = generate_public_id();
        let taken: Option<String> = txn.get_record(tables::PUBLIC_IDS, &candidate)?;
        if taken.is_none() {
            break candidate;
        }
    };

    let record = VCardPublicRecord {
        public_id: public_id.clone(),
        created_at: now,
    };
    put_record(txn, tables::VCARD_PUBLIC, vcard_id, &record)?;
    put_record(txn, tables::PUBLIC_IDS, &public_id, vcard_id)?;

    tracing::info!("Minted public id {} for vCard {}", public_id, vcard_id);
    Ok(public_id)
}

pub fn find_by_public_id(txn: &impl ReadTables, public_id: &str) -> Result<Option<VCardRecord>> {
    let vcard_id: Option<String> = txn.get_record(tables::PUBLIC_IDS, public_id)?;
    match vcard_id {
        Some(vcard_id) => find_vcard(txn, &vcard_id),
        None => Ok(None),
    }
}

/// Resolve an identifier that is either a primary id or a public id
pub fn resolve_identifier(txn: &impl ReadTables, identifier: &str) -> Result<Option<VCardRecord>> {
    if let Some(vcard) = find_vcard(txn, identifier)? {
        return Ok(Some(vcard));
    }

    tracing::debug!("No vCard with id {}, trying public id", identifier);
    find_by_public_id(txn, identifier)
}

/// Card with its social links and public id attached
pub fn compose(txn: &impl ReadTables, vcard: VCardRecord) -> Result<VCard> {
    let links = social_links(txn, &vcard.id)?;
    let public_id = public_id_for(txn, &vcard.id)?;
    Ok(VCard::compose(vcard, links, public_id))
}

// =============================================================================
// NFC Links
// =============================================================================

pub fn find_nfc_link(txn: &impl ReadTables, vcard_id: &str) -> Result<Option<NfcLinkRecord>> {
    txn.get_record(tables::NFC_LINKS, vcard_id)
}

/// Create the card's NFC link or point it at a new tag
pub fn upsert_nfc_link(
    txn: &WriteTransaction,
    vcard_id: &str,
    nfc_card_id: &str,
    now: i64,
) -> Result<NfcLinkRecord> {
    let record = match find_nfc_link(txn, vcard_id)? {
        Some(existing) => NfcLinkRecord {
            nfc_card_id: nfc_card_id.to_string(),
            last_programmed: now,
            ..existing
        },
        None => NfcLinkRecord {
            id: new_id(),
            nfc_card_id: nfc_card_id.to_string(),
            last_programmed: now,
            created_at: now,
        },
    };

    put_record(txn, tables::NFC_LINKS, vcard_id, &record)?;
    Ok(record)
}

// =============================================================================
// Deletion
// =============================================================================

/// Remove a card with its links, public alias and NFC link
///
/// Scan logs are left untouched.
pub fn delete_vcard(txn: &WriteTransaction, vcard_id: &str) -> Result<bool> {
    remove_record(txn, tables::SOCIAL_LINKS, vcard_id)?;

    if let Some(public_id) = public_id_for(txn, vcard_id)? {
        remove_record(txn, tables::PUBLIC_IDS, &public_id)?;
        remove_record(txn, tables::VCARD_PUBLIC, vcard_id)?;
    }

    remove_record(txn, tables::NFC_LINKS, vcard_id)?;
    remove_record(txn, tables::VCARDS, vcard_id)
}
