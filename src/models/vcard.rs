use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::constants::{DEFAULT_PRIMARY_COLOR, DEFAULT_TEMPLATE, ERR_VCARD_REQUIRED_FIELDS};
use crate::error::{AppError, Result};
use crate::routes::validation::timestamp_to_rfc3339;

/// vCard row stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VCardRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub template: String,
    pub primary_color: String,
    pub profile_image_url: Option<String>,
    pub enable_nfc: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinkRecord {
    pub id: String,
    pub platform: String,
    pub url: String,
}

/// Shareable alias of a vCard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VCardPublicRecord {
    pub public_id: String,
    pub created_at: i64,
}

/// Association between a vCard and a physical NFC tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NfcLinkRecord {
    pub id: String,
    pub nfc_card_id: String,
    pub last_programmed: i64,
    pub created_at: i64,
}

/// Create/update request body
///
/// Every field is optional at the wire level so that missing required
/// fields surface as a 400 with a readable message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VCardInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub template: Option<String>,
    pub primary_color: Option<String>,
    pub profile_image_url: Option<String>,
    #[serde(rename = "enableNFC")]
    pub enable_nfc: Option<bool>,
    pub social_links: Option<SocialLinksInput>,
}

/// Social links arrive either as `[{platform, url}]` or as `{platform: url}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum SocialLinksInput {
    List(Vec<SocialLinkInput>),
    Map(BTreeMap<String, Value>),
}

#[derive(Debug, Deserialize)]
pub struct SocialLinkInput {
    pub platform: Option<String>,
    pub url: Option<Value>,
}

/// A validated social link ready to be stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSocialLink {
    pub platform: String,
    pub url: String,
}

impl NewSocialLink {
    fn parse(platform: Option<&str>, url: Option<&Value>) -> Option<Self> {
        let platform = present(platform)?;
        let url = present(url.and_then(Value::as_str))?;
        Some(Self { platform, url })
    }
}

impl SocialLinksInput {
    /// Drop entries without a platform or with an empty/non-string url
    pub fn normalize(&self) -> Vec<NewSocialLink> {
        match self {
            SocialLinksInput::List(links) => links
                .iter()
                .filter_map(|link| NewSocialLink::parse(link.platform.as_deref(), link.url.as_ref()))
                .collect(),
            SocialLinksInput::Map(links) => links
                .iter()
                .filter_map(|(platform, url)| NewSocialLink::parse(Some(platform.as_str()), Some(url)))
                .collect(),
        }
    }
}

/// Trimmed value, or `None` when absent or blank
pub fn present(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required_update(current: &mut String, value: Option<&str>) -> Result<()> {
    if let Some(value) = value {
        *current = present(Some(value))
            .ok_or_else(|| AppError::InvalidInput(ERR_VCARD_REQUIRED_FIELDS.to_string()))?;
    }
    Ok(())
}

impl VCardRecord {
    /// Build a new card, rejecting input without name, email and phone
    pub fn create(id: String, user_id: &str, input: &VCardInput, now: i64) -> Result<Self> {
        let (Some(name), Some(email), Some(phone)) = (
            present(input.name.as_deref()),
            present(input.email.as_deref()),
            present(input.phone.as_deref()),
        ) else {
            return Err(AppError::InvalidInput(ERR_VCARD_REQUIRED_FIELDS.to_string()));
        };

        Ok(Self {
            id,
            user_id: user_id.to_string(),
            name,
            email,
            phone,
            website: present(input.website.as_deref()),
            company: present(input.company.as_deref()),
            position: present(input.position.as_deref()),
            address: present(input.address.as_deref()),
            bio: present(input.bio.as_deref()),
            template: present(input.template.as_deref())
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            primary_color: present(input.primary_color.as_deref())
                .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
            profile_image_url: present(input.profile_image_url.as_deref()),
            enable_nfc: input.enable_nfc.unwrap_or(false),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an update body
    ///
    /// Required contact fields keep their value when absent; optional text
    /// fields are cleared when absent; display fields fall back to the
    /// current value.
    pub fn apply_update(&mut self, input: &VCardInput, now: i64) -> Result<()> {
        required_update(&mut self.name, input.name.as_deref())?;
        required_update(&mut self.email, input.email.as_deref())?;
        required_update(&mut self.phone, input.phone.as_deref())?;

        self.website = present(input.website.as_deref());
        self.company = present(input.company.as_deref());
        self.position = present(input.position.as_deref());
        self.address = present(input.address.as_deref());
        self.bio = present(input.bio.as_deref());

        if let Some(template) = present(input.template.as_deref()) {
            self.template = template;
        }
        if let Some(color) = present(input.primary_color.as_deref()) {
            self.primary_color = color;
        }
        if let Some(url) = present(input.profile_image_url.as_deref()) {
            self.profile_image_url = Some(url);
        }

        self.enable_nfc = input.enable_nfc.unwrap_or(false);
        self.updated_at = now;
        Ok(())
    }
}

/// vCard model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VCard {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub address: Option<String>,
    pub bio: Option<String>,
    pub template: String,
    pub primary_color: String,
    pub profile_image_url: Option<String>,
    #[serde(rename = "enableNFC")]
    pub enable_nfc: bool,
    pub created_at: String,
    pub updated_at: String,
    pub social_links: Vec<SocialLink>,
    pub public_id: Option<String>,
}

impl VCard {
    pub fn compose(
        record: VCardRecord,
        links: Vec<SocialLinkRecord>,
        public_id: Option<String>,
    ) -> Self {
        let social_links = links
            .into_iter()
            .map(|link| SocialLink {
                id: link.id,
                vcard_id: record.id.clone(),
                platform: link.platform,
                url: link.url,
            })
            .collect();

        Self {
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
            id: record.id,
            user_id: record.user_id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            website: record.website,
            company: record.company,
            position: record.position,
            address: record.address,
            bio: record.bio,
            template: record.template,
            primary_color: record.primary_color,
            profile_image_url: record.profile_image_url,
            enable_nfc: record.enable_nfc,
            social_links,
            public_id,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SocialLink {
    pub id: String,
    #[serde(rename = "vCardId")]
    pub vcard_id: String,
    pub platform: String,
    pub url: String,
}

/// NFC link model for API responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NfcLink {
    pub id: String,
    #[serde(rename = "vCardId")]
    pub vcard_id: String,
    pub nfc_card_id: String,
    pub last_programmed: String,
    pub created_at: String,
}

impl NfcLink {
    pub fn new(vcard_id: &str, record: &NfcLinkRecord) -> Self {
        Self {
            id: record.id.clone(),
            vcard_id: vcard_id.to_string(),
            nfc_card_id: record.nfc_card_id.clone(),
            last_programmed: timestamp_to_rfc3339(record.last_programmed),
            created_at: timestamp_to_rfc3339(record.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(value: serde_json::Value) -> VCardInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_create_requires_contact_fields() {
        let missing_phone = input(json!({ "name": "Jane", "email": "jane@example.com" }));
        assert!(matches!(
            VCardRecord::create("id".into(), "user", &missing_phone, 0),
            Err(AppError::InvalidInput(_))
        ));

        let blank_name = input(json!({ "name": "  ", "email": "a@b.c", "phone": "1" }));
        assert!(VCardRecord::create("id".into(), "user", &blank_name, 0).is_err());
    }

    #[test]
    fn test_create_applies_defaults() {
        let body = input(json!({
            "name": "Jane",
            "email": "jane@example.com",
            "phone": "555-0100",
            "website": ""
        }));
        let record = VCardRecord::create("id".into(), "user", &body, 42).unwrap();

        assert_eq!(record.template, DEFAULT_TEMPLATE);
        assert_eq!(record.primary_color, DEFAULT_PRIMARY_COLOR);
        assert!(record.website.is_none());
        assert!(!record.enable_nfc);
        assert_eq!(record.created_at, 42);
    }

    #[test]
    fn test_update_keeps_display_fields_and_clears_optional_text() {
        let body = input(json!({
            "name": "Jane",
            "email": "jane@example.com",
            "phone": "555-0100",
            "company": "Acme",
            "template": "template3",
            "enableNFC": true
        }));
        let mut record = VCardRecord::create("id".into(), "user", &body, 0).unwrap();

        let update = input(json!({ "phone": "555-0199" }));
        record.apply_update(&update, 10).unwrap();

        assert_eq!(record.name, "Jane");
        assert_eq!(record.phone, "555-0199");
        assert!(record.company.is_none());
        assert_eq!(record.template, "template3");
        assert!(!record.enable_nfc);
        assert_eq!(record.updated_at, 10);

        let blank = input(json!({ "email": "" }));
        assert!(record.apply_update(&blank, 11).is_err());
    }

    #[test]
    fn test_social_links_from_list() {
        let body = input(json!({
            "socialLinks": [
                { "platform": "twitter", "url": " https://x.com/jane " },
                { "platform": "github", "url": "" },
                { "url": "https://example.com" },
                { "platform": "linkedin", "url": 42 }
            ]
        }));
        let links = body.social_links.unwrap().normalize();

        assert_eq!(
            links,
            vec![NewSocialLink {
                platform: "twitter".into(),
                url: "https://x.com/jane".into(),
            }]
        );
    }

    #[test]
    fn test_social_links_from_object() {
        let body = input(json!({
            "socialLinks": {
                "linkedin": "https://linkedin.com/in/jane",
                "github": "   ",
                "twitter": null
            }
        }));
        let links = body.social_links.unwrap().normalize();

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].platform, "linkedin");
    }

    #[test]
    fn test_compose_attaches_links() {
        let body = input(json!({ "name": "Jane", "email": "j@x.io", "phone": "1" }));
        let record = VCardRecord::create("card-1".into(), "user", &body, 0).unwrap();
        let links = vec![SocialLinkRecord {
            id: "l1".into(),
            platform: "github".into(),
            url: "https://github.com/jane".into(),
        }];

        let card = VCard::compose(record, links, Some("pub".into()));
        let json = serde_json::to_value(&card).unwrap();

        assert_eq!(json["socialLinks"][0]["vCardId"], "card-1");
        assert_eq!(json["publicId"], "pub");
        assert_eq!(json["enableNFC"], false);
        assert_eq!(json["primaryColor"], DEFAULT_PRIMARY_COLOR);
    }
}
