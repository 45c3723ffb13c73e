pub mod file;
pub mod scan;
pub mod team;
pub mod user;
pub mod vcard;

pub use file::{File, FileRecord};
pub use scan::{ScanLogRecord, ScanType, TimeRange};
pub use team::{Permissions, PermissionsInput, Team, TeamMember, TeamMemberRecord, TeamRecord};
pub use user::{User, UserRecord};
pub use vcard::{
    NewSocialLink, NfcLink, NfcLinkRecord, SocialLink, SocialLinkRecord, VCard, VCardInput,
    VCardPublicRecord, VCardRecord,
};
