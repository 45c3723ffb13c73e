/// Placeholder account that owns cards and uploads made without a session
pub const DUMMY_USER_EMAIL: &str = "dummy@example.com";

/// Display name of the placeholder account
pub const DUMMY_USER_NAME: &str = "Dummy User";

/// Role given to every newly created user
pub const DEFAULT_USER_ROLE: &str = "user";

/// User role allowed to edit any card
pub const ADMIN_USER_ROLE: &str = "admin";

/// Membership role of a team's creator
pub const TEAM_ADMIN_ROLE: &str = "admin";

/// Membership role when an invitation does not name one
pub const DEFAULT_MEMBER_ROLE: &str = "viewer";

/// Card template used when none is supplied
pub const DEFAULT_TEMPLATE: &str = "template1";

/// Card accent color used when none is supplied
pub const DEFAULT_PRIMARY_COLOR: &str = "#4285F4";

/// Length of a minted public id
pub const PUBLIC_ID_LENGTH: usize = 22;

/// Characters a public id is drawn from (base36)
pub const PUBLIC_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Random bytes in an upload storage key
pub const STORAGE_KEY_RANDOM_BYTES: usize = 16;

/// Existing ids listed in a card 404 body
pub const NOT_FOUND_SAMPLE_SIZE: usize = 5;

/// Cards listed in the analytics leaderboard
pub const TOP_VCARDS_LIMIT: usize = 5;

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Device type recorded when nothing better is known
pub const UNKNOWN_DEVICE: &str = "Unknown";

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_VCARD_REQUIRED_FIELDS: &str = "Name, email, and phone are required fields";

pub const ERR_VCARD_NOT_FOUND: &str = "vCard not found";

pub const ERR_VCARD_NOT_FOUND_MESSAGE: &str = "Could not find a vCard with the provided ID";

pub const ERR_PUBLIC_LINK_NOT_FOUND: &str = "Public link not found";

pub const ERR_NFC_LINK_NOT_FOUND: &str = "NFC link not found";

pub const ERR_NFC_CARD_ID_REQUIRED: &str = "nfcCardId is required";

pub const ERR_TEAM_NAME_REQUIRED: &str = "Team name is required";

pub const ERR_TEAM_NOT_MEMBER: &str = "You are not a member of this team";

pub const ERR_TEAM_CANNOT_MANAGE: &str = "You don't have permission to add members to this team";

pub const ERR_TEAM_CANNOT_EDIT_MEMBERS: &str =
    "You don't have permission to manage members of this team";

pub const ERR_MEMBER_EMAIL_REQUIRED: &str = "Email is required";

pub const ERR_MEMBER_EXISTS: &str = "User is already a member of this team";

pub const ERR_MEMBER_NOT_FOUND: &str = "Team member not found";

pub const ERR_MEMBER_UPDATE_EMPTY: &str = "Permissions or role are required";

pub const ERR_UPLOAD_FIELDS_REQUIRED: &str = "Filename and content type are required";

pub const ERR_INVALID_EMAIL: &str = "A valid email is required";

pub const ERR_PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters";

pub const ERR_USER_EXISTS: &str = "User already exists";

pub const ERR_EMAIL_RESERVED: &str = "This email address is reserved";

pub const ERR_VCARD_NOT_OWNER: &str = "You don't have permission to modify this vCard";
