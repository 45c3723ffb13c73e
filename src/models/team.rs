use serde::{Deserialize, Serialize};

use crate::models::user::User;
use crate::routes::validation::timestamp_to_rfc3339;

/// Permission flags held by a team membership (one set per member)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub create_cards: bool,
    pub edit_cards: bool,
    pub delete_cards: bool,
    pub manage_team: bool,
}

impl Permissions {
    /// Every flag set; granted to a team's creator
    pub fn all() -> Self {
        Self {
            create_cards: true,
            edit_cards: true,
            delete_cards: true,
            manage_team: true,
        }
    }
}

/// Permission flags from a request body; absent flags are left unspecified
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsInput {
    pub create_cards: Option<bool>,
    pub edit_cards: Option<bool>,
    pub delete_cards: Option<bool>,
    pub manage_team: Option<bool>,
}

impl PermissionsInput {
    /// Overlay the specified flags on `base`
    pub fn apply_to(&self, base: Permissions) -> Permissions {
        Permissions {
            create_cards: self.create_cards.unwrap_or(base.create_cards),
            edit_cards: self.edit_cards.unwrap_or(base.edit_cards),
            delete_cards: self.delete_cards.unwrap_or(base.delete_cards),
            manage_team: self.manage_team.unwrap_or(base.manage_team),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMemberRecord {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub permissions: Permissions,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    pub id: String,
    pub team_id: String,
    pub user_id: String,
    pub role: String,
    pub permissions: Permissions,
    pub user: Option<User>,
    pub created_at: String,
    pub updated_at: String,
}

impl TeamMember {
    pub fn compose(record: TeamMemberRecord, user: Option<User>) -> Self {
        Self {
            id: record.id,
            team_id: record.team_id,
            user_id: record.user_id,
            role: record.role,
            permissions: record.permissions,
            user,
            created_at: timestamp_to_rfc3339(record.created_at),
            updated_at: timestamp_to_rfc3339(record.updated_at),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
    pub members: Vec<TeamMember>,
}

impl Team {
    pub fn compose(record: TeamRecord, members: Vec<TeamMember>) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            created_at: timestamp_to_rfc3339(record.created_at),
            members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_flags_default_to_false() {
        let input: PermissionsInput = serde_json::from_str(r#"{ "editCards": true }"#).unwrap();
        let permissions = input.apply_to(Permissions::default());

        assert!(permissions.edit_cards);
        assert!(!permissions.create_cards);
        assert!(!permissions.manage_team);
    }

    #[test]
    fn test_partial_update_keeps_existing_flags() {
        let input: PermissionsInput = serde_json::from_str(r#"{ "manageTeam": false }"#).unwrap();
        let permissions = input.apply_to(Permissions::all());

        assert!(!permissions.manage_team);
        assert!(permissions.create_cards);
        assert!(permissions.edit_cards);
        assert!(permissions.delete_cards);
    }

    #[test]
    fn test_permissions_wire_format() {
        let json = serde_json::to_value(Permissions::all()).unwrap();
        assert_eq!(json["manageTeam"], true);
        assert_eq!(json["createCards"], true);
    }
}
