use axum::{
    Json,
    extract::{Path, State},
};
use redb::ReadableDatabase;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::constants::{
    DEFAULT_MEMBER_ROLE, ERR_INVALID_EMAIL, ERR_MEMBER_EMAIL_REQUIRED, ERR_MEMBER_EXISTS,
    ERR_MEMBER_NOT_FOUND, ERR_MEMBER_UPDATE_EMPTY, ERR_TEAM_CANNOT_EDIT_MEMBERS,
    ERR_TEAM_CANNOT_MANAGE, ERR_TEAM_NAME_REQUIRED, ERR_TEAM_NOT_MEMBER, TEAM_ADMIN_ROLE,
};
use crate::db::teams::{
    add_member, compose_member, compose_members, compose_team, find_member, membership,
    remove_member, save_member, save_team, teams_for_user,
};
use crate::db::users::find_or_create_user;
use crate::db::{ReadTables, new_id, now};
use crate::error::{AppError, Result};
use crate::models::vcard::present;
use crate::models::{
    Permissions, PermissionsInput, Team, TeamMember, TeamMemberRecord, TeamRecord, User,
};
use crate::routes::validation::required_text;
use crate::routes::vcards::DeleteResponse;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddMemberRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
    pub permissions: Option<PermissionsInput>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMemberRequest {
    pub permissions: Option<PermissionsInput>,
    pub role: Option<String>,
}

/// The caller's membership in the team, or 403
fn require_member(txn: &impl ReadTables, team_id: &str, user_id: &str) -> Result<TeamMemberRecord> {
    membership(txn, team_id, user_id)?.ok_or_else(|| {
        tracing::warn!("User {} is not a member of team {}", user_id, team_id);
        AppError::Forbidden(ERR_TEAM_NOT_MEMBER.to_string())
    })
}

/// 403 with `message` unless the caller may manage the team
fn require_manager(txn: &impl ReadTables, team_id: &str, user_id: &str, message: &str) -> Result<()> {
    match membership(txn, team_id, user_id)? {
        Some(member) if member.permissions.manage_team => Ok(()),
        _ => {
            tracing::warn!("User {} cannot manage team {}", user_id, team_id);
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

/// A member of the given team, or 404
fn team_member(txn: &impl ReadTables, team_id: &str, member_id: &str) -> Result<TeamMemberRecord> {
    find_member(txn, member_id)?
        .filter(|member| member.team_id == team_id)
        .ok_or_else(|| AppError::NotFound(ERR_MEMBER_NOT_FOUND.to_string()))
}

/// Teams the caller belongs to, with their members
pub async fn list_teams(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<Team>>> {
    let db = state.db.clone();

    let teams = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        teams_for_user(&read_txn, &user.id)?
            .into_iter()
            .map(|team| compose_team(&read_txn, team))
            .collect::<Result<Vec<_>>>()
    })
    .await??;

    Ok(Json(teams))
}

/// Create a team with the caller as its admin
pub async fn create_team(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<Json<Team>> {
    let name = required_text(payload.name.as_deref(), ERR_TEAM_NAME_REQUIRED)?;
    let db = state.db.clone();

    let team = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        let timestamp = now();

        let team = TeamRecord {
            id: new_id(),
            name,
            description: present(payload.description.as_deref()),
            created_at: timestamp,
        };
        save_team(&write_txn, &team)?;

        add_member(
            &write_txn,
            &TeamMemberRecord {
                id: new_id(),
                team_id: team.id.clone(),
                user_id: user.id.clone(),
                role: TEAM_ADMIN_ROLE.to_string(),
                permissions: Permissions::all(),
                created_at: timestamp,
                updated_at: timestamp,
            },
        )?;

        let team = compose_team(&write_txn, team)?;
        write_txn.commit()?;
        Ok::<_, AppError>(team)
    })
    .await??;

    tracing::info!("Created team {} ({})", team.id, team.name);
    Ok(Json(team))
}

pub async fn list_members(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<Vec<TeamMember>>> {
    let db = state.db.clone();

    let members = tokio::task::spawn_blocking(move || {
        let read_txn = db.begin_read()?;
        require_member(&read_txn, &team_id, &user.id)?;
        compose_members(&read_txn, &team_id)
    })
    .await??;

    Ok(Json(members))
}

/// Add a user to the team by email
///
/// Unknown emails get a placeholder account that can be claimed later by
/// registering with the same address.
pub async fn invite_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(team_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<Json<TeamMember>> {
    let db = state.db.clone();

    let member = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        require_manager(&write_txn, &team_id, &user.id, ERR_TEAM_CANNOT_MANAGE)?;

        let email = required_text(payload.email.as_deref(), ERR_MEMBER_EMAIL_REQUIRED)?;
        if !User::validate_email(&email) {
            return Err(AppError::InvalidInput(ERR_INVALID_EMAIL.to_string()));
        }

        let name = present(payload.name.as_deref()).unwrap_or_else(|| User::default_name(&email));
        let invitee = find_or_create_user(&write_txn, &email, &name)?;

        if membership(&write_txn, &team_id, &invitee.id)?.is_some() {
            return Err(AppError::InvalidInput(ERR_MEMBER_EXISTS.to_string()));
        }

        let timestamp = now();
        let member = TeamMemberRecord {
            id: new_id(),
            team_id: team_id.clone(),
            user_id: invitee.id.clone(),
            role: present(payload.role.as_deref())
                .unwrap_or_else(|| DEFAULT_MEMBER_ROLE.to_string()),
            permissions: payload
                .permissions
                .unwrap_or_default()
                .apply_to(Permissions::default()),
            created_at: timestamp,
            updated_at: timestamp,
        };
        add_member(&write_txn, &member)?;

        let member = compose_member(&write_txn, member)?;
        write_txn.commit()?;
        Ok::<_, AppError>(member)
    })
    .await??;

    tracing::info!("Added user {} to team {} as {}", member.user_id, member.team_id, member.role);
    Ok(Json(member))
}

/// Change a member's role or permission flags
pub async fn update_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, member_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMemberRequest>,
) -> Result<Json<TeamMember>> {
    let db = state.db.clone();

    let member = tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        require_manager(&write_txn, &team_id, &user.id, ERR_TEAM_CANNOT_EDIT_MEMBERS)?;

        let role = present(payload.role.as_deref());
        if payload.permissions.is_none() && role.is_none() {
            return Err(AppError::InvalidInput(ERR_MEMBER_UPDATE_EMPTY.to_string()));
        }

        let mut member = team_member(&write_txn, &team_id, &member_id)?;
        if let Some(permissions) = payload.permissions {
            member.permissions = permissions.apply_to(member.permissions);
        }
        if let Some(role) = role {
            member.role = role;
        }
        member.updated_at = now();
        save_member(&write_txn, &member)?;

        let member = compose_member(&write_txn, member)?;
        write_txn.commit()?;
        Ok::<_, AppError>(member)
    })
    .await??;

    tracing::info!("Updated member {} of team {}", member.id, member.team_id);
    Ok(Json(member))
}

pub async fn delete_member(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((team_id, member_id)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    let db = state.db.clone();

    tokio::task::spawn_blocking(move || {
        let write_txn = db.begin_write()?;
        require_manager(&write_txn, &team_id, &user.id, ERR_TEAM_CANNOT_EDIT_MEMBERS)?;

        let member = team_member(&write_txn, &team_id, &member_id)?;
        remove_member(&write_txn, &member)?;
        write_txn.commit()?;

        tracing::info!("Removed member {} from team {}", member.id, team_id);
        Ok::<_, AppError>(())
    })
    .await??;

    Ok(Json(DeleteResponse { success: true }))
}
