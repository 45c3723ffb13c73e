use redb::WriteTransaction;

use crate::db::users::find_user;
use crate::db::{ReadTables, pull_index, push_index, put_record, remove_record, tables};
use crate::error::Result;
use crate::models::{Team, TeamMember, TeamMemberRecord, TeamRecord, User};

pub fn find_team(txn: &impl ReadTables, team_id: &str) -> Result<Option<TeamRecord>> {
    txn.get_record(tables::TEAMS, team_id)
}

pub fn save_team(txn: &WriteTransaction, team: &TeamRecord) -> Result<()> {
    put_record(txn, tables::TEAMS, &team.id, team)
}

pub fn find_member(txn: &impl ReadTables, member_id: &str) -> Result<Option<TeamMemberRecord>> {
    txn.get_record(tables::TEAM_MEMBERS, member_id)
}

fn load_members(txn: &impl ReadTables, member_ids: Vec<String>) -> Result<Vec<TeamMemberRecord>> {
    let mut members = Vec::with_capacity(member_ids.len());
    for member_id in member_ids {
        if let Some(member) = find_member(txn, &member_id)? {
            members.push(member);
        }
    }
    Ok(members)
}

/// Members of a team in the order they joined
pub fn members_of(txn: &impl ReadTables, team_id: &str) -> Result<Vec<TeamMemberRecord>> {
    let member_ids: Vec<String> = txn
        .get_record(tables::TEAM_MEMBER_INDEX, team_id)?
        .unwrap_or_default();
    load_members(txn, member_ids)
}

/// Memberships held by a user across all teams
pub fn memberships_of(txn: &impl ReadTables, user_id: &str) -> Result<Vec<TeamMemberRecord>> {
    let member_ids: Vec<String> = txn
        .get_record(tables::USER_MEMBERSHIP_INDEX, user_id)?
        .unwrap_or_default();
    load_members(txn, member_ids)
}

/// The user's membership in a given team, if any
pub fn membership(
    txn: &impl ReadTables,
    team_id: &str,
    user_id: &str,
) -> Result<Option<TeamMemberRecord>> {
    Ok(memberships_of(txn, user_id)?
        .into_iter()
        .find(|member| member.team_id == team_id))
}

/// Insert a new membership and index it by team and by user
pub fn add_member(txn: &WriteTransaction, member: &TeamMemberRecord) -> Result<()> {
    put_record(txn, tables::TEAM_MEMBERS, &member.id, member)?;
    push_index(txn, tables::TEAM_MEMBER_INDEX, &member.team_id, &member.id)?;
    push_index(txn, tables::USER_MEMBERSHIP_INDEX, &member.user_id, &member.id)?;
    Ok(())
}

pub fn save_member(txn: &WriteTransaction, member: &TeamMemberRecord) -> Result<()> {
    put_record(txn, tables::TEAM_MEMBERS, &member.id, member)
}

/// Remove a membership (and its permissions); the user account is kept
pub fn remove_member(txn: &WriteTransaction, member: &TeamMemberRecord) -> Result<()> {
    remove_record(txn, tables::TEAM_MEMBERS, &member.id)?;
    pull_index(txn, tables::TEAM_MEMBER_INDEX, &member.team_id, &member.id)?;
    pull_index(txn, tables::USER_MEMBERSHIP_INDEX, &member.user_id, &member.id)?;
    Ok(())
}

/// Teams the user belongs to
pub fn teams_for_user(txn: &impl ReadTables, user_id: &str) -> Result<Vec<TeamRecord>> {
    let mut teams = Vec::new();
    for member in memberships_of(txn, user_id)? {
        if let Some(team) = find_team(txn, &member.team_id)? {
            teams.push(team);
        }
    }
    Ok(teams)
}

pub fn compose_member(txn: &impl ReadTables, member: TeamMemberRecord) -> Result<TeamMember> {
    let user = find_user(txn, &member.user_id)?.map(|u| User::from(&u));
    Ok(TeamMember::compose(member, user))
}

pub fn compose_members(txn: &impl ReadTables, team_id: &str) -> Result<Vec<TeamMember>> {
    members_of(txn, team_id)?
        .into_iter()
        .map(|member| compose_member(txn, member))
        .collect()
}

pub fn compose_team(txn: &impl ReadTables, team: TeamRecord) -> Result<Team> {
    let members = compose_members(txn, &team.id)?;
    Ok(Team::compose(team, members))
}
