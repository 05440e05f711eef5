use chrono::{DateTime, Utc};
use common::{MemberStatus, TeamRole};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_name};
use crate::entity::{team, team_member};
use crate::error::AppError;

/// Request body for creating a team. The caller becomes its captain.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateTeamRequest {
    #[schema(example = 3)]
    pub event_id: i32,
    /// Team name (1-64 characters), unique within the event.
    #[schema(example = "Night Owls")]
    pub name: String,
}

pub fn validate_create_team(req: &CreateTeamRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Team name", 64)
}

/// Request body for adding a member. Omit `user_id` to join yourself.
#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct AddMemberRequest {
    pub user_id: Option<i32>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateMemberRequest {
    pub role: TeamRole,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TeamListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub event_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<team::Model> for TeamResponse {
    fn from(m: team::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            creator_id: m.creator_id,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct MemberResponse {
    pub team_id: i32,
    pub user_id: i32,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl From<team_member::Model> for MemberResponse {
    fn from(m: team_member::Model) -> Self {
        Self {
            team_id: m.team_id,
            user_id: m.user_id,
            role: m.role,
            status: m.status,
            joined_at: m.joined_at,
        }
    }
}

/// Roster row joined with the member's username.
#[derive(Serialize, FromQueryResult, utoipa::ToSchema)]
pub struct RosterEntry {
    pub user_id: i32,
    pub username: String,
    pub role: TeamRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamDetailResponse {
    #[serde(flatten)]
    pub team: TeamResponse,
    pub members: Vec<RosterEntry>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TeamListResponse {
    pub data: Vec<TeamResponse>,
    pub pagination: Pagination,
}
