use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{AuditRecord, EventStatus, NotificationRecord};
use sea_orm::*;
use tracing::{info, instrument};

use crate::booking::roster::{RosterService, has_active_registration};
use crate::entity::{event, team, team_member, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::shared::{Pagination, resolve_page};
use crate::models::team::*;
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{check_event_visible, find_event, find_team};

/// Whether the caller may manage teams of the event owning `team`.
async fn manages_event<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    event_id: i32,
) -> Result<bool, AppError> {
    let event = find_event(db, event_id).await?;
    Ok(auth_user.can(Action::EventManageTeams, event.organizer_id))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Teams",
    operation_id = "createTeam",
    summary = "Create a team",
    description = "Creates a team in an event with the caller as its captain. The caller must hold an active registration unless they manage the event. Fails with CAPACITY_EXCEEDED once the event has `max_teams` teams.",
    request_body = CreateTeamRequest,
    responses(
        (status = 201, description = "Team created", body = TeamDetailResponse),
        (status = 400, description = "Validation error or caller not registered (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name taken (DUPLICATE_TEAM_NAME), event full (CAPACITY_EXCEEDED), caller already on a team or event finished (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id = payload.event_id, name = %payload.name))]
pub async fn create_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_team(&payload)?;

    let event = find_event(&state.db, payload.event_id).await?;
    check_event_visible(&auth_user, &event)?;

    let is_manager = auth_user.can(Action::EventManageTeams, event.organizer_id);
    if !is_manager && !has_active_registration(&state.db, auth_user.user_id, event.id).await? {
        return Err(AppError::Validation(
            "You must be registered for this event to create a team".into(),
        ));
    }

    let (team, captain) = RosterService::new(&state.db)
        .create_team(auth_user.user_id, event.id, payload.name.trim(), Utc::now())
        .await?
        .into_result()?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "team.create", "team", Some(team.id))
            .after(&team),
    );
    info!(team_id = team.id, "Team created");

    let members = roster(&state.db, vec![captain]).await?;
    Ok((
        StatusCode::CREATED,
        Json(TeamDetailResponse {
            team: team.into(),
            members,
        }),
    ))
}

/// Attach usernames to roster rows.
async fn roster<C: ConnectionTrait>(
    db: &C,
    members: Vec<team_member::Model>,
) -> Result<Vec<RosterEntry>, DbErr> {
    let ids: Vec<i32> = members.iter().map(|m| m.user_id).collect();
    let names: HashMap<i32, String> = user::Entity::find()
        .select_only()
        .column(user::Column::Id)
        .column(user::Column::Username)
        .filter(user::Column::Id.is_in(ids))
        .into_tuple::<(i32, String)>()
        .all(db)
        .await?
        .into_iter()
        .collect();

    Ok(members
        .into_iter()
        .map(|m| RosterEntry {
            username: names.get(&m.user_id).cloned().unwrap_or_default(),
            user_id: m.user_id,
            role: m.role,
            status: m.status,
            joined_at: m.joined_at,
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Teams",
    operation_id = "listTeams",
    summary = "List teams",
    description = "Teams of draft events are hidden from callers who cannot edit the event.",
    params(TeamListQuery),
    responses(
        (status = 200, description = "List of teams", body = TeamListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_teams(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TeamListQuery>,
) -> Result<Json<TeamListResponse>, AppError> {
    let (page, per_page) = resolve_page(query.page, query.per_page);

    let mut select = team::Entity::find();
    if let Some(event_id) = query.event_id {
        let event = find_event(&state.db, event_id).await?;
        check_event_visible(&auth_user, &event)?;
        select = select.filter(team::Column::EventId.eq(event_id));
    } else if !auth_user.can_any(Action::EventUpdate) {
        select = select.filter(
            team::Column::EventId.in_subquery(
                sea_orm::sea_query::Query::select()
                    .column(event::Column::Id)
                    .from(event::Entity)
                    .cond_where(
                        Condition::any()
                            .add(event::Column::Status.ne(EventStatus::Draft))
                            .add(event::Column::OrganizerId.eq(auth_user.user_id)),
                    )
                    .to_owned(),
            ),
        );
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_asc(team::Column::CreatedAt)
        .order_by_asc(team::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(TeamResponse::from)
        .collect();

    Ok(Json(TeamListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Teams",
    operation_id = "getTeam",
    summary = "Get a team with its roster",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 200, description = "Team details", body = TeamDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<TeamDetailResponse>, AppError> {
    let team = find_team(&state.db, id).await?;
    let event = find_event(&state.db, team.event_id).await?;
    check_event_visible(&auth_user, &event)
        .map_err(|_| AppError::NotFound("Team not found".into()))?;
    let members = team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(id))
        .order_by_asc(team_member::Column::JoinedAt)
        .all(&state.db)
        .await?;
    let members = roster(&state.db, members).await?;
    Ok(Json(TeamDetailResponse {
        team: team.into(),
        members,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Teams",
    operation_id = "deleteTeam",
    summary = "Delete a team",
    description = "Allowed for the team creator, the current captain, and event managers. Frees one team slot in the event.",
    params(("id" = i32, Path, description = "Team ID")),
    responses(
        (status = 204, description = "Team deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_team(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state.db, id).await?;
    let is_manager = manages_event(&state.db, &auth_user, team.event_id).await?;

    let team = RosterService::new(&state.db)
        .delete_team(id, auth_user.user_id, is_manager)
        .await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "team.delete", "team", Some(id)).before(&team),
    );

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/{id}/members",
    tag = "Teams",
    operation_id = "addTeamMember",
    summary = "Add a member to a team",
    description = "Omit `user_id` to join the team yourself. Adding someone else requires being the captain or an event manager. The new member must be registered for the event, and the roster may not exceed the event's `team_size`.",
    params(("id" = i32, Path, description = "Team ID")),
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberResponse),
        (status = 400, description = "User not registered for the event (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Team full (CAPACITY_EXCEEDED), user already on a team or event finished (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(team_id, user_id = ?payload.user_id))]
pub async fn add_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(team_id): Path<i32>,
    AppJson(payload): AppJson<AddMemberRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state.db, team_id).await?;
    let is_manager = manages_event(&state.db, &auth_user, team.event_id).await?;
    let user_id = payload.user_id.unwrap_or(auth_user.user_id);

    let member = RosterService::new(&state.db)
        .add_member(team_id, auth_user.user_id, user_id, is_manager, Utc::now())
        .await?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "team.member.add",
            "team",
            Some(team_id),
        )
        .after(&member),
    );
    if user_id != auth_user.user_id {
        state.activity.notify(
            NotificationRecord::new(
                user_id,
                "team.member.added",
                format!("You were added to team {}", team.name),
            )
            .about("team", team_id),
        );
    }

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

#[utoipa::path(
    patch,
    path = "/{id}/members/{member_id}",
    tag = "Teams",
    operation_id = "updateTeamMember",
    summary = "Change a member's role",
    description = "Captain only. Promoting a member to CAPTAIN transfers captaincy; the previous captain becomes CO_CAPTAIN. The captain cannot demote themselves.",
    params(
        ("id" = i32, Path, description = "Team ID"),
        ("member_id" = i32, Path, description = "User ID of the member"),
    ),
    request_body = UpdateMemberRequest,
    responses(
        (status = 200, description = "Member updated", body = MemberResponse),
        (status = 400, description = "Unknown role or captain self-demotion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team or member not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(team_id, member_id, role = %payload.role))]
pub async fn update_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((team_id, member_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<UpdateMemberRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let (before, after) = RosterService::new(&state.db)
        .change_role(team_id, auth_user.user_id, member_id, payload.role)
        .await?;

    if before != after {
        state.activity.audit(
            AuditRecord::new(
                Some(auth_user.user_id),
                "team.member.role",
                "team",
                Some(team_id),
            )
            .before(&before)
            .after(&after),
        );
    }

    Ok(Json(after.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}/members/{member_id}",
    tag = "Teams",
    operation_id = "removeTeamMember",
    summary = "Remove a member from a team",
    description = "Members may leave on their own; the captain and event managers may remove others. The team creator can never be removed. Removing the captain returns captaincy to the creator.",
    params(
        ("id" = i32, Path, description = "Team ID"),
        ("member_id" = i32, Path, description = "User ID of the member"),
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Team or member not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Creator cannot be removed (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(team_id, member_id))]
pub async fn remove_member(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((team_id, member_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, AppError> {
    let team = find_team(&state.db, team_id).await?;
    let is_manager = manages_event(&state.db, &auth_user, team.event_id).await?;

    let removed = RosterService::new(&state.db)
        .remove_member(team_id, auth_user.user_id, member_id, is_manager)
        .await?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "team.member.remove",
            "team",
            Some(team_id),
        )
        .before(&removed),
    );
    if member_id != auth_user.user_id {
        state.activity.notify(
            NotificationRecord::new(
                member_id,
                "team.member.removed",
                format!("You were removed from team {}", team.name),
            )
            .about("team", team_id),
        );
    }

    Ok(StatusCode::NO_CONTENT)
}
