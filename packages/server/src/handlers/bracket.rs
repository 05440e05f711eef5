use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{AuditRecord, BracketStatus};
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::instrument;

use crate::entity::{bracket, event};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::bracket::*;
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{check_event_visible, find_bracket, find_event};

#[utoipa::path(
    post,
    path = "/",
    tag = "Brackets",
    operation_id = "createBracket",
    summary = "Create a bracket for an event",
    description = "Requires ADMIN or SUPERADMIN, or the ORGANIZER who owns the event. Brackets start PENDING.",
    request_body = CreateBracketRequest,
    responses(
        (status = 201, description = "Bracket created", body = BracketResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id = payload.event_id, format = %payload.format))]
pub async fn create_bracket(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateBracketRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_bracket(&payload)?;
    let event = find_event(&state.db, payload.event_id).await?;
    auth_user.authorize_owned(Action::BracketManage, event.organizer_id)?;

    let now = chrono::Utc::now();
    let model = bracket::ActiveModel {
        event_id: Set(event.id),
        name: Set(payload.name.trim().to_string()),
        format: Set(payload.format),
        status: Set(BracketStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "bracket.create", "bracket", Some(model.id))
            .after(&model),
    );

    Ok((StatusCode::CREATED, Json(BracketResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Brackets",
    operation_id = "listBrackets",
    summary = "List brackets",
    description = "Brackets of draft events are hidden from callers who cannot edit the event.",
    params(BracketListQuery),
    responses(
        (status = 200, description = "List of brackets", body = Vec<BracketResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_brackets(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<BracketListQuery>,
) -> Result<Json<Vec<BracketResponse>>, AppError> {
    let mut select = bracket::Entity::find();
    if let Some(event_id) = query.event_id {
        let event = find_event(&state.db, event_id).await?;
        check_event_visible(&auth_user, &event)?;
        select = select.filter(bracket::Column::EventId.eq(event_id));
    } else if !auth_user.can_any(Action::EventUpdate) {
        select = select.filter(
            bracket::Column::EventId.in_subquery(
                sea_orm::sea_query::Query::select()
                    .column(event::Column::Id)
                    .from(event::Entity)
                    .cond_where(
                        Condition::any()
                            .add(event::Column::Status.ne(common::EventStatus::Draft))
                            .add(event::Column::OrganizerId.eq(auth_user.user_id)),
                    )
                    .to_owned(),
            ),
        );
    }

    let data = select
        .order_by_asc(bracket::Column::EventId)
        .order_by_asc(bracket::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(BracketResponse::from)
        .collect();

    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Brackets",
    operation_id = "getBracket",
    summary = "Get a bracket by ID",
    params(("id" = i32, Path, description = "Bracket ID")),
    responses(
        (status = 200, description = "Bracket", body = BracketResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Bracket not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_bracket(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BracketResponse>, AppError> {
    let model = find_bracket(&state.db, id).await?;
    let event = find_event(&state.db, model.event_id).await?;
    check_event_visible(&auth_user, &event)
        .map_err(|_| AppError::NotFound("Bracket not found".into()))?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Brackets",
    operation_id = "updateBracket",
    summary = "Rename a bracket or advance its status",
    description = "Status moves PENDING -> IN_PROGRESS -> COMPLETED, or from PENDING/IN_PROGRESS to CANCELLED. Any other transition is rejected.",
    params(("id" = i32, Path, description = "Bracket ID")),
    request_body = UpdateBracketRequest,
    responses(
        (status = 200, description = "Bracket updated", body = BracketResponse),
        (status = 400, description = "Validation error or illegal transition (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Bracket not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_bracket(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBracketRequest>,
) -> Result<Json<BracketResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = bracket::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Bracket not found".into()))?;
    let event = find_event(&txn, existing.event_id).await?;
    auth_user.authorize_owned(Action::BracketManage, event.organizer_id)?;
    validate_update_bracket(&payload, existing.status)?;

    let mut active: bracket::ActiveModel = existing.clone().into();
    if let Some(ref name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "bracket.update", "bracket", Some(id))
            .before(&existing)
            .after(&model),
    );

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Brackets",
    operation_id = "deleteBracket",
    summary = "Delete a bracket",
    description = "Requires SUPERADMIN.",
    params(("id" = i32, Path, description = "Bracket ID")),
    responses(
        (status = 204, description = "Bracket deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Bracket not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_bracket(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::BracketDelete)?;
    let existing = find_bracket(&state.db, id).await?;
    bracket::Entity::delete_by_id(id).exec(&state.db).await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "bracket.delete", "bracket", Some(id))
            .before(&existing),
    );

    Ok(StatusCode::NO_CONTENT)
}
