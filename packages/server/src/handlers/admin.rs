use axum::Json;
use axum::extract::{Path, State};
use common::{AuditRecord, NotificationRecord, UserRole};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{audit_log, registration, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::handlers::registration::paginate_registrations;
use crate::models::admin::*;
use crate::models::registration::{RegistrationListQuery, RegistrationListResponse};
use crate::models::shared::{Pagination, escape_like, resolve_page};
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{find_event, find_user};

#[utoipa::path(
    get,
    path = "/users",
    tag = "Admin",
    operation_id = "adminListUsers",
    summary = "List user accounts",
    description = "Requires ADMIN or SUPERADMIN.",
    params(UserListQuery),
    responses(
        (status = 200, description = "Users", body = UserListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_users(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    auth_user.authorize(Action::UserRead)?;
    let (page, per_page) = resolve_page(query.page, query.per_page);

    let mut select = user::Entity::find();
    if let Some(role) = query.role {
        select = select.filter(user::Column::Role.eq(role));
    }
    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Username)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_asc(user::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    Ok(Json(UserListResponse { data, pagination }))
}

#[utoipa::path(
    patch,
    path = "/users/{id}/role",
    tag = "Admin",
    operation_id = "adminUpdateUserRole",
    summary = "Change a user's role",
    description = "Requires SUPERADMIN. A SUPERADMIN cannot change their own role. The new role takes effect on the user's next login.",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = UserResponse),
        (status = 400, description = "Unknown role or self-demotion (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, role = %payload.role))]
pub async fn update_user_role(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>, AppError> {
    auth_user.authorize(Action::UserManage)?;
    if id == auth_user.user_id {
        return Err(AppError::Validation("You cannot change your own role".into()));
    }

    let existing = find_user(&state.db, id).await?;
    if existing.role == payload.role {
        return Ok(Json(existing.into()));
    }

    let mut active: user::ActiveModel = existing.clone().into();
    active.role = Set(payload.role);
    let model = active.update(&state.db).await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "user.role", "user", Some(id))
            .before(&existing)
            .after(&model),
    );
    state.activity.notify(
        NotificationRecord::new(
            id,
            "user.role",
            format!("Your role is now {}", model.role),
        )
        .about("user", id),
    );
    info!(user_id = id, from = %existing.role, to = %model.role, "User role changed");

    Ok(Json(model.into()))
}

#[utoipa::path(
    get,
    path = "/audit-logs",
    tag = "Admin",
    operation_id = "adminListAuditLogs",
    summary = "Browse the audit log",
    description = "Requires ADMIN or SUPERADMIN. Newest first.",
    params(AuditLogQuery),
    responses(
        (status = 200, description = "Audit records", body = AuditLogListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_audit_logs(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AuditLogQuery>,
) -> Result<Json<AuditLogListResponse>, AppError> {
    auth_user.authorize(Action::AuditRead)?;
    let (page, per_page) = resolve_page(query.page, query.per_page);

    let mut select = audit_log::Entity::find();
    if let Some(ref entity) = query.entity {
        select = select.filter(audit_log::Column::Entity.eq(entity.as_str()));
    }
    if let Some(actor_id) = query.actor_id {
        select = select.filter(audit_log::Column::ActorId.eq(actor_id));
    }
    if let Some(ref action) = query.action {
        select = select.filter(audit_log::Column::Action.eq(action.as_str()));
    }

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(audit_log::Column::CreatedAt)
        .order_by_desc(audit_log::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(AuditLogResponse::from)
        .collect();

    Ok(Json(AuditLogListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/events/{id}/registrations",
    tag = "Admin",
    operation_id = "adminListEventRegistrations",
    summary = "List every registration of an event",
    description = "Requires ADMIN or SUPERADMIN, or the ORGANIZER who owns the event. The `event_id` query filter is ignored.",
    params(("id" = i32, Path, description = "Event ID"), RegistrationListQuery),
    responses(
        (status = 200, description = "Registrations", body = RegistrationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(id))]
pub async fn list_event_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppQuery(mut query): AppQuery<RegistrationListQuery>,
) -> Result<Json<RegistrationListResponse>, AppError> {
    let event = find_event(&state.db, id).await?;
    auth_user.authorize_owned(Action::EventManageRegistrations, event.organizer_id)?;

    query.event_id = Some(id);
    paginate_registrations(&state.db, registration::Entity::find(), query)
        .await
        .map(Json)
}

/// Roles an admin may assign, for clients building role pickers.
#[utoipa::path(
    get,
    path = "/roles",
    tag = "Admin",
    operation_id = "adminListRoles",
    summary = "List assignable roles",
    responses(
        (status = 200, description = "Roles", body = Vec<UserRole>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user))]
pub async fn list_roles(auth_user: AuthUser) -> Result<Json<Vec<UserRole>>, AppError> {
    auth_user.authorize(Action::UserRead)?;
    Ok(Json(UserRole::ALL.to_vec()))
}
