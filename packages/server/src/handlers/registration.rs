use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::{AuditRecord, NotificationRecord, RegistrationStatus};
use sea_orm::*;
use tracing::{info, instrument};

use crate::booking::seats::SeatClaimService;
use crate::entity::registration;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::registration::*;
use crate::models::shared::{Pagination, resolve_page};
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{check_event_visible, find_event, find_registration};

#[utoipa::path(
    post,
    path = "/",
    tag = "Registrations",
    operation_id = "createRegistration",
    summary = "Register for an event",
    description = "Registers the caller for an event, optionally reserving a seat from the event's seat map. The registration starts PENDING. Concurrent claims on one seat resolve to exactly one winner; the others receive SEAT_UNAVAILABLE.",
    request_body = CreateRegistrationRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationResponse),
        (status = 400, description = "Registration closed (REGISTRATION_CLOSED) or validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Already registered (DUPLICATE_REGISTRATION), seat taken (SEAT_UNAVAILABLE), or event full (CAPACITY_EXCEEDED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, event_id = payload.event_id, seat_id = ?payload.seat_id))]
pub async fn create_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateRegistrationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state.db, payload.event_id).await?;
    check_event_visible(&auth_user, &event)?;

    let model = SeatClaimService::new(&state.db)
        .claim(auth_user.user_id, payload.event_id, payload.seat_id, Utc::now())
        .await?
        .into_result()?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "registration.create",
            "registration",
            Some(model.id),
        )
        .after(&model),
    );
    state.activity.notify(
        NotificationRecord::new(
            auth_user.user_id,
            "registration.created",
            format!("You are registered for {}", event.title),
        )
        .about("registration", model.id),
    );
    info!(registration_id = model.id, "Registration created");

    Ok((StatusCode::CREATED, Json(RegistrationResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Registrations",
    operation_id = "listMyRegistrations",
    summary = "List the caller's registrations",
    description = "With `event_id` set, callers who manage that event see every registration for it.",
    params(RegistrationListQuery),
    responses(
        (status = 200, description = "Own registrations, newest first", body = RegistrationListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = auth_user.user_id))]
pub async fn list_my_registrations(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<RegistrationListQuery>,
) -> Result<Json<RegistrationListResponse>, AppError> {
    let mut select = registration::Entity::find();
    let manages = match query.event_id {
        Some(event_id) => {
            let event = find_event(&state.db, event_id).await?;
            auth_user.can(Action::EventManageRegistrations, event.organizer_id)
        }
        None => false,
    };
    if !manages {
        select = select.filter(registration::Column::UserId.eq(auth_user.user_id));
    }
    paginate_registrations(&state.db, select, query).await.map(Json)
}

/// Apply the shared filters and paging to a registration query.
pub(crate) async fn paginate_registrations(
    db: &DatabaseConnection,
    mut select: Select<registration::Entity>,
    query: RegistrationListQuery,
) -> Result<RegistrationListResponse, AppError> {
    let (page, per_page) = resolve_page(query.page, query.per_page);

    if let Some(event_id) = query.event_id {
        select = select.filter(registration::Column::EventId.eq(event_id));
    }
    if let Some(status) = query.status {
        select = select.filter(registration::Column::Status.eq(status));
    }

    let total = select.clone().paginate(db, per_page).num_items().await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(registration::Column::CreatedAt)
        .order_by_desc(registration::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(db)
        .await?
        .into_iter()
        .map(RegistrationResponse::from)
        .collect();

    Ok(RegistrationListResponse { data, pagination })
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "getRegistration",
    summary = "Get a registration by ID",
    description = "Visible to the registrant and to those who manage the event. Returns 404 (not 403) otherwise.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 200, description = "Registration", body = RegistrationResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let model = find_registration(&state.db, id).await?;
    if model.user_id != auth_user.user_id {
        let event = find_event(&state.db, model.event_id).await?;
        if !auth_user.can(Action::EventManageRegistrations, event.organizer_id) {
            return Err(AppError::NotFound("Registration not found".into()));
        }
    }
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "updateRegistrationStatus",
    summary = "Change a registration's status",
    description = "Event managers may confirm, reject, or cancel. Registrants may only cancel their own registration. Leaving PENDING/CONFIRMED releases the reserved seat.",
    params(("id" = i32, Path, description = "Registration ID")),
    request_body = UpdateRegistrationRequest,
    responses(
        (status = 200, description = "Registration updated", body = RegistrationResponse),
        (status = 400, description = "Illegal status transition (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, status = %payload.status))]
pub async fn update_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateRegistrationRequest>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let current = find_registration(&state.db, id).await?;
    let event = find_event(&state.db, current.event_id).await?;

    let self_cancel =
        current.user_id == auth_user.user_id && payload.status == RegistrationStatus::Cancelled;
    if !self_cancel {
        auth_user.authorize_owned(Action::EventManageRegistrations, event.organizer_id)?;
    }

    let (before, after) = SeatClaimService::new(&state.db)
        .transition(id, payload.status, Utc::now())
        .await?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "registration.update",
            "registration",
            Some(id),
        )
        .before(&before)
        .after(&after),
    );
    if after.user_id != auth_user.user_id {
        state.activity.notify(
            NotificationRecord::new(
                after.user_id,
                "registration.status",
                format!(
                    "Your registration for {} is now {}",
                    event.title, after.status
                ),
            )
            .about("registration", id),
        );
    }

    Ok(Json(after.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Registrations",
    operation_id = "cancelRegistration",
    summary = "Cancel a registration",
    description = "Cancels the caller's own registration and releases its seat. The row is kept with status CANCELLED, so the caller cannot register for the same event again.",
    params(("id" = i32, Path, description = "Registration ID")),
    responses(
        (status = 204, description = "Registration cancelled"),
        (status = 400, description = "Registration already closed (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Registration not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn cancel_registration(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    let current = find_registration(&state.db, id).await?;
    if current.user_id != auth_user.user_id {
        return Err(AppError::NotFound("Registration not found".into()));
    }

    let (before, after) = SeatClaimService::new(&state.db)
        .transition(id, RegistrationStatus::Cancelled, Utc::now())
        .await?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "registration.cancel",
            "registration",
            Some(id),
        )
        .before(&before)
        .after(&after),
    );

    Ok(StatusCode::NO_CONTENT)
}
