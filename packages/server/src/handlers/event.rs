use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{AuditRecord, EventStatus, NotificationRecord, RegistrationStatus, SeatStatus};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument};

use crate::booking::roster::largest_roster;
use crate::booking::seats::release_seat;
use crate::entity::{
    announcement, bracket, event, registration, seat, seat_map, team, team_member,
};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::event::*;
use crate::models::seat_map::{EventSeatsResponse, SeatResponse};
use crate::models::shared::{Pagination, escape_like, resolve_page};
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{
    active_registrant_ids, check_event_visible, find_event, find_event_for_update,
};

async fn ensure_seat_map_exists<C: ConnectionTrait>(db: &C, id: i32) -> Result<(), AppError> {
    if seat_map::Entity::find_by_id(id).one(db).await?.is_none() {
        return Err(AppError::Validation(format!("Seat map {id} does not exist")));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Events",
    operation_id = "createEvent",
    summary = "Create a new event",
    description = "Creates an event owned by the caller. Requires ORGANIZER, ADMIN, or SUPERADMIN. The event starts in DRAFT unless another initial status is given.",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(title = %payload.title))]
pub async fn create_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::EventCreate)?;
    validate_create_event(&payload)?;

    if let Some(seat_map_id) = payload.seat_map_id {
        ensure_seat_map_exists(&state.db, seat_map_id).await?;
    }

    let now = chrono::Utc::now();
    let new_event = event::ActiveModel {
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description),
        organizer_id: Set(auth_user.user_id),
        seat_map_id: Set(payload.seat_map_id),
        status: Set(payload.status.unwrap_or_default()),
        max_teams: Set(payload.max_teams),
        max_players: Set(payload.max_players),
        team_size: Set(payload.team_size),
        team_count: Set(0),
        registration_start: Set(payload.registration_start),
        registration_end: Set(payload.registration_end),
        event_start: Set(payload.event_start),
        event_end: Set(payload.event_end),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_event.insert(&state.db).await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "event.create", "event", Some(model.id))
            .after(&model),
    );
    info!(event_id = model.id, "Event created");

    Ok((StatusCode::CREATED, Json(EventResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Events",
    operation_id = "listEvents",
    summary = "List events with pagination and search",
    description = "Returns a paginated list of events. Staff see every event; organizers and players see non-draft events plus their own drafts. Supports sorting by `created_at`, `event_start`, or `title`.",
    params(EventListQuery),
    responses(
        (status = 200, description = "List of events", body = EventListResponse),
        (status = 400, description = "Invalid query (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_events(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EventListQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let (page, per_page) = resolve_page(query.page, query.per_page);

    let mut select = event::Entity::find();

    if !auth_user.can_any(Action::EventUpdate) {
        select = select.filter(
            Condition::any()
                .add(event::Column::Status.ne(EventStatus::Draft))
                .add(event::Column::OrganizerId.eq(auth_user.user_id)),
        );
    }

    if let Some(status) = query.status {
        select = select.filter(event::Column::Status.eq(status));
    }

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            select = select.filter(
                Expr::expr(Func::lower(Expr::col(event::Column::Title)))
                    .like(LikeExpr::new(format!("%{}%", term.to_lowercase())).escape('\\')),
            );
        }
    }

    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match query.sort_by.as_deref().unwrap_or("created_at") {
        "created_at" => event::Column::CreatedAt,
        "event_start" => event::Column::EventStart,
        "title" => event::Column::Title,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, event_start, title".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by(sort_column, sort_order)
        .order_by_asc(event::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(EventResponse::from)
        .collect();

    Ok(Json(EventListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Events",
    operation_id = "getEvent",
    summary = "Get an event by ID",
    description = "Returns 404 (not 403) for drafts the caller may not edit.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = EventResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    check_event_visible(&auth_user, &model)?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Events",
    operation_id = "updateEvent",
    summary = "Replace an event's editable fields",
    description = "Requires ADMIN or SUPERADMIN, or the owning ORGANIZER. `max_teams` may not drop below the number of teams already created, `team_size` below the largest roster, `max_players` below the active registrations, and the seat map cannot change once seated registrations exist. Cancelling an event notifies its registrants.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Seat map locked by seated registrations, or capacity below current usage (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;
    auth_user.authorize_owned(Action::EventUpdate, existing.organizer_id)?;
    validate_update_event(&payload, &existing)?;

    if payload.team_size < existing.team_size {
        let largest = largest_roster(&txn, id).await?;
        if largest > std::cmp::Ord::max(payload.team_size, 0) as u64 {
            return Err(AppError::Conflict(format!(
                "team_size cannot drop below the largest roster ({largest} members)"
            )));
        }
    }
    if payload.max_players < existing.max_players {
        let active = registration::Entity::find()
            .filter(registration::Column::EventId.eq(id))
            .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
            .count(&txn)
            .await?;
        if active > std::cmp::Ord::max(payload.max_players, 0) as u64 {
            return Err(AppError::Conflict(format!(
                "max_players cannot drop below the {active} active registrations"
            )));
        }
    }

    if payload.seat_map_id != existing.seat_map_id {
        let seated = registration::Entity::find()
            .filter(registration::Column::EventId.eq(id))
            .filter(registration::Column::SeatId.is_not_null())
            .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
            .count(&txn)
            .await?;
        if seated > 0 {
            return Err(AppError::Conflict(
                "Seat map cannot change while seats are reserved".into(),
            ));
        }
        if let Some(seat_map_id) = payload.seat_map_id {
            ensure_seat_map_exists(&txn, seat_map_id).await?;
        }
    }

    let mut active: event::ActiveModel = existing.clone().into();
    active.title = Set(payload.title.trim().to_string());
    active.description = Set(payload.description);
    active.seat_map_id = Set(payload.seat_map_id);
    if let Some(status) = payload.status {
        active.status = Set(status);
    }
    active.max_teams = Set(payload.max_teams);
    active.max_players = Set(payload.max_players);
    active.team_size = Set(payload.team_size);
    active.registration_start = Set(payload.registration_start);
    active.registration_end = Set(payload.registration_end);
    active.event_start = Set(payload.event_start);
    active.event_end = Set(payload.event_end);
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "event.update", "event", Some(id))
            .before(&existing)
            .after(&model),
    );

    if existing.status != model.status && model.status == EventStatus::Cancelled {
        for user_id in active_registrant_ids(&state.db, id).await? {
            state.activity.notify(
                NotificationRecord::new(
                    user_id,
                    "event.cancelled",
                    format!("{} has been cancelled", model.title),
                )
                .about("event", id),
            );
        }
    }

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Events",
    operation_id = "deleteEvent",
    summary = "Delete an event by ID",
    description = "Permanently deletes an event with its registrations, teams, brackets, and announcements, releasing any reserved seats. Requires SUPERADMIN.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_event(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::EventDelete)?;

    let txn = state.db.begin().await?;
    let existing = find_event_for_update(&txn, id).await?;

    let seated: Vec<i32> = registration::Entity::find()
        .select_only()
        .column(registration::Column::SeatId)
        .filter(registration::Column::EventId.eq(id))
        .filter(registration::Column::SeatId.is_not_null())
        .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
        .into_tuple::<Option<i32>>()
        .all(&txn)
        .await?
        .into_iter()
        .flatten()
        .collect();
    for seat_id in seated {
        release_seat(&txn, seat_id).await?;
    }

    team_member::Entity::delete_many()
        .filter(team_member::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    team::Entity::delete_many()
        .filter(team::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    registration::Entity::delete_many()
        .filter(registration::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    bracket::Entity::delete_many()
        .filter(bracket::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    announcement::Entity::delete_many()
        .filter(announcement::Column::EventId.eq(id))
        .exec(&txn)
        .await?;
    event::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "event.delete", "event", Some(id))
            .before(&existing),
    );
    info!(event_id = id, "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/{id}/seats",
    tag = "Events",
    operation_id = "listEventSeats",
    summary = "List the seats of an event's seat map",
    description = "Returns every seat of the event's seat map with its current status, ordered by row and column.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Seat grid", body = EventSeatsResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found, or event has no seat map (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn list_event_seats(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<EventSeatsResponse>, AppError> {
    let model = find_event(&state.db, id).await?;
    check_event_visible(&auth_user, &model)?;
    let seat_map_id = model
        .seat_map_id
        .ok_or_else(|| AppError::NotFound("Event has no seat map".into()))?;

    let seats = seat::Entity::find()
        .filter(seat::Column::SeatMapId.eq(seat_map_id))
        .order_by_asc(seat::Column::Row)
        .order_by_asc(seat::Column::Col)
        .all(&state.db)
        .await?;

    let reserved = seats
        .iter()
        .filter(|s| s.status == SeatStatus::Reserved)
        .count() as u64;
    let available = seats.len() as u64 - reserved;

    Ok(Json(EventSeatsResponse {
        event_id: id,
        seat_map_id,
        available,
        reserved,
        seats: seats.into_iter().map(SeatResponse::from).collect(),
    }))
}
