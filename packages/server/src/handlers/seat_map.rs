use std::collections::HashSet;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{AuditRecord, SeatStatus, SeatType, seat_label};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{LockType, Query as SeaQuery};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{event, registration, seat, seat_map};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::{AppJson, AppQuery};
use crate::models::seat_map::*;
use crate::models::shared::{PageQuery, Pagination};
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::find_seat_map;

/// Seats are inserted in chunks to stay under the bind-parameter limit.
const SEAT_INSERT_CHUNK: usize = 1000;

#[utoipa::path(
    post,
    path = "/",
    tag = "Seat Maps",
    operation_id = "createSeatMap",
    summary = "Create a seat map and its seats",
    description = "Creates a `width` x `height` grid of seats in one transaction. Seats listed in `vip_seats` get type VIP. Labels are a row letter sequence (A..Z, AA..) followed by the 1-based column. Requires ORGANIZER, ADMIN, or SUPERADMIN.",
    request_body = CreateSeatMapRequest,
    responses(
        (status = 201, description = "Seat map created", body = SeatMapDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(name = %payload.name, width = payload.width, height = payload.height))]
pub async fn create_seat_map(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSeatMapRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::SeatMapCreate)?;
    validate_create_seat_map(&payload)?;

    let txn = state.db.begin().await?;

    let map = seat_map::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        width: Set(payload.width),
        height: Set(payload.height),
        created_by: Set(auth_user.user_id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let vip: HashSet<SeatPosition> = payload.vip_seats.iter().copied().collect();
    let mut grid = Vec::with_capacity((payload.width * payload.height) as usize);
    for row in 0..payload.height {
        for col in 0..payload.width {
            let seat_type = if vip.contains(&SeatPosition { row, col }) {
                SeatType::Vip
            } else {
                SeatType::Regular
            };
            grid.push(seat::ActiveModel {
                seat_map_id: Set(map.id),
                row: Set(row),
                col: Set(col),
                label: Set(seat_label(row as u32, col as u32)),
                seat_type: Set(seat_type),
                status: Set(SeatStatus::Available),
                ..Default::default()
            });
        }
    }
    for chunk in grid.chunks(SEAT_INSERT_CHUNK) {
        seat::Entity::insert_many(chunk.to_vec()).exec(&txn).await?;
    }

    let seats = load_seats(&txn, map.id).await?;
    txn.commit().await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "seat_map.create", "seat_map", Some(map.id))
            .after(&map),
    );
    info!(seat_map_id = map.id, seats = seats.len(), "Seat map created");

    Ok((
        StatusCode::CREATED,
        Json(SeatMapDetailResponse {
            seat_map: map.into(),
            seats,
        }),
    ))
}

async fn load_seats<C: ConnectionTrait>(
    db: &C,
    seat_map_id: i32,
) -> Result<Vec<SeatResponse>, DbErr> {
    Ok(seat::Entity::find()
        .filter(seat::Column::SeatMapId.eq(seat_map_id))
        .order_by_asc(seat::Column::Row)
        .order_by_asc(seat::Column::Col)
        .all(db)
        .await?
        .into_iter()
        .map(SeatResponse::from)
        .collect())
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Seat Maps",
    operation_id = "listSeatMaps",
    summary = "List seat maps",
    params(PageQuery),
    responses(
        (status = 200, description = "List of seat maps", body = SeatMapListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_seat_maps(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<Json<SeatMapListResponse>, AppError> {
    let (page, per_page) = query.resolve();
    let select = seat_map::Entity::find();

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;
    let pagination = Pagination::new(page, per_page, total);

    let data = select
        .order_by_desc(seat_map::Column::CreatedAt)
        .order_by_desc(seat_map::Column::Id)
        .offset(Some(pagination.offset()))
        .limit(Some(per_page))
        .all(&state.db)
        .await?
        .into_iter()
        .map(SeatMapResponse::from)
        .collect();

    Ok(Json(SeatMapListResponse { data, pagination }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Seat Maps",
    operation_id = "getSeatMap",
    summary = "Get a seat map with its seats",
    params(("id" = i32, Path, description = "Seat map ID")),
    responses(
        (status = 200, description = "Seat map details", body = SeatMapDetailResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Seat map not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(id))]
pub async fn get_seat_map(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<SeatMapDetailResponse>, AppError> {
    let map = find_seat_map(&state.db, id).await?;
    let seats = load_seats(&state.db, id).await?;
    Ok(Json(SeatMapDetailResponse {
        seat_map: map.into(),
        seats,
    }))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Seat Maps",
    operation_id = "deleteSeatMap",
    summary = "Delete a seat map",
    description = "Deletes the seat map and its seats. Fails with 409 while any event references the map, leaving the seats intact. Requires SUPERADMIN.",
    params(("id" = i32, Path, description = "Seat map ID")),
    responses(
        (status = 204, description = "Seat map deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Seat map not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Seat map in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_seat_map(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.authorize(Action::SeatMapDelete)?;

    let txn = state.db.begin().await?;
    let map = seat_map::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Seat map not found".into()))?;

    let in_use = event::Entity::find()
        .filter(event::Column::SeatMapId.eq(id))
        .count(&txn)
        .await?;
    if in_use > 0 {
        return Err(AppError::Conflict(format!(
            "Seat map is used by {in_use} event(s)"
        )));
    }

    // Only inactive registrations of events that moved to another map can
    // still point here.
    registration::Entity::update_many()
        .col_expr(
            registration::Column::SeatId,
            Expr::value(Option::<i32>::None),
        )
        .filter(
            registration::Column::SeatId.in_subquery(
                SeaQuery::select()
                    .column(seat::Column::Id)
                    .from(seat::Entity)
                    .and_where(seat::Column::SeatMapId.eq(id))
                    .to_owned(),
            ),
        )
        .exec(&txn)
        .await?;

    seat::Entity::delete_many()
        .filter(seat::Column::SeatMapId.eq(id))
        .exec(&txn)
        .await?;
    seat_map::Entity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    state.activity.audit(
        AuditRecord::new(Some(auth_user.user_id), "seat_map.delete", "seat_map", Some(id))
            .before(&map),
    );

    Ok(StatusCode::NO_CONTENT)
}
