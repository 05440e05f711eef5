use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::{AuditRecord, NotificationRecord};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::announcement;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::announcement::*;
use crate::policy::Action;
use crate::state::AppState;
use crate::utils::lookup::{active_registrant_ids, check_event_visible, find_event};

#[utoipa::path(
    post,
    path = "/",
    tag = "Announcements",
    operation_id = "createAnnouncement",
    summary = "Post an announcement to an event",
    description = "Requires ADMIN or SUPERADMIN, or the ORGANIZER who owns the event. Every user with an active registration receives a notification.",
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateAnnouncementRequest,
    responses(
        (status = 201, description = "Announcement posted", body = AnnouncementResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(event_id))]
pub async fn create_announcement(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
    AppJson(payload): AppJson<CreateAnnouncementRequest>,
) -> Result<impl IntoResponse, AppError> {
    let event = find_event(&state.db, event_id).await?;
    auth_user.authorize_owned(Action::AnnouncementCreate, event.organizer_id)?;
    validate_create_announcement(&payload)?;

    let model = announcement::ActiveModel {
        event_id: Set(event_id),
        author_id: Set(auth_user.user_id),
        title: Set(payload.title.trim().to_string()),
        body: Set(payload.body),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    state.activity.audit(
        AuditRecord::new(
            Some(auth_user.user_id),
            "announcement.create",
            "announcement",
            Some(model.id),
        )
        .after(&model),
    );

    let recipients = active_registrant_ids(&state.db, event_id).await?;
    for user_id in &recipients {
        state.activity.notify(
            NotificationRecord::new(
                *user_id,
                "announcement",
                format!("{}: {}", event.title, model.title),
            )
            .about("announcement", model.id),
        );
    }
    info!(
        announcement_id = model.id,
        recipients = recipients.len(),
        "Announcement posted"
    );

    Ok((StatusCode::CREATED, Json(AnnouncementResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Announcements",
    operation_id = "listAnnouncements",
    summary = "List an event's announcements",
    description = "Newest first.",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Announcements", body = Vec<AnnouncementResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Event not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(event_id))]
pub async fn list_announcements(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<i32>,
) -> Result<Json<Vec<AnnouncementResponse>>, AppError> {
    let event = find_event(&state.db, event_id).await?;
    check_event_visible(&auth_user, &event)?;

    let data = announcement::Entity::find()
        .filter(announcement::Column::EventId.eq(event_id))
        .order_by_desc(announcement::Column::CreatedAt)
        .order_by_desc(announcement::Column::Id)
        .all(&state.db)
        .await?
        .into_iter()
        .map(AnnouncementResponse::from)
        .collect();

    Ok(Json(data))
}
