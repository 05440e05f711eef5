use chrono::{DateTime, Utc};
use common::EventStatus;
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_title};
use crate::entity::event;
use crate::error::AppError;

/// Request body for creating an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateEventRequest {
    /// Event title (1-256 characters).
    #[schema(example = "Spring LAN Open")]
    pub title: String,
    /// Event description in Markdown.
    #[serde(default)]
    pub description: String,
    /// Seat map to assign seats from. Omit for unseated events.
    pub seat_map_id: Option<i32>,
    /// Initial status: DRAFT (default), PUBLISHED, or REGISTRATION_OPEN.
    pub status: Option<EventStatus>,
    #[schema(example = 16)]
    pub max_teams: i32,
    #[schema(example = 80)]
    pub max_players: i32,
    #[schema(example = 5)]
    pub team_size: i32,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
}

/// Request body for replacing an event's editable fields.
///
/// `status`, when given, must be a legal transition from the current status.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub seat_map_id: Option<i32>,
    pub status: Option<EventStatus>,
    pub max_teams: i32,
    pub max_players: i32,
    pub team_size: i32,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
}

/// Query parameters for listing events.
#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Case-insensitive title search.
    pub search: Option<String>,
    pub status: Option<EventStatus>,
    /// One of `created_at` (default), `event_start`, `title`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub organizer_id: i32,
    pub seat_map_id: Option<i32>,
    pub status: EventStatus,
    pub max_teams: i32,
    pub max_players: i32,
    pub team_size: i32,
    /// Teams created so far; never exceeds `max_teams`.
    pub team_count: i32,
    pub registration_start: DateTime<Utc>,
    pub registration_end: DateTime<Utc>,
    pub event_start: DateTime<Utc>,
    pub event_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<event::Model> for EventResponse {
    fn from(m: event::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            organizer_id: m.organizer_id,
            seat_map_id: m.seat_map_id,
            status: m.status,
            max_teams: m.max_teams,
            max_players: m.max_players,
            team_size: m.team_size,
            team_count: m.team_count,
            registration_start: m.registration_start,
            registration_end: m.registration_end,
            event_start: m.event_start,
            event_end: m.event_end,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventResponse>,
    pub pagination: Pagination,
}

/// Statuses an event may be created in.
pub const INITIAL_STATUSES: &[EventStatus] = &[
    EventStatus::Draft,
    EventStatus::Published,
    EventStatus::RegistrationOpen,
];

struct EventFields<'a> {
    title: &'a str,
    description: &'a str,
    max_teams: i32,
    max_players: i32,
    team_size: i32,
    registration_start: DateTime<Utc>,
    registration_end: DateTime<Utc>,
    event_start: DateTime<Utc>,
    event_end: DateTime<Utc>,
}

fn validate_event_fields(f: EventFields<'_>) -> Result<(), AppError> {
    validate_title(f.title)?;
    if f.description.len() > 1_000_000 {
        return Err(AppError::Validation(
            "Description must be at most 1MB".into(),
        ));
    }
    if f.max_teams < 1 || f.max_players < 1 {
        return Err(AppError::Validation(
            "max_teams and max_players must be positive".into(),
        ));
    }
    if f.team_size < 1 {
        return Err(AppError::Validation("team_size must be at least 1".into()));
    }
    if f.registration_end < f.registration_start {
        return Err(AppError::Validation(
            "registration_end must not be before registration_start".into(),
        ));
    }
    if f.event_end < f.event_start {
        return Err(AppError::Validation(
            "event_end must not be before event_start".into(),
        ));
    }
    Ok(())
}

pub fn validate_create_event(req: &CreateEventRequest) -> Result<(), AppError> {
    if let Some(status) = req.status
        && !INITIAL_STATUSES.contains(&status)
    {
        return Err(AppError::Validation(format!(
            "Events cannot be created in status {status}"
        )));
    }
    validate_event_fields(EventFields {
        title: &req.title,
        description: &req.description,
        max_teams: req.max_teams,
        max_players: req.max_players,
        team_size: req.team_size,
        registration_start: req.registration_start,
        registration_end: req.registration_end,
        event_start: req.event_start,
        event_end: req.event_end,
    })
}

/// Validate an update against the stored event.
pub fn validate_update_event(
    req: &UpdateEventRequest,
    current: &event::Model,
) -> Result<(), AppError> {
    validate_event_fields(EventFields {
        title: &req.title,
        description: &req.description,
        max_teams: req.max_teams,
        max_players: req.max_players,
        team_size: req.team_size,
        registration_start: req.registration_start,
        registration_end: req.registration_end,
        event_start: req.event_start,
        event_end: req.event_end,
    })?;
    if req.max_teams < current.team_count {
        return Err(AppError::Validation(format!(
            "max_teams cannot be lower than the {} teams already created",
            current.team_count
        )));
    }
    if let Some(next) = req.status
        && !current.status.can_transition_to(next)
    {
        return Err(AppError::Validation(format!(
            "Cannot change event status from {} to {}",
            current.status, next
        )));
    }
    Ok(())
}
