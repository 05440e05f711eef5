use common::{EventStatus, RegistrationStatus};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use crate::entity::{bracket, event, registration, seat_map, team, user};
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::policy::Action;

/// Look up an event by ID, returning 404 if not found.
pub async fn find_event<C: ConnectionTrait>(db: &C, id: i32) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event and hold a row lock on it until the transaction ends.
pub async fn find_event_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Look up an event under a shared row lock. Concurrent readers proceed;
/// writers holding `find_event_for_update` wait.
pub async fn find_event_for_share(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<event::Model, AppError> {
    event::Entity::find_by_id(id)
        .lock(LockType::Share)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".into()))
}

/// Drafts are only visible to those who may edit them. Returns 404 (not 403)
/// for hidden events to prevent enumeration.
pub fn check_event_visible(auth_user: &AuthUser, event: &event::Model) -> Result<(), AppError> {
    if event.status != EventStatus::Draft || auth_user.can(Action::EventUpdate, event.organizer_id)
    {
        return Ok(());
    }
    Err(AppError::NotFound("Event not found".into()))
}

pub async fn find_seat_map<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<seat_map::Model, AppError> {
    seat_map::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Seat map not found".into()))
}

pub async fn find_team<C: ConnectionTrait>(db: &C, id: i32) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

/// Look up a team and hold a row lock on it, serializing roster changes.
pub async fn find_team_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<team::Model, AppError> {
    team::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".into()))
}

pub async fn find_registration<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<registration::Model, AppError> {
    registration::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Registration not found".into()))
}

pub async fn find_bracket<C: ConnectionTrait>(db: &C, id: i32) -> Result<bracket::Model, AppError> {
    bracket::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Bracket not found".into()))
}

pub async fn find_user<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

/// IDs of users holding a PENDING or CONFIRMED registration for the event.
pub async fn active_registrant_ids<C: ConnectionTrait>(
    db: &C,
    event_id: i32,
) -> Result<Vec<i32>, DbErr> {
    registration::Entity::find()
        .select_only()
        .column(registration::Column::UserId)
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
        .into_tuple::<i32>()
        .all(db)
        .await
}
