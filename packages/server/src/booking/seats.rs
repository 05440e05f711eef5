use chrono::{DateTime, Utc};
use common::{EventStatus, RegistrationStatus, SeatStatus};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::LockType;
use sea_orm::*;
use tracing::debug;

use crate::entity::{event, registration, seat};
use crate::error::AppError;
use crate::utils::lookup::find_event_for_update;

/// Name of the partial unique index guarding active seat bindings.
pub const ACTIVE_SEAT_INDEX: &str = "uq_registration_active_seat";

/// Result of attempting to claim a registration (and optionally a seat).
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    /// Registration inserted; the seat, if any, is now reserved.
    Committed(registration::Model),
    /// The user already holds a registration for the event.
    AlreadyRegistered,
    /// The seat is reserved, or is not part of the event's seat map.
    AlreadyTaken,
    /// The event has reached `max_players` active registrations.
    CapacityFull,
}

impl ClaimOutcome {
    /// Map non-committed outcomes onto the HTTP error taxonomy.
    pub fn into_result(self) -> Result<registration::Model, AppError> {
        match self {
            ClaimOutcome::Committed(model) => Ok(model),
            ClaimOutcome::AlreadyRegistered => Err(AppError::DuplicateRegistration),
            ClaimOutcome::AlreadyTaken => Err(AppError::SeatUnavailable),
            ClaimOutcome::CapacityFull => Err(AppError::CapacityExceeded(
                "Event has reached its player limit".into(),
            )),
        }
    }
}

/// Whether an event accepts new registrations at `now`.
///
/// `RegistrationOpen` accepts until `registration_end`; `Published` accepts
/// only inside the registration window. Every other status is closed.
pub fn accepts_registrations(event: &event::Model, now: DateTime<Utc>) -> bool {
    match event.status {
        EventStatus::RegistrationOpen => now <= event.registration_end,
        EventStatus::Published => {
            event.registration_start <= now && now <= event.registration_end
        }
        _ => false,
    }
}

/// Registration ledger operations that touch seat inventory.
///
/// Every method runs in a single transaction. The event row is locked for the
/// duration of a claim, and the seat flip is a conditional update, so two
/// concurrent claims on one seat cannot both commit.
pub struct SeatClaimService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SeatClaimService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Register `user_id` for `event_id`, reserving `seat_id` if given.
    ///
    /// Returns `Err` only for a missing event, a closed event, or a database
    /// failure. Contention is reported through [`ClaimOutcome`].
    pub async fn claim(
        &self,
        user_id: i32,
        event_id: i32,
        seat_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> Result<ClaimOutcome, AppError> {
        let txn = self.db.begin().await?;
        let event = find_event_for_update(&txn, event_id).await?;

        if !accepts_registrations(&event, now) {
            return Err(AppError::RegistrationClosed);
        }

        let existing = registration::Entity::find()
            .filter(registration::Column::UserId.eq(user_id))
            .filter(registration::Column::EventId.eq(event_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Ok(ClaimOutcome::AlreadyRegistered);
        }

        let active = registration::Entity::find()
            .filter(registration::Column::EventId.eq(event_id))
            .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
            .count(&txn)
            .await?;
        if active >= std::cmp::Ord::max(event.max_players, 0) as u64 {
            return Ok(ClaimOutcome::CapacityFull);
        }

        if let Some(seat_id) = seat_id {
            let Some(seat_map_id) = event.seat_map_id else {
                return Ok(ClaimOutcome::AlreadyTaken);
            };
            if !reserve_seat(&txn, seat_id, seat_map_id).await? {
                debug!(seat_id, event_id, "Seat claim lost");
                return Ok(ClaimOutcome::AlreadyTaken);
            }
        }

        let new_registration = registration::ActiveModel {
            user_id: Set(user_id),
            event_id: Set(event_id),
            seat_id: Set(seat_id),
            status: Set(RegistrationStatus::Pending),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        match new_registration.insert(&txn).await {
            Ok(model) => {
                txn.commit().await?;
                Ok(ClaimOutcome::Committed(model))
            }
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail))
                    if detail.contains(ACTIVE_SEAT_INDEX) =>
                {
                    Ok(ClaimOutcome::AlreadyTaken)
                }
                Some(SqlErr::UniqueConstraintViolation(_)) => Ok(ClaimOutcome::AlreadyRegistered),
                _ => Err(e.into()),
            },
        }
    }

    /// Move a registration to `next`, releasing its seat when the new status
    /// no longer holds one.
    pub async fn transition(
        &self,
        registration_id: i32,
        next: RegistrationStatus,
        now: DateTime<Utc>,
    ) -> Result<(registration::Model, registration::Model), AppError> {
        let txn = self.db.begin().await?;

        let before = registration::Entity::find_by_id(registration_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Registration not found".into()))?;

        if !before.status.can_transition_to(next) {
            return Err(AppError::Validation(format!(
                "Cannot change registration status from {} to {}",
                before.status, next
            )));
        }

        if before.status.is_active()
            && !next.is_active()
            && let Some(seat_id) = before.seat_id
        {
            release_seat(&txn, seat_id).await?;
        }

        let mut active: registration::ActiveModel = before.clone().into();
        active.status = Set(next);
        active.updated_at = Set(now);
        let after = active.update(&txn).await?;

        txn.commit().await?;
        Ok((before, after))
    }
}

/// Flip a seat from AVAILABLE to RESERVED. Returns false if the seat does not
/// exist in `seat_map_id` or is already reserved.
pub async fn reserve_seat<C: ConnectionTrait>(
    conn: &C,
    seat_id: i32,
    seat_map_id: i32,
) -> Result<bool, DbErr> {
    let result = seat::Entity::update_many()
        .col_expr(seat::Column::Status, Expr::value(SeatStatus::Reserved))
        .filter(seat::Column::Id.eq(seat_id))
        .filter(seat::Column::SeatMapId.eq(seat_map_id))
        .filter(seat::Column::Status.eq(SeatStatus::Available))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Return a reserved seat to AVAILABLE.
pub async fn release_seat<C: ConnectionTrait>(conn: &C, seat_id: i32) -> Result<(), DbErr> {
    seat::Entity::update_many()
        .col_expr(seat::Column::Status, Expr::value(SeatStatus::Available))
        .filter(seat::Column::Id.eq(seat_id))
        .filter(seat::Column::Status.eq(SeatStatus::Reserved))
        .exec(conn)
        .await?;
    Ok(())
}
