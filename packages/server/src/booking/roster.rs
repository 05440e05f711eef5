use std::collections::HashMap;

use chrono::{DateTime, Utc};
use common::{MemberStatus, RegistrationStatus, TeamRole};
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::debug;

use crate::entity::{event, registration, team, team_member};
use crate::error::AppError;
use crate::utils::lookup::{find_event_for_share, find_event_for_update, find_team_for_update};

/// Result of passing a team through the event capacity gate.
#[derive(Debug, Clone, PartialEq)]
pub enum TeamGateOutcome {
    /// Team and captain row inserted; `team_count` incremented.
    Created(team::Model, team_member::Model),
    /// Another team in the event already uses this name.
    NameTaken,
    /// `team_count` already equals `max_teams`.
    CapacityFull,
    /// The creator already sits on a team in this event.
    AlreadyOnTeam,
}

impl TeamGateOutcome {
    pub fn into_result(self) -> Result<(team::Model, team_member::Model), AppError> {
        match self {
            TeamGateOutcome::Created(team, captain) => Ok((team, captain)),
            TeamGateOutcome::NameTaken => Err(AppError::DuplicateTeamName),
            TeamGateOutcome::CapacityFull => Err(AppError::CapacityExceeded(
                "Event has reached its team limit".into(),
            )),
            TeamGateOutcome::AlreadyOnTeam => Err(already_on_team()),
        }
    }
}

fn already_on_team() -> AppError {
    AppError::Conflict("User is already on a team for this event".into())
}

/// Rosters freeze once the event is completed or cancelled.
fn ensure_rosters_open(event: &event::Model) -> Result<(), AppError> {
    if event.status.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Teams cannot change once the event is {}",
            event.status
        )));
    }
    Ok(())
}

/// Increment `team_count` only while it is below `max_teams`.
///
/// Returns false when the ceiling is reached or the event does not exist.
pub async fn take_team_slot<C: ConnectionTrait>(conn: &C, event_id: i32) -> Result<bool, DbErr> {
    let result = event::Entity::update_many()
        .col_expr(
            event::Column::TeamCount,
            Expr::col(event::Column::TeamCount).add(1),
        )
        .filter(event::Column::Id.eq(event_id))
        .filter(Expr::col(event::Column::TeamCount).lt(Expr::col(event::Column::MaxTeams)))
        .exec(conn)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Give a slot back when a team is deleted. Never goes below zero.
pub async fn release_team_slot<C: ConnectionTrait>(conn: &C, event_id: i32) -> Result<(), DbErr> {
    event::Entity::update_many()
        .col_expr(
            event::Column::TeamCount,
            Expr::col(event::Column::TeamCount).sub(1),
        )
        .filter(event::Column::Id.eq(event_id))
        .filter(event::Column::TeamCount.gt(0))
        .exec(conn)
        .await?;
    Ok(())
}

/// Whether `user_id` holds a PENDING or CONFIRMED registration for the event.
pub async fn has_active_registration<C: ConnectionTrait>(
    conn: &C,
    user_id: i32,
    event_id: i32,
) -> Result<bool, DbErr> {
    let count = registration::Entity::find()
        .filter(registration::Column::UserId.eq(user_id))
        .filter(registration::Column::EventId.eq(event_id))
        .filter(registration::Column::Status.is_in(RegistrationStatus::ACTIVE.iter().copied()))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Size of the biggest roster in the event, or 0 when it has no teams.
pub async fn largest_roster<C: ConnectionTrait>(conn: &C, event_id: i32) -> Result<u64, DbErr> {
    let team_ids: Vec<i32> = team_member::Entity::find()
        .select_only()
        .column(team_member::Column::TeamId)
        .filter(team_member::Column::EventId.eq(event_id))
        .into_tuple::<i32>()
        .all(conn)
        .await?;
    let mut sizes: HashMap<i32, u64> = HashMap::new();
    for id in team_ids {
        *sizes.entry(id).or_default() += 1;
    }
    Ok(sizes.into_values().max().unwrap_or(0))
}

async fn find_member<C: ConnectionTrait>(
    conn: &C,
    team_id: i32,
    user_id: i32,
) -> Result<Option<team_member::Model>, DbErr> {
    team_member::Entity::find_by_id((team_id, user_id)).one(conn).await
}

async fn is_captain<C: ConnectionTrait>(
    conn: &C,
    team_id: i32,
    user_id: i32,
) -> Result<bool, DbErr> {
    Ok(find_member(conn, team_id, user_id)
        .await?
        .is_some_and(|m| m.role == TeamRole::Captain))
}

async fn set_role<C: ConnectionTrait>(
    conn: &C,
    team_id: i32,
    user_id: i32,
    role: TeamRole,
) -> Result<(), DbErr> {
    team_member::Entity::update_many()
        .col_expr(team_member::Column::Role, Expr::value(role))
        .filter(team_member::Column::TeamId.eq(team_id))
        .filter(team_member::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

/// Team roster operations.
///
/// Mutations lock the team row first, so roster size checks and captaincy
/// changes on one team are serialized.
pub struct RosterService<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> RosterService<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a team with `creator_id` as its captain.
    ///
    /// The name check, the capacity gate, and both inserts share one
    /// transaction under the event row lock; any non-created outcome rolls
    /// the counter back.
    pub async fn create_team(
        &self,
        creator_id: i32,
        event_id: i32,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<TeamGateOutcome, AppError> {
        let txn = self.db.begin().await?;
        let event = find_event_for_update(&txn, event_id).await?;
        ensure_rosters_open(&event)?;

        let name_taken = team::Entity::find()
            .filter(team::Column::EventId.eq(event_id))
            .filter(team::Column::Name.eq(name))
            .count(&txn)
            .await?
            > 0;
        if name_taken {
            return Ok(TeamGateOutcome::NameTaken);
        }

        if !take_team_slot(&txn, event_id).await? {
            debug!(event_id, "Team capacity gate closed");
            return Ok(TeamGateOutcome::CapacityFull);
        }

        let new_team = team::ActiveModel {
            event_id: Set(event_id),
            name: Set(name.to_string()),
            creator_id: Set(creator_id),
            created_at: Set(now),
            ..Default::default()
        };
        let team = match new_team.insert(&txn).await {
            Ok(team) => team,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(TeamGateOutcome::NameTaken);
            }
            Err(e) => return Err(e.into()),
        };

        let captain = team_member::ActiveModel {
            team_id: Set(team.id),
            user_id: Set(creator_id),
            event_id: Set(event_id),
            role: Set(TeamRole::Captain),
            status: Set(MemberStatus::Active),
            joined_at: Set(now),
        };
        let captain = match captain.insert(&txn).await {
            Ok(captain) => captain,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Ok(TeamGateOutcome::AlreadyOnTeam);
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;
        Ok(TeamGateOutcome::Created(team, captain))
    }

    /// Add `user_id` to the roster.
    ///
    /// When `actor_id != user_id` the actor must be the team captain or an
    /// event manager (`is_manager`). The roster size is checked against the
    /// event's `team_size` on every path.
    pub async fn add_member(
        &self,
        team_id: i32,
        actor_id: i32,
        user_id: i32,
        is_manager: bool,
        now: DateTime<Utc>,
    ) -> Result<team_member::Model, AppError> {
        let txn = self.db.begin().await?;
        let team = find_team_for_update(&txn, team_id).await?;

        if actor_id != user_id && !is_manager && !is_captain(&txn, team_id, actor_id).await? {
            return Err(AppError::PermissionDenied);
        }

        // Shared lock: an event update shrinking team_size waits for us.
        let event = find_event_for_share(&txn, team.event_id).await?;
        ensure_rosters_open(&event)?;
        if !has_active_registration(&txn, user_id, event.id).await? {
            return Err(AppError::Validation(
                "User is not registered for this event".into(),
            ));
        }

        let size = team_member::Entity::find()
            .filter(team_member::Column::TeamId.eq(team_id))
            .count(&txn)
            .await?;
        if size >= std::cmp::Ord::max(event.team_size, 0) as u64 {
            return Err(AppError::CapacityExceeded("Team is full".into()));
        }

        let member = team_member::ActiveModel {
            team_id: Set(team_id),
            user_id: Set(user_id),
            event_id: Set(event.id),
            role: Set(TeamRole::Member),
            status: Set(MemberStatus::Active),
            joined_at: Set(now),
        };
        let member = match member.insert(&txn).await {
            Ok(member) => member,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(already_on_team());
            }
            Err(e) => return Err(e.into()),
        };

        txn.commit().await?;
        Ok(member)
    }

    /// Change a member's role. Only the captain may do this.
    ///
    /// Promoting someone to captain demotes the current captain to
    /// co-captain, so the team always has exactly one captain.
    pub async fn change_role(
        &self,
        team_id: i32,
        actor_id: i32,
        user_id: i32,
        role: TeamRole,
    ) -> Result<(team_member::Model, team_member::Model), AppError> {
        let txn = self.db.begin().await?;
        find_team_for_update(&txn, team_id).await?;

        if !is_captain(&txn, team_id, actor_id).await? {
            return Err(AppError::PermissionDenied);
        }

        let before = find_member(&txn, team_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team member not found".into()))?;

        if user_id == actor_id {
            if role != TeamRole::Captain {
                return Err(AppError::Validation(
                    "Captain must transfer captaincy before changing their own role".into(),
                ));
            }
            return Ok((before.clone(), before));
        }

        if role == TeamRole::Captain {
            set_role(&txn, team_id, actor_id, TeamRole::CoCaptain).await?;
        }
        set_role(&txn, team_id, user_id, role).await?;

        let after = find_member(&txn, team_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team member not found".into()))?;

        txn.commit().await?;
        Ok((before, after))
    }

    /// Remove `user_id` from the roster.
    ///
    /// Members may remove themselves; the captain and event managers may
    /// remove anyone except the team creator.
    pub async fn remove_member(
        &self,
        team_id: i32,
        actor_id: i32,
        user_id: i32,
        is_manager: bool,
    ) -> Result<team_member::Model, AppError> {
        let txn = self.db.begin().await?;
        let team = find_team_for_update(&txn, team_id).await?;

        let member = find_member(&txn, team_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Team member not found".into()))?;

        if user_id == team.creator_id {
            return Err(AppError::Conflict(
                "The team creator cannot be removed".into(),
            ));
        }

        if actor_id != user_id && !is_manager && !is_captain(&txn, team_id, actor_id).await? {
            return Err(AppError::PermissionDenied);
        }

        team_member::Entity::delete_by_id((team_id, user_id))
            .exec(&txn)
            .await?;

        if member.role == TeamRole::Captain {
            set_role(&txn, team_id, team.creator_id, TeamRole::Captain).await?;
        }

        txn.commit().await?;
        Ok(member)
    }

    /// Delete a team and its roster, returning its slot to the event.
    ///
    /// Allowed for the creator, the current captain, and event managers.
    pub async fn delete_team(
        &self,
        team_id: i32,
        actor_id: i32,
        is_manager: bool,
    ) -> Result<team::Model, AppError> {
        let txn = self.db.begin().await?;
        let team = find_team_for_update(&txn, team_id).await?;

        if actor_id != team.creator_id
            && !is_manager
            && !is_captain(&txn, team_id, actor_id).await?
        {
            return Err(AppError::PermissionDenied);
        }

        team_member::Entity::delete_many()
            .filter(team_member::Column::TeamId.eq(team_id))
            .exec(&txn)
            .await?;
        team::Entity::delete_by_id(team_id).exec(&txn).await?;
        release_team_slot(&txn, team.event_id).await?;

        txn.commit().await?;
        Ok(team)
    }
}
