use common::{MemberStatus, TeamRole};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `(event_id, user_id)` is unique so a user sits on at most one team per
/// event; see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "team_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub team_id: i32,
    #[sea_orm(primary_key)]
    pub user_id: i32,
    #[sea_orm(belongs_to, from = "team_id", to = "id")]
    pub team: HasOne<super::team::Entity>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: HasOne<super::user::Entity>,

    /// Copied from the team so the one-team-per-event rule can be a unique index.
    #[sea_orm(indexed)]
    pub event_id: i32,

    pub role: TeamRole,
    pub status: MemberStatus,

    pub joined_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
