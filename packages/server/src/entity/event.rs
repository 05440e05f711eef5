use common::EventStatus;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "event")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String, // in Markdown

    #[sea_orm(indexed)]
    pub organizer_id: i32,
    #[sea_orm(belongs_to, from = "organizer_id", to = "id")]
    pub organizer: HasOne<super::user::Entity>,

    /// NULL for events without assigned seating.
    #[sea_orm(indexed)]
    pub seat_map_id: Option<i32>,
    #[sea_orm(belongs_to, from = "seat_map_id", to = "id")]
    pub seat_map: HasOne<super::seat_map::Entity>,

    pub status: EventStatus,

    pub max_teams: i32,
    pub max_players: i32,
    pub team_size: i32,
    /// Maintained by the team-capacity gate; never exceeds `max_teams`.
    #[sea_orm(default_value = 0)]
    pub team_count: i32,

    pub registration_start: DateTimeUtc,
    pub registration_end: DateTimeUtc,
    pub event_start: DateTimeUtc,
    pub event_end: DateTimeUtc,

    #[sea_orm(has_many)]
    pub registrations: HasMany<super::registration::Entity>,

    #[sea_orm(has_many)]
    pub teams: HasMany<super::team::Entity>,

    #[sea_orm(has_many)]
    pub brackets: HasMany<super::bracket::Entity>,

    #[sea_orm(has_many)]
    pub announcements: HasMany<super::announcement::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
