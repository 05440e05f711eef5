use common::{SeatStatus, SeatType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One addressable seat. `(seat_map_id, row, col)` is unique; see `seed::ensure_indexes`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "seat")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub seat_map_id: i32,
    #[sea_orm(belongs_to, from = "seat_map_id", to = "id")]
    pub seat_map: HasOne<super::seat_map::Entity>,

    /// 0-based.
    pub row: i32,
    /// 0-based.
    pub col: i32,
    pub label: String,
    pub seat_type: SeatType,
    pub status: SeatStatus,
}

impl ActiveModelBehavior for ActiveModel {}
