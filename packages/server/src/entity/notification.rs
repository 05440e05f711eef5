use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Written only by the activity worker.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(indexed)]
    pub user_id: i32,

    pub topic: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub entity: Option<String>,
    pub entity_id: Option<i32>,

    #[sea_orm(default_value = false)]
    pub read: bool,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
