use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only. Written only by the activity worker.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "audit_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// NULL for system-initiated changes.
    #[sea_orm(indexed)]
    pub actor_id: Option<i32>,

    #[sea_orm(indexed)]
    pub action: String,
    #[sea_orm(indexed)]
    pub entity: String,
    pub entity_id: Option<i32>,

    #[sea_orm(column_type = "JsonBinary")]
    pub before: Option<serde_json::Value>,
    #[sea_orm(column_type = "JsonBinary")]
    pub after: Option<serde_json::Value>,

    #[sea_orm(indexed)]
    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
