use common::Activity;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, Set};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::entity::{audit_log, notification};

/// Drain the activity channel until every sender is dropped.
///
/// Each record is written on its own; a failed write is logged in full and
/// the worker moves on.
pub async fn run_activity_worker(db: DatabaseConnection, mut rx: mpsc::UnboundedReceiver<Activity>) {
    info!("Starting activity worker");

    while let Some(activity) = rx.recv().await {
        let topic = activity.topic().to_string();
        match persist_activity(&db, &activity).await {
            Ok(()) => debug!(topic = %topic, "Activity persisted"),
            Err(e) => error!(
                topic = %topic,
                error = %e,
                record = %serde_json::to_string(&activity).unwrap_or_default(),
                "Failed to persist activity"
            ),
        }
    }

    info!("Activity worker stopped");
}

/// Write one activity record.
pub async fn persist_activity<C: ConnectionTrait>(conn: &C, activity: &Activity) -> Result<(), DbErr> {
    match activity {
        Activity::Audit(record) => {
            audit_log::ActiveModel {
                actor_id: Set(record.actor_id),
                action: Set(record.action.clone()),
                entity: Set(record.entity.clone()),
                entity_id: Set(record.entity_id),
                before: Set(record.before.clone()),
                after: Set(record.after.clone()),
                created_at: Set(record.at),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
        Activity::Notification(record) => {
            notification::ActiveModel {
                user_id: Set(record.user_id),
                topic: Set(record.topic.clone()),
                message: Set(record.message.clone()),
                entity: Set(record.entity.clone()),
                entity_id: Set(record.entity_id),
                read: Set(false),
                created_at: Set(record.at),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }
    }
    Ok(())
}
