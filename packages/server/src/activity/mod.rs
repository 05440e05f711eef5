//! Best-effort audit and notification sink.
//!
//! Handlers hand records to an [`ActivityRecorder`] after their transaction
//! commits. Records travel over an unbounded channel to a single worker task
//! that persists them. Nothing on this path can fail or block a request.

mod worker;

pub use worker::{persist_activity, run_activity_worker};

use common::{Activity, AuditRecord, NotificationRecord};
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Clone)]
pub struct ActivityRecorder {
    tx: mpsc::UnboundedSender<Activity>,
}

impl ActivityRecorder {
    /// Create a recorder and the receiving end to hand to [`run_activity_worker`].
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Activity>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue an activity. Never fails; a closed channel is logged with the record.
    pub fn record(&self, activity: impl Into<Activity>) {
        let activity = activity.into();
        if let Err(mpsc::error::SendError(lost)) = self.tx.send(activity) {
            warn!(
                topic = %lost.topic(),
                record = %serde_json::to_string(&lost).unwrap_or_default(),
                "Activity worker is gone, dropping record"
            );
        }
    }

    pub fn audit(&self, record: AuditRecord) {
        self.record(record);
    }

    pub fn notify(&self, record: NotificationRecord) {
        self.record(record);
    }
}
