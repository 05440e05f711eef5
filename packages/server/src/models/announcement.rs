use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validate_title;
use crate::entity::announcement;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateAnnouncementRequest {
    #[schema(example = "Doors open at 9:00")]
    pub title: String,
    /// Body in Markdown.
    pub body: String,
}

pub fn validate_create_announcement(req: &CreateAnnouncementRequest) -> Result<(), AppError> {
    validate_title(&req.title)?;
    if req.body.trim().is_empty() || req.body.len() > 100_000 {
        return Err(AppError::Validation(
            "Body must be non-empty and at most 100KB".into(),
        ));
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AnnouncementResponse {
    pub id: i32,
    pub event_id: i32,
    pub author_id: i32,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<announcement::Model> for AnnouncementResponse {
    fn from(m: announcement::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            author_id: m.author_id,
            title: m.title,
            body: m.body,
            created_at: m.created_at,
        }
    }
}
