use chrono::{DateTime, Utc};
use common::{BracketFormat, BracketStatus};
use serde::{Deserialize, Serialize};

use super::shared::validate_name;
use crate::entity::bracket;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateBracketRequest {
    pub event_id: i32,
    #[schema(example = "Upper Bracket")]
    pub name: String,
    pub format: BracketFormat,
}

pub fn validate_create_bracket(req: &CreateBracketRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Bracket name", 128)
}

#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdateBracketRequest {
    pub name: Option<String>,
    pub status: Option<BracketStatus>,
}

pub fn validate_update_bracket(
    req: &UpdateBracketRequest,
    current: BracketStatus,
) -> Result<(), AppError> {
    if *req == UpdateBracketRequest::default() {
        return Err(AppError::Validation("Nothing to update".into()));
    }
    if let Some(ref name) = req.name {
        validate_name(name, "Bracket name", 128)?;
    }
    if let Some(next) = req.status
        && !current.can_transition_to(next)
    {
        return Err(AppError::Validation(format!(
            "Cannot change bracket status from {current} to {next}"
        )));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BracketListQuery {
    pub event_id: Option<i32>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BracketResponse {
    pub id: i32,
    pub event_id: i32,
    pub name: String,
    pub format: BracketFormat,
    pub status: BracketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<bracket::Model> for BracketResponse {
    fn from(m: bracket::Model) -> Self {
        Self {
            id: m.id,
            event_id: m.event_id,
            name: m.name,
            format: m.format,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
