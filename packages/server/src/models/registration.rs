use chrono::{DateTime, Utc};
use common::RegistrationStatus;
use serde::{Deserialize, Serialize};

use super::shared::Pagination;
use crate::entity::registration;

/// Request body for registering for an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateRegistrationRequest {
    #[schema(example = 3)]
    pub event_id: i32,
    /// Seat to reserve. Must belong to the event's seat map.
    #[schema(example = 17)]
    pub seat_id: Option<i32>,
}

/// Request body for changing a registration's status.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateRegistrationRequest {
    pub status: RegistrationStatus,
}

#[derive(Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RegistrationListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub event_id: Option<i32>,
    pub status: Option<RegistrationStatus>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationResponse {
    pub id: i32,
    pub user_id: i32,
    pub event_id: i32,
    pub seat_id: Option<i32>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<registration::Model> for RegistrationResponse {
    fn from(m: registration::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            event_id: m.event_id,
            seat_id: m.seat_id,
            status: m.status,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegistrationListResponse {
    pub data: Vec<RegistrationResponse>,
    pub pagination: Pagination,
}
