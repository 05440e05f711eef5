use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{SeatStatus, SeatType};
use serde::{Deserialize, Serialize};

use super::shared::{Pagination, validate_name};
use crate::entity::{seat, seat_map};
use crate::error::AppError;

pub const MAX_DIMENSION: i32 = 100;

/// A grid position, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, utoipa::ToSchema)]
pub struct SeatPosition {
    pub row: i32,
    pub col: i32,
}

/// Request body for creating a seat map.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSeatMapRequest {
    #[schema(example = "Main Hall")]
    pub name: String,
    /// Number of columns (1-100).
    #[schema(example = 10)]
    pub width: i32,
    /// Number of rows (1-100).
    #[schema(example = 8)]
    pub height: i32,
    /// Positions to mark as VIP. All other seats are REGULAR.
    #[serde(default)]
    pub vip_seats: Vec<SeatPosition>,
}

pub fn validate_create_seat_map(req: &CreateSeatMapRequest) -> Result<(), AppError> {
    validate_name(&req.name, "Name", 128)?;
    if !(1..=MAX_DIMENSION).contains(&req.width) || !(1..=MAX_DIMENSION).contains(&req.height) {
        return Err(AppError::Validation(format!(
            "width and height must be 1-{MAX_DIMENSION}"
        )));
    }
    let mut seen = HashSet::new();
    for pos in &req.vip_seats {
        if !(0..req.height).contains(&pos.row) || !(0..req.width).contains(&pos.col) {
            return Err(AppError::Validation(format!(
                "VIP seat ({}, {}) is outside the grid",
                pos.row, pos.col
            )));
        }
        if !seen.insert(*pos) {
            return Err(AppError::Validation(format!(
                "Duplicate VIP seat ({}, {})",
                pos.row, pos.col
            )));
        }
    }
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SeatResponse {
    pub id: i32,
    pub row: i32,
    pub col: i32,
    #[schema(example = "B7")]
    pub label: String,
    pub seat_type: SeatType,
    pub status: SeatStatus,
}

impl From<seat::Model> for SeatResponse {
    fn from(m: seat::Model) -> Self {
        Self {
            id: m.id,
            row: m.row,
            col: m.col,
            label: m.label,
            seat_type: m.seat_type,
            status: m.status,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SeatMapResponse {
    pub id: i32,
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
}

impl From<seat_map::Model> for SeatMapResponse {
    fn from(m: seat_map::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            width: m.width,
            height: m.height,
            created_by: m.created_by,
            created_at: m.created_at,
        }
    }
}

/// Seat map with its full seat grid, ordered by row then column.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SeatMapDetailResponse {
    #[serde(flatten)]
    pub seat_map: SeatMapResponse,
    pub seats: Vec<SeatResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SeatMapListResponse {
    pub data: Vec<SeatMapResponse>,
    pub pagination: Pagination,
}

/// Seats of an event's map, plus availability counts.
#[derive(Serialize, utoipa::ToSchema)]
pub struct EventSeatsResponse {
    pub event_id: i32,
    pub seat_map_id: i32,
    pub available: u64,
    pub reserved: u64,
    pub seats: Vec<SeatResponse>,
}
