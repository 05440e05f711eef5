#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a tournament event.
///
/// The happy path is strictly linear:
/// `Draft -> Published -> RegistrationOpen -> RegistrationClosed -> InProgress -> Completed`.
/// Any non-terminal status may move to `Cancelled`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventStatus {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "DRAFT"))]
    Draft,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PUBLISHED"))]
    Published,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REGISTRATION_OPEN"))]
    RegistrationOpen,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "REGISTRATION_CLOSED"))]
    RegistrationClosed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "IN_PROGRESS"))]
    InProgress,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "COMPLETED"))]
    Completed,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "CANCELLED"))]
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Published => "PUBLISHED",
            Self::RegistrationOpen => "REGISTRATION_OPEN",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if an event may move from `self` to `next`.
    /// Staying in the same status is always allowed.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        if *self == next {
            return true;
        }
        if next == Self::Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (Self::Draft, Self::Published)
                | (Self::Published, Self::RegistrationOpen)
                | (Self::RegistrationOpen, Self::RegistrationClosed)
                | (Self::RegistrationClosed, Self::InProgress)
                | (Self::InProgress, Self::Completed)
        )
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        Self::Draft
    }
}
