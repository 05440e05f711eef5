#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a user account. Exactly one role is held at a time.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    /// Regular participant. Assigned on self-registration.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "PLAYER"))]
    Player,
    /// Creates and runs their own events.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ORGANIZER"))]
    Organizer,
    /// Manages every event, cannot perform destructive deletes.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "ADMIN"))]
    Admin,
    /// Unrestricted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "SUPERADMIN"))]
    Superadmin,
}

impl UserRole {
    /// The role assigned to newly registered users.
    pub const DEFAULT: UserRole = UserRole::Player;

    pub const ALL: &'static [UserRole] = &[
        Self::Player,
        Self::Organizer,
        Self::Admin,
        Self::Superadmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Player => "PLAYER",
            Self::Organizer => "ORGANIZER",
            Self::Admin => "ADMIN",
            Self::Superadmin => "SUPERADMIN",
        }
    }

    /// Admins and superadmins manage every event regardless of ownership.
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Error when parsing an invalid role string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid role '{invalid}'. Valid values: PLAYER, ORGANIZER, ADMIN, SUPERADMIN")]
pub struct ParseRoleError {
    invalid: String,
}

impl FromStr for UserRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PLAYER" => Ok(Self::Player),
            "ORGANIZER" => Ok(Self::Organizer),
            "ADMIN" => Ok(Self::Admin),
            "SUPERADMIN" => Ok(Self::Superadmin),
            _ => Err(ParseRoleError {
                invalid: s.to_string(),
            }),
        }
    }
}
