//! Role-based authorization.
//!
//! Every guarded operation names an [`Action`]. A single rule table maps each
//! action to the roles that may always perform it and the roles that may
//! perform it only on resources they own. [`authorize`] is the only place the
//! table is consulted.

use common::UserRole;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EventCreate,
    EventUpdate,
    EventDelete,
    /// Read and change other users' registrations for an event.
    EventManageRegistrations,
    /// Create or delete teams, add members on behalf of captains.
    EventManageTeams,
    SeatMapCreate,
    SeatMapDelete,
    BracketManage,
    BracketDelete,
    AnnouncementCreate,
    UserRead,
    /// Change another user's role.
    UserManage,
    AuditRead,
}

/// Whether the caller owns the resource being acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The action does not target an owned resource (e.g. creating one).
    None,
    Owner,
    NotOwner,
}

impl Ownership {
    pub fn of(caller_id: i32, owner_id: i32) -> Self {
        if caller_id == owner_id {
            Self::Owner
        } else {
            Self::NotOwner
        }
    }
}

struct Rule {
    action: Action,
    /// Roles allowed regardless of ownership.
    roles: &'static [UserRole],
    /// Roles allowed only when the caller owns the resource.
    owner_roles: &'static [UserRole],
}

const STAFF: &[UserRole] = &[UserRole::Superadmin, UserRole::Admin];
const CREATORS: &[UserRole] = &[UserRole::Superadmin, UserRole::Admin, UserRole::Organizer];
const SUPERADMIN: &[UserRole] = &[UserRole::Superadmin];
const ORGANIZER: &[UserRole] = &[UserRole::Organizer];

#[rustfmt::skip]
const RULES: &[Rule] = &[
    Rule { action: Action::EventCreate, roles: CREATORS, owner_roles: &[] },
    Rule { action: Action::EventUpdate, roles: STAFF, owner_roles: ORGANIZER },
    Rule { action: Action::EventDelete, roles: SUPERADMIN, owner_roles: &[] },
    Rule { action: Action::EventManageRegistrations, roles: STAFF, owner_roles: ORGANIZER },
    Rule { action: Action::EventManageTeams, roles: STAFF, owner_roles: ORGANIZER },
    Rule { action: Action::SeatMapCreate, roles: CREATORS, owner_roles: &[] },
    Rule { action: Action::SeatMapDelete, roles: SUPERADMIN, owner_roles: &[] },
    Rule { action: Action::BracketManage, roles: STAFF, owner_roles: ORGANIZER },
    Rule { action: Action::BracketDelete, roles: SUPERADMIN, owner_roles: &[] },
    Rule { action: Action::AnnouncementCreate, roles: STAFF, owner_roles: ORGANIZER },
    Rule { action: Action::UserRead, roles: STAFF, owner_roles: &[] },
    Rule { action: Action::UserManage, roles: SUPERADMIN, owner_roles: &[] },
    Rule { action: Action::AuditRead, roles: STAFF, owner_roles: &[] },
];

/// Returns true if `role` may perform `action` given the ownership relation.
pub fn is_allowed(role: UserRole, action: Action, ownership: Ownership) -> bool {
    let Some(rule) = RULES.iter().find(|r| r.action == action) else {
        return false;
    };
    if rule.roles.contains(&role) {
        return true;
    }
    ownership == Ownership::Owner && rule.owner_roles.contains(&role)
}

/// `Ok(())` if allowed, `Err(PermissionDenied)` otherwise.
pub fn authorize(role: UserRole, action: Action, ownership: Ownership) -> Result<(), AppError> {
    if is_allowed(role, action, ownership) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied)
    }
}
