use axum::{extract::FromRequestParts, http::request::Parts};
use common::UserRole;

use crate::error::AppError;
use crate::policy::{self, Action, Ownership};
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
/// Role checks happen via `authorize()` / `authorize_owned()` in the handler body.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub role: UserRole,
}

impl AuthUser {
    /// Returns `Ok(())` if the caller's role may perform `action`, `Err(PermissionDenied)` otherwise.
    pub fn authorize(&self, action: Action) -> Result<(), AppError> {
        policy::authorize(self.role, action, Ownership::None)
    }

    /// Like [`authorize`](Self::authorize) for a resource owned by `owner_id`.
    pub fn authorize_owned(&self, action: Action, owner_id: i32) -> Result<(), AppError> {
        policy::authorize(self.role, action, Ownership::of(self.user_id, owner_id))
    }

    /// Non-failing variant of [`authorize_owned`](Self::authorize_owned).
    pub fn can(&self, action: Action, owner_id: i32) -> bool {
        policy::is_allowed(self.role, action, Ownership::of(self.user_id, owner_id))
    }

    /// Whether the caller may perform `action` on resources they do not own.
    pub fn can_any(&self, action: Action) -> bool {
        policy::is_allowed(self.role, action, Ownership::NotOwner)
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            role: claims.role,
        })
    }
}
