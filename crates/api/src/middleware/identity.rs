//! Caller identity extractor.
//!
//! Authentication is delegated to the gateway in front of this service; it
//! forwards the verified identity in `x-user-id` / `x-user-role` headers.
//! Handlers that mutate data call [`ActingUser::require_admin`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use keelson_core::types::DbId;

use crate::error::AppError;

/// Caller role as forwarded by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Crew,
}

impl Role {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("admin") {
            Self::Admin
        } else {
            Self::Crew
        }
    }
}

/// The identity acting on a request. Anonymous requests (no headers) are
/// treated as crew with no user id.
#[derive(Debug, Clone, Copy)]
pub struct ActingUser {
    pub user_id: Option<DbId>,
    pub role: Role,
}

impl ActingUser {
    /// Reject non-admin callers.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "This operation requires the admin role".to_string(),
            ))
        }
    }
}

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = match parts.headers.get("x-user-id") {
            Some(value) => {
                let s = value
                    .to_str()
                    .map_err(|_| AppError::BadRequest("Invalid x-user-id header".to_string()))?;
                Some(
                    s.parse::<DbId>()
                        .map_err(|_| AppError::BadRequest("x-user-id must be a UUID".to_string()))?,
                )
            }
            None => None,
        };

        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(Role::parse)
            .unwrap_or(Role::Crew);

        Ok(Self { user_id, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_role_defaults_to_crew() {
        assert_eq!(Role::parse("superuser"), Role::Crew);
    }

    #[test]
    fn admin_role_case_insensitive() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
    }

    #[test]
    fn crew_cannot_pass_admin_gate() {
        let user = ActingUser {
            user_id: None,
            role: Role::Crew,
        };
        assert!(user.require_admin().is_err());
    }

    #[test]
    fn admin_passes_admin_gate() {
        let user = ActingUser {
            user_id: None,
            role: Role::Admin,
        };
        assert!(user.require_admin().is_ok());
    }
}
