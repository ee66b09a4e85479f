use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::auth::jwt;
use crate::entities::user;
use crate::error::AppError;
use crate::services::subscription;
use crate::state::AppState;

/// The authenticated caller, either as bare token claims (the common case,
/// no database round trip) or as a fully loaded user row.
#[derive(Debug)]
pub enum Identity {
    Claims(jwt::Claims),
    User(user::Model),
}

impl Identity {
    /// The caller's user ID, regardless of which variant this is.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token subject is not a valid UUID.
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        match self {
            Self::Claims(claims) => claims
                .sub
                .parse()
                .map_err(|_| AppError::Unauthorized("Invalid token subject.".to_string())),
            Self::User(u) => Ok(u.id),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        match self {
            Self::Claims(claims) => &claims.email,
            Self::User(u) => &u.email,
        }
    }
}

/// Authenticated caller extracted from the `Authorization: Bearer <token>` header.
///
/// Validates the access token signature and expiry; does not hit the database.
/// Use as an extractor in handler parameters to require authentication:
/// ```ignore
/// async fn handler(AuthUser(identity): AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header.".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format.".to_string())
        })?;

        let claims = jwt::validate_access_token(token, &state.config.jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

        // Fail early on a malformed subject so handlers never see one
        let identity = Identity::Claims(claims);
        identity.user_id()?;

        Ok(Self(identity))
    }
}

/// Requires the authenticated user to hold an active Pro subscription.
///
/// Authentication always runs first; the entitlement check never executes for
/// an unauthenticated request. The gate already pays a database round trip for
/// the subscription, so it also loads the user row and yields
/// [`Identity::User`]. A token whose account has since been deleted is
/// rejected here rather than surfacing as a foreign-key failure downstream.
#[derive(Debug)]
pub struct ProUser(pub Identity);

impl FromRequestParts<AppState> for ProUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(identity) = AuthUser::from_request_parts(parts, state).await?;
        let user_id = identity.user_id()?;

        let found = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("User account no longer exists.".to_string())
            })?;

        let has_pro = subscription::has_active_subscription(state, user_id).await?;
        if !has_pro {
            return Err(AppError::Forbidden(
                "Pro subscription required. Please upgrade to access this feature.".to_string(),
            ));
        }

        Ok(Self(Identity::User(found)))
    }
}
