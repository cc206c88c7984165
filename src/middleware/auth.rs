use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use coursemart_auth::{Claims, verify_token};
use coursemart_core::AppError;
use coursemart_delivery::{Identity, resolve_identity};
use coursemart_models::UserId;

use crate::state::AppState;

/// Extractor that validates the bearer JWT and provides its claims.
///
/// This only proves the token is genuine. Use [`CurrentIdentity`] wherever the
/// account must still exist and be active.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.0.user_id().map(UserId::from)
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
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::unauthorized("Invalid authorization header format"))?;

        let claims = verify_token(token, &state.jwt_config)?;

        Ok(AuthUser(claims))
    }
}

/// The caller resolved against the user directory.
///
/// Role and active flag come from the directory, not from the token, so a
/// demoted or deactivated account loses access on its next request.
#[derive(Debug, Clone, Copy)]
pub struct CurrentIdentity(pub Identity);

impl FromRequestParts<AppState> for CurrentIdentity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_user = AuthUser::from_request_parts(parts, state).await?;
        let identity = resolve_identity(state.identities.as_ref(), auth_user.user_id()?).await?;

        Ok(CurrentIdentity(identity))
    }
}
