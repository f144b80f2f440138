use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use std::convert::Infallible;
use tracing::warn;
use uuid::Uuid;

use crate::auth::jwt::JwtKeys;
use crate::error::ApiError;
use crate::models::Role;
use crate::state::AppState;
use crate::store::Store;

/// Identity attached to a request once the token and the account behind it
/// both check out.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Bearer token from the Authorization header, or the x-auth-token fallback
/// header. A bare token without the `Bearer ` prefix is accepted.
fn extract_token(parts: &Parts) -> Option<&str> {
    if let Some(value) = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        return Some(value.strip_prefix("Bearer ").unwrap_or(value));
    }
    parts.headers.get("x-auth-token").and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)
            .ok_or_else(|| ApiError::unauthorized("No token, authorization denied"))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(error = %e, "token verification failed");
            ApiError::unauthorized("Token is not valid")
        })?;

        // Deactivation must take effect immediately, so the account is
        // re-checked on every request even for unexpired tokens.
        let user = state
            .store
            .find_user_by_id(claims.sub)
            .await
            .map_err(|e| ApiError::internal("Server error in authentication", e))?;

        match user {
            Some(user) if user.is_active => Ok(AuthUser {
                id: claims.sub,
                email: claims.email,
                role: claims.role,
            }),
            _ => Err(ApiError::unauthorized(
                "Token is not valid or user is deactivated",
            )),
        }
    }
}

/// Non-failing variant: any missing or bad credential leaves the request
/// anonymous instead of rejecting it.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthUser>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(AuthUser::from_request_parts(parts, state).await.ok()))
    }
}

/// Role gate, layered after authentication. `None` means no identity was
/// established at all.
pub fn authorize(user: Option<&AuthUser>, roles: &[Role]) -> Result<(), ApiError> {
    let user = user.ok_or_else(|| ApiError::unauthorized("Not authorized"))?;
    if !roles.contains(&user.role) {
        return Err(ApiError::forbidden(format!(
            "User role '{}' is not authorized to access this route",
            user.role
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::models::NewUser;
    use axum::http::Request;

    async fn state_with_user(active: bool) -> (AppState, crate::models::User, String) {
        let state = AppState::fake();
        let user = state
            .store
            .create_user(NewUser {
                name: "Asha".into(),
                email: "asha@example.com".into(),
                password_hash: hash_password("secret123").unwrap(),
                role: Role::Employer,
            })
            .await
            .unwrap();
        if !active {
            state.store.deactivate_user(user.id).await.unwrap();
        }
        let token = JwtKeys::from_ref(&state).sign(&user).unwrap();
        (state, user, token)
    }

    fn parts_with(headers: &[(&str, String)]) -> Parts {
        let mut builder = Request::builder().uri("/api/jobs");
        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let (state, _, _) = state_with_user(true).await;
        let mut parts = parts_with(&[]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No token, authorization denied");
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let (state, _, _) = state_with_user(true).await;
        let mut parts = parts_with(&[("Authorization", "Bearer not.a.jwt".into())]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Token is not valid");
    }

    #[tokio::test]
    async fn valid_token_attaches_identity() {
        let (state, user, token) = state_with_user(true).await;
        let mut parts = parts_with(&[("Authorization", format!("Bearer {token}"))]);
        let auth = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(auth.id, user.id);
        assert_eq!(auth.email, user.email);
        assert_eq!(auth.role, Role::Employer);
    }

    #[tokio::test]
    async fn x_auth_token_header_is_accepted_as_fallback() {
        let (state, user, token) = state_with_user(true).await;
        let mut parts = parts_with(&[("x-auth-token", token)]);
        let auth = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(auth.id, user.id);
    }

    #[tokio::test]
    async fn deactivated_user_is_rejected_despite_valid_signature() {
        let (state, _, token) = state_with_user(false).await;
        let mut parts = parts_with(&[("Authorization", format!("Bearer {token}"))]);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Token is not valid or user is deactivated");
    }

    #[tokio::test]
    async fn optional_auth_swallows_every_failure() {
        let (state, user, token) = state_with_user(true).await;

        let mut parts = parts_with(&[]);
        let OptionalUser(none) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(none.is_none());

        let mut parts = parts_with(&[("Authorization", "Bearer junk".into())]);
        let OptionalUser(none) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert!(none.is_none());

        let mut parts = parts_with(&[("Authorization", format!("Bearer {token}"))]);
        let OptionalUser(some) = OptionalUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(some.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn authorize_distinguishes_unauthenticated_from_wrong_role() {
        let seeker = AuthUser {
            id: Uuid::new_v4(),
            email: "s@example.com".into(),
            role: Role::JobSeeker,
        };

        let err = authorize(None, &[Role::Admin]).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let err = authorize(Some(&seeker), &[Role::Admin, Role::Employer]).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(
            err.to_string(),
            "User role 'job-seeker' is not authorized to access this route"
        );

        assert!(authorize(Some(&seeker), &[Role::JobSeeker]).is_ok());
    }
}
