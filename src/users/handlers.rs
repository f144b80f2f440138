use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::Json;
use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use crate::auth::extractors::AuthUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::jobs::dto::JobDto;
use crate::models::NewUser;
use crate::state::AppState;
use crate::store::Store;
use crate::users::dto::{
    AccountMessageResponse, AuthResponse, ChangePasswordRequest, LoginRequest, ProfileData,
    ProfileResponse, ProfileUpdateResponse, RegisterRequest, UpdateProfileRequest, UserDto,
};

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let data = payload.validate().map_err(ApiError::Validation)?;

    let existing = state
        .store
        .find_user_by_email(&data.email)
        .await
        .map_err(|e| ApiError::internal("Server error during registration", e))?;
    if existing.is_some() {
        warn!(email = %data.email, "email already registered");
        return Err(ApiError::bad_request("User already exists with this email"));
    }

    // Registration fails closed if hashing does.
    let password_hash = hash_password(&data.password)
        .map_err(|e| ApiError::internal("Server error during registration", e))?;

    let user = state
        .store
        .create_user(NewUser {
            name: data.name,
            email: data.email,
            password_hash,
            role: data.role,
        })
        .await
        .map_err(|e| ApiError::internal("Server error during registration", e))?;

    let token = JwtKeys::from_ref(&state)
        .sign(&user)
        .map_err(|e| ApiError::internal("Server error during registration", e))?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            message: "User registered successfully".into(),
            token,
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let (email, password) = payload.validate().map_err(ApiError::Validation)?;

    let mut user = match state
        .store
        .find_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal("Server error during login", e))?
    {
        Some(user) => user,
        None => {
            warn!(%email, "login with unknown email");
            return Err(ApiError::unauthorized("Invalid credentials"));
        }
    };

    if !user.is_active {
        warn!(user_id = %user.id, "login to deactivated account");
        return Err(ApiError::unauthorized(
            "Account is deactivated. Please contact support.",
        ));
    }

    let ok = verify_password(&password, &user.password_hash)
        .map_err(|e| ApiError::internal("Server error during login", e))?;
    if !ok {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    // Best effort: a failed timestamp write must not fail the login.
    match state.store.touch_last_login(user.id).await {
        Ok(()) => user.last_login = Some(OffsetDateTime::now_utc()),
        Err(e) => warn!(error = %e, user_id = %user.id, "failed to update last login"),
    }

    let token = JwtKeys::from_ref(&state)
        .sign(&user)
        .map_err(|e| ApiError::internal("Server error during login", e))?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".into(),
        token,
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<ProfileResponse>> {
    let user = state
        .store
        .find_user_by_id(auth.id)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching profile", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let jobs = state
        .store
        .jobs_by_owner(auth.id)
        .await
        .map_err(|e| ApiError::internal("Server error while fetching profile", e))?;

    let now = OffsetDateTime::now_utc();
    Ok(Json(ProfileResponse {
        success: true,
        data: ProfileData {
            user: user.into(),
            posted_jobs: jobs
                .into_iter()
                .map(|job| JobDto::from_job(job, now))
                .collect(),
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileUpdateResponse>> {
    let update = payload.validate().map_err(ApiError::Validation)?;

    let user = state
        .store
        .update_user_profile(auth.id, update)
        .await
        .map_err(|e| ApiError::internal("Server error while updating profile", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(ProfileUpdateResponse {
        success: true,
        message: "Profile updated successfully".into(),
        data: user.into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<AccountMessageResponse>> {
    payload.validate().map_err(ApiError::Validation)?;

    let user = state
        .store
        .find_user_by_id(auth.id)
        .await
        .map_err(|e| ApiError::internal("Server error while changing password", e))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let ok = verify_password(&payload.current_password, &user.password_hash)
        .map_err(|e| ApiError::internal("Server error while changing password", e))?;
    if !ok {
        return Err(ApiError::bad_request("Current password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal("Server error while changing password", e))?;
    state
        .store
        .set_password_hash(user.id, &password_hash)
        .await
        .map_err(|e| ApiError::internal("Server error while changing password", e))?;

    info!(user_id = %user.id, "password changed");
    Ok(Json(AccountMessageResponse {
        success: true,
        message: "Password changed successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn deactivate_account(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<AccountMessageResponse>> {
    state
        .store
        .deactivate_user(auth.id)
        .await
        .map_err(|e| ApiError::internal("Server error while deactivating account", e))?;

    info!(user_id = %auth.id, "account deactivated");
    Ok(Json(AccountMessageResponse {
        success: true,
        message: "Account deactivated successfully".into(),
    }))
}
