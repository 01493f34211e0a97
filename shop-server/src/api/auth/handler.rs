//! Authentication handlers

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, User, UserRole,
};

use crate::api::{ApiResult, ok, ok_message};
use crate::auth::CurrentUser;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::db;
use crate::error::{ServiceError, validate};
use crate::state::AppState;
use crate::{audit_log, security_log};

/// Fixed delay on failed logins to flatten timing differences
const AUTH_FAILURE_DELAY_MS: u64 = 300;

fn issue_token(state: &AppState, user: User) -> Result<AuthResponse, ServiceError> {
    let token = state
        .jwt
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;
    Ok(AuthResponse {
        token,
        expires_in: state.jwt.expires_in(),
        user,
    })
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<AuthResponse>), ServiceError> {
    validate(&req)?;

    if db::users::find_by_email(&state.pool, &req.email).await?.is_some() {
        return Err(ErrorCode::EmailAlreadyRegistered.into());
    }

    let password_hash = hash_password_blocking(req.password)
        .await
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

    let user = db::users::create(
        &state.pool,
        req.email.trim(),
        &password_hash,
        req.full_name.trim(),
        req.phone.as_deref(),
        UserRole::Customer,
    )
    .await
    .map_err(ServiceError::from)
    .map_err(|e| {
        if e.is_unique_violation_on("users_email_key") {
            ServiceError::from(ErrorCode::EmailAlreadyRegistered)
        } else {
            e
        }
    })?;

    security_log!(INFO, "register", user_id = user.id, email = %user.email);
    let response = issue_token(&state, user)?;
    Ok((StatusCode::CREATED, ApiResponse::success(response)))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password return the same error.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    validate(&req)?;

    let user = db::users::find_by_email(&state.pool, &req.email).await?;

    let user = match user {
        Some(user) => {
            let valid = verify_password_blocking(req.password, user.password_hash.clone()).await;
            if !valid {
                security_log!(WARN, "login_failed", email = %req.email, reason = "invalid_password");
                tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
                return Err(AppError::invalid_credentials().into());
            }
            if !user.is_active {
                security_log!(WARN, "login_failed", email = %req.email, reason = "account_disabled");
                return Err(ErrorCode::AccountDisabled.into());
            }
            user
        }
        None => {
            security_log!(WARN, "login_failed", email = %req.email, reason = "user_not_found");
            tokio::time::sleep(Duration::from_millis(AUTH_FAILURE_DELAY_MS)).await;
            return Err(AppError::invalid_credentials().into());
        }
    };

    security_log!(INFO, "login_success", user_id = user.id, role = %user.role.as_str());
    ok(issue_token(&state, user)?)
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, current: CurrentUser) -> ApiResult<User> {
    let user = db::users::find_by_id(&state.pool, current.id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;
    ok(user)
}

/// PUT /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> ApiResult<()> {
    validate(&req)?;

    let user = db::users::find_by_id(&state.pool, current.id)
        .await?
        .ok_or(ErrorCode::UserNotFound)?;

    if !verify_password_blocking(req.current_password, user.password_hash).await {
        security_log!(WARN, "change_password_failed", user_id = current.id);
        return Err(AppError::invalid_credentials().into());
    }

    let password_hash = hash_password_blocking(req.new_password)
        .await
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;
    db::users::update_password(&state.pool, current.id, &password_hash).await?;

    audit_log!(current.id, "change_password", format!("user:{}", current.id));
    ok_message("Password changed")
}
