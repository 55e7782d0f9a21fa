//! Authentication and account endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::user::{LoginRequest, SignupRequest, UpdateProfile, UserPublic},
};

use super::AuthenticatedUser;

/// Plain acknowledgement
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    /// Status message
    pub message: String,
}

/// Signup response
#[derive(Serialize, ToSchema)]
pub struct SignupResponse {
    /// Status message
    pub message: String,
    /// ID of the new account
    pub user_id: i32,
}

/// Login response with bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    /// Status message
    pub message: String,
    /// Bearer token for subsequent requests
    pub token: String,
    /// The authenticated profile
    pub user: UserPublic,
}

/// Profile update response
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    /// Status message
    pub message: String,
    /// The updated profile
    pub user: UserPublic,
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid input or email already taken")
    )
)]
pub async fn signup(
    State(state): State<crate::AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<SignupResponse>)> {
    let user_id = state.services.auth.signup(payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User registered successfully".to_string(),
            user_id,
        }),
    ))
}

/// Log in with email and password
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, user) = state.services.auth.login(payload).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
        user,
    }))
}

/// Log out (stateless: the client discards its token)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(AuthenticatedUser(_claims): AuthenticatedUser) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// Update the caller's own profile
#[utoipa::path(
    put,
    path = "/auth/edit",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn edit_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<UpdateProfile>,
) -> AppResult<Json<ProfileResponse>> {
    let user = state
        .services
        .auth
        .update_profile(claims.user_id, payload)
        .await?;

    Ok(Json(ProfileResponse {
        message: "User details updated successfully".to_string(),
        user,
    }))
}
