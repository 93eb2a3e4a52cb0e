use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::accounts::dto::{
    ForgotPasswordRequest, LoginRequest, MessageResponse, ProfileResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, ResetTokenQuery, TokenResponse,
    UpdateProfileRequest,
};
use crate::accounts::error::AccountError;
use crate::accounts::services;
use crate::auth::extractors::AuthUser;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me).put(update_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AccountError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(RegisterResponse { user_id: user.id })))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AccountError> {
    let token = services::login(&state, payload).await?;
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, AccountError> {
    services::request_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse {
        message: "if that email is registered, a reset link has been sent".into(),
    }))
}

#[instrument(skip(state, query, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Query(query): Query<ResetTokenQuery>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AccountError> {
    services::confirm_reset(&state, &query.token, &payload.new_password).await?;
    Ok(Json(MessageResponse {
        message: "your password was updated successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<ProfileResponse>, AccountError> {
    let user = services::profile(&state, user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AccountError> {
    let user = services::update_profile(&state, user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, AccountError> {
    services::delete_account(&state, user_id).await?;
    Ok(Json(MessageResponse {
        message: "account deleted successfully".into(),
    }))
}
