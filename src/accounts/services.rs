use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::accounts::dto::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use crate::accounts::error::AccountError;
use crate::accounts::repo_types::{NewUser, User};
use crate::auth::claims::TokenPurpose;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_shape(password: &str) -> Result<(), AccountError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AccountError::Validation("password too short".into()));
    }
    Ok(())
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<User, AccountError> {
    let email = normalize_email(&req.email);
    let first_name = req.first_name.trim().to_string();
    let last_name = req.last_name.trim().to_string();

    if first_name.is_empty() || last_name.is_empty() {
        return Err(AccountError::Validation("first and last name are required".into()));
    }
    if !is_valid_email(&email) {
        return Err(AccountError::Validation("invalid email".into()));
    }
    check_password_shape(&req.password)?;

    let hash = hash_password(&req.password).map_err(AccountError::Hashing)?;

    // Duplicate emails are caught at the unique constraint, not by a
    // pre-insert probe.
    let user = state
        .users
        .insert(NewUser {
            first_name,
            last_name,
            email,
            password_hash: hash,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user)
}

pub async fn login(state: &AppState, req: LoginRequest) -> Result<String, AccountError> {
    let email = normalize_email(&req.email);

    // Unknown email and wrong password fail the same way.
    let user = state
        .users
        .find_by_email(&email)
        .await?
        .ok_or(AccountError::InvalidCredentials)?;

    let ok = verify_password(&req.password, &user.password_hash).map_err(AccountError::Hashing)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AccountError::InvalidCredentials);
    }

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_login(&user)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(token)
}

/// Start the reset flow. Responds identically whether or not the email
/// is registered; the link only travels through the mailer.
pub async fn request_reset(state: &AppState, email: &str) -> Result<(), AccountError> {
    let email = normalize_email(email);

    let user = match state.users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!("reset requested for unknown email");
            return Ok(());
        }
    };

    let keys = JwtKeys::from_ref(state);
    let token = keys.sign_reset(&user)?;
    let link = format!(
        "{}/reset-password?token={}",
        state.config.public_base_url, token
    );

    if let Err(e) = state.mailer.send_reset_link(&user.email, &link).await {
        // Delivery failure must not reveal anything to the caller.
        warn!(error = %e, user_id = %user.id, "reset link delivery failed");
    }

    info!(user_id = %user.id, "reset link issued");
    Ok(())
}

/// Complete the reset flow. The token must carry the reset purpose and
/// the user's current password version, making it single-use: a
/// successful reset bumps the version and retires every earlier token.
pub async fn confirm_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> Result<(), AccountError> {
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify_purpose(token, TokenPurpose::Reset)?;

    check_password_shape(new_password)?;

    let mut user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    if claims.pwv != user.password_version {
        warn!(user_id = %user.id, "reset token already consumed");
        return Err(AccountError::TokenInvalid);
    }

    user.password_hash = hash_password(new_password).map_err(AccountError::Hashing)?;
    user.password_version += 1;
    user.updated_at = OffsetDateTime::now_utc();
    state.users.update(&user).await?;

    info!(user_id = %user.id, "password reset");
    Ok(())
}

pub async fn profile(state: &AppState, user_id: Uuid) -> Result<User, AccountError> {
    state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AccountError::UserNotFound)
}

/// Partial update: absent or empty fields leave the stored value alone.
pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<User, AccountError> {
    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(AccountError::UserNotFound)?;

    if let Some(first_name) = req.first_name.as_deref().map(str::trim) {
        if !first_name.is_empty() {
            user.first_name = first_name.to_string();
        }
    }
    if let Some(last_name) = req.last_name.as_deref().map(str::trim) {
        if !last_name.is_empty() {
            user.last_name = last_name.to_string();
        }
    }
    if let Some(email) = req.email.as_deref().map(str::trim) {
        if !email.is_empty() {
            let email = normalize_email(email);
            if !is_valid_email(&email) {
                return Err(AccountError::Validation("invalid email".into()));
            }
            user.email = email;
        }
    }

    user.updated_at = OffsetDateTime::now_utc();
    state.users.update(&user).await?;

    info!(user_id = %user.id, "profile updated");
    Ok(user)
}

pub async fn delete_account(state: &AppState, user_id: Uuid) -> Result<(), AccountError> {
    state.users.delete(user_id).await?;
    info!(user_id = %user_id, "account deleted");
    Ok(())
}
