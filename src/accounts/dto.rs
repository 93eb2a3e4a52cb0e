use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::repo_types::User;

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Request body for starting a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Reset token carried as a query parameter on the reset-password URL.
#[derive(Debug, Deserialize)]
pub struct ResetTokenQuery {
    pub token: String,
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

/// Partial profile update; absent or empty fields are left untouched.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

/// Public part of the user returned to the client. The password hash
/// has no field here.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
        }
    }
}

/// Generic acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}
