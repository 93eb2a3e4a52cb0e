use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::accounts::repo::RepoError;
use crate::auth::jwt::TokenError;

/// Caller-visible failure modes of the account service. Raw storage and
/// crypto error text never crosses this boundary.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("this email is already registered")]
    DuplicateEmail,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("invalid token")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("user not found")]
    UserNotFound,
    #[error("password hashing failed")]
    Hashing(#[source] anyhow::Error),
    #[error("storage failure")]
    Storage(#[source] anyhow::Error),
    #[error("internal error")]
    Internal(#[source] anyhow::Error),
}

impl From<RepoError> for AccountError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail => AccountError::DuplicateEmail,
            RepoError::Database(e) => AccountError::Storage(e.into()),
        }
    }
}

impl From<TokenError> for AccountError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AccountError::TokenExpired,
            TokenError::Invalid | TokenError::Purpose => AccountError::TokenInvalid,
            TokenError::Sign(e) => AccountError::Internal(e.into()),
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AccountError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AccountError::DuplicateEmail => (StatusCode::CONFLICT, self.to_string()),
            AccountError::InvalidCredentials
            | AccountError::TokenInvalid
            | AccountError::TokenExpired => (StatusCode::UNAUTHORIZED, self.to_string()),
            AccountError::UserNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AccountError::Hashing(e) | AccountError::Storage(e) | AccountError::Internal(e) => {
                error!(error = %e, kind = ?self, "internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_do_not_leak_detail() {
        let err = AccountError::Storage(anyhow::anyhow!("connection refused to db at 10.0.0.5"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn credential_failures_share_one_message() {
        // Unknown email and wrong password both pass through this variant,
        // so callers see byte-identical bodies.
        assert_eq!(
            AccountError::InvalidCredentials.to_string(),
            "invalid email or password"
        );
    }

    #[test]
    fn token_errors_map_to_unauthorized() {
        for err in [AccountError::TokenInvalid, AccountError::TokenExpired] {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }
}
