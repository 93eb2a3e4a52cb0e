use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::claims::TokenPurpose;
use crate::auth::jwt::JwtKeys;
use crate::state::AppState;

/// Extracts and validates a bearer token, returning the user ID.
/// Rejection is the response: a handler behind this extractor never
/// runs for an unauthenticated request.
#[derive(Debug)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "missing Authorization header".to_string(),
            ))?;

        // Expect "Bearer <token>"
        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .filter(|t| !t.is_empty())
            .ok_or((
                StatusCode::UNAUTHORIZED,
                "invalid auth scheme".to_string(),
            ))?;

        let keys = JwtKeys::from_ref(state);
        let claims = match keys.verify_purpose(token, TokenPurpose::Login) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "bearer token rejected");
                return Err((
                    StatusCode::UNAUTHORIZED,
                    "invalid or expired token".to_string(),
                ));
            }
        };

        Ok(AuthUser(claims.sub))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::repo_types::User;
    use axum::http::Request;
    use time::OffsetDateTime;

    fn make_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
            email: "grace@example.com".into(),
            password_hash: "x".into(),
            password_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/me");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(()).expect("request").into_parts();
        parts
    }

    #[tokio::test]
    async fn accepts_valid_login_token() {
        let state = AppState::fake();
        let user = make_user();
        let token = JwtKeys::from_ref(&state).sign_login(&user).expect("sign");
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let AuthUser(id) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .expect("should authenticate");
        assert_eq!(id, user.id);
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let state = AppState::fake();
        let mut parts = parts_with_header(None);
        let (status, _) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_wrong_scheme_and_bare_bearer() {
        let state = AppState::fake();
        for header in ["Basic abc123", "Bearer ", "Bearer"] {
            let mut parts = parts_with_header(Some(header));
            let (status, _) = AuthUser::from_request_parts(&mut parts, &state)
                .await
                .unwrap_err();
            assert_eq!(status, StatusCode::UNAUTHORIZED, "header {header:?}");
        }
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let state = AppState::fake();
        let mut parts = parts_with_header(Some("Bearer not.a.jwt"));
        let (status, _) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn rejects_reset_purpose_token() {
        let state = AppState::fake();
        let token = JwtKeys::from_ref(&state)
            .sign_reset(&make_user())
            .expect("sign");
        let mut parts = parts_with_header(Some(&format!("Bearer {token}")));
        let (status, _) = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
