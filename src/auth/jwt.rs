use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::accounts::repo_types::User;
use crate::auth::claims::{Claims, TokenPurpose};
use crate::config::JwtConfig;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
    #[error("wrong token purpose")]
    Purpose,
    #[error("token signing failed: {0}")]
    Sign(jsonwebtoken::errors::Error),
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub login_ttl: Duration,
    pub reset_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            login_ttl_minutes,
            reset_ttl_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            login_ttl: Duration::from_secs((login_ttl_minutes as u64) * 60),
            reset_ttl: Duration::from_secs((reset_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_purpose(&self, user: &User, purpose: TokenPurpose) -> Result<String, TokenError> {
        let now = OffsetDateTime::now_utc();
        let ttl = match purpose {
            TokenPurpose::Login => self.login_ttl,
            TokenPurpose::Reset => self.reset_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            purpose,
            pwv: user.password_version,
        };
        let token = encode(&Header::default(), &claims, &self.encoding).map_err(TokenError::Sign)?;
        debug!(user_id = %user.id, purpose = ?purpose, "jwt signed");
        Ok(token)
    }

    pub fn sign_login(&self, user: &User) -> Result<String, TokenError> {
        self.sign_with_purpose(user, TokenPurpose::Login)
    }
    pub fn sign_reset(&self, user: &User) -> Result<String, TokenError> {
        self.sign_with_purpose(user, TokenPurpose::Reset)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        debug!(user_id = %data.claims.sub, purpose = ?data.claims.purpose, "jwt verified");
        Ok(data.claims)
    }

    /// Verify signature and expiry, then require the expected purpose.
    pub fn verify_purpose(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.purpose != purpose {
            return Err(TokenError::Purpose);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys() -> JwtKeys {
        let state = AppState::fake();
        JwtKeys::from_ref(&state)
    }

    fn make_user() -> User {
        let now = OffsetDateTime::now_utc();
        User {
            id: Uuid::new_v4(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password_hash: "x".into(),
            password_version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sign_and_verify_login_token() {
        let keys = make_keys();
        let user = make_user();
        let token = keys.sign_login(&user).expect("sign login");
        let claims = keys.verify(&token).expect("verify token");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.purpose, TokenPurpose::Login);
    }

    #[test]
    fn sign_and_verify_reset_token() {
        let keys = make_keys();
        let user = make_user();
        let token = keys.sign_reset(&user).expect("sign reset");
        let claims = keys
            .verify_purpose(&token, TokenPurpose::Reset)
            .expect("verify reset");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.purpose, TokenPurpose::Reset);
    }

    #[test]
    fn verify_purpose_rejects_mismatch() {
        let keys = make_keys();
        let token = keys.sign_reset(&make_user()).expect("sign reset");
        let err = keys.verify_purpose(&token, TokenPurpose::Login).unwrap_err();
        assert!(matches!(err, TokenError::Purpose));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys();
        let user = make_user();
        // Hand-roll claims that expired well past the default leeway.
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            iat: (now.unix_timestamp() - 7200) as usize,
            exp: (now.unix_timestamp() - 3600) as usize,
            iss: keys.issuer.clone(),
            aud: keys.audience.clone(),
            purpose: TokenPurpose::Login,
            pwv: 0,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[test]
    fn verify_rejects_foreign_signature() {
        let keys = make_keys();
        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"some-other-secret"),
            decoding: DecodingKey::from_secret(b"some-other-secret"),
            ..make_keys()
        };
        let token = other.sign_login(&make_user()).expect("sign");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }

    #[test]
    fn verify_fails_closed_on_missing_claims() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp();
        // No purpose, no sub: must not decode into Claims.
        let partial = serde_json::json!({
            "email": "ada@example.com",
            "iat": now,
            "exp": now + 600,
            "iss": keys.issuer,
            "aud": keys.audience,
        });
        let token = encode(&Header::default(), &partial, &keys.encoding).expect("encode");
        let err = keys.verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid));
    }
}
