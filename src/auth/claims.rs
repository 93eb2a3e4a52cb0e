use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token is allowed to be used for: a login session or a password reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Login,
    Reset,
}

/// JWT payload. Decoding into this struct fails on any missing or
/// mistyped field, which callers must report as an invalid token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,            // user ID
    pub email: String,        // user email at issuance
    pub iat: usize,           // issued at (unix timestamp)
    pub exp: usize,           // expires at (unix timestamp)
    pub iss: String,          // issuer
    pub aud: String,          // audience
    pub purpose: TokenPurpose, // login or reset
    pub pwv: i64,             // password version at issuance
}
