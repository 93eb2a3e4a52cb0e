use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub first_name: String,
    pub last_name: String,
    pub email: String,              // unique, stored trimmed + lowercased
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub password_version: i64,      // bumped on every password change
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields required to insert a new user; id and timestamps are assigned
/// by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
}
