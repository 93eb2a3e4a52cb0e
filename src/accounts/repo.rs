use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::accounts::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Durable user storage keyed by id and unique email.
#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn insert(&self, new: NewUser) -> Result<User, RepoError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn update(&self, user: &User) -> Result<(), RepoError>;
    /// Deleting an id that is already gone succeeds.
    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;
}

fn map_insert_err(e: sqlx::Error) -> RepoError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            return RepoError::DuplicateEmail;
        }
    }
    RepoError::Database(e)
}

/// Postgres-backed repository.
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, first_name, last_name, email, password_hash,
                      password_version, created_at, updated_at
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash,
                   password_version, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email, password_hash,
                   password_version, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4,
                password_hash = $5, password_version = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.password_version)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_insert_err)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory repository for tests and local runs without Postgres.
#[derive(Default, Clone)]
pub struct MemoryUserRepo {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn insert(&self, new: NewUser) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(RepoError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            password_version: 0,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn update(&self, user: &User) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(RepoError::DuplicateEmail);
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        users.remove(&id);
        Ok(())
    }
}
