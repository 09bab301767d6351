//! Users repository (profiles of identity-provider accounts)

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{violated_constraint, UNIQUE_VIOLATION};
use crate::{
    error::{AppError, AppResult},
    models::user::{Role, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Role stored for a user, `None` when the profile row is missing
    pub async fn find_role(&self, id: Uuid) -> AppResult<Option<Role>> {
        let role = sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    pub async fn create(&self, id: Uuid, email: &str, name: &str, role: Role) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, name, role) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(id)
        .bind(email)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e, UNIQUE_VIOLATION).is_some() {
                AppError::Conflict("A user with this email already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }
}
