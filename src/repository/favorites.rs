//! Favorites repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{violated_constraint, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::{
    error::{AppError, AppResult},
    models::favorite::Favorite,
};

#[derive(Clone)]
pub struct FavoritesRepository {
    pool: Pool<Postgres>,
}

impl FavoritesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn add(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Favorite> {
        sqlx::query_as::<_, Favorite>(
            "INSERT INTO favorites (user_id, book_id) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if violated_constraint(&e, UNIQUE_VIOLATION).is_some() {
                AppError::Conflict("Book is already in favorites".to_string())
            } else if violated_constraint(&e, FOREIGN_KEY_VIOLATION) == Some("favorites_book_id_fkey") {
                AppError::NotFound(format!("Book with id {} not found", book_id))
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn remove(&self, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND book_id = $2")
            .bind(user_id)
            .bind(book_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book is not in favorites".to_string()));
        }
        Ok(())
    }
}
