//! Categories repository

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::{violated_constraint, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::{
    error::{AppError, AppResult},
    models::category::Category,
};

#[derive(Clone)]
pub struct CategoriesRepository {
    pool: Pool<Postgres>,
}

impl CategoriesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn create(&self, name: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("INSERT INTO categories (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_duplicate_name(e, name))
    }

    pub async fn rename(&self, id: Uuid, name: &str) -> AppResult<Category> {
        sqlx::query_as::<_, Category>("UPDATE categories SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_duplicate_name(e, name))?
            .ok_or_else(|| AppError::NotFound(format!("Category with id {} not found", id)))
    }

    /// Delete a category that no book references
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if violated_constraint(&e, FOREIGN_KEY_VIOLATION).is_some() {
                    AppError::Conflict("Category is still used by books".to_string())
                } else {
                    AppError::Database(e)
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category with id {} not found", id)));
        }
        Ok(())
    }
}

fn map_duplicate_name(err: sqlx::Error, name: &str) -> AppError {
    if violated_constraint(&err, UNIQUE_VIOLATION) == Some("categories_name_key") {
        AppError::Conflict(format!("Category '{}' already exists", name))
    } else {
        AppError::Database(err)
    }
}
