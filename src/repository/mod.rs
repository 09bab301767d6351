//! Repository layer for database operations

pub mod books;
pub mod borrowings;
pub mod categories;
pub mod favorites;
pub mod lifecycle;
pub mod users;

use sqlx::{Pool, Postgres};

pub use lifecycle::{LifecycleStore, PgLifecycleStore};

pub(crate) const UNIQUE_VIOLATION: &str = "23505";
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub borrowings: borrowings::BorrowingsRepository,
    pub categories: categories::CategoriesRepository,
    pub favorites: favorites::FavoritesRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            borrowings: borrowings::BorrowingsRepository::new(pool.clone()),
            categories: categories::CategoriesRepository::new(pool.clone()),
            favorites: favorites::FavoritesRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }

    /// Round-trip to the database, used by the readiness check
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Name of the constraint behind a database error with the given SQLSTATE.
pub(crate) fn violated_constraint<'e>(err: &'e sqlx::Error, code: &str) -> Option<&'e str> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(code) => {
            Some(db.constraint().unwrap_or_default())
        }
        _ => None,
    }
}
