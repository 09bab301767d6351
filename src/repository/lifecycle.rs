//! Book lifecycle transitions (reserve, approve, return, expire)
//!
//! Every transition is a conditional `UPDATE ... WHERE status = ...` inside a
//! transaction, so concurrent requests on the same book cannot both succeed.
//! Reservations and approvals lock the user's row first, which serializes
//! the "one active reservation or borrowing per user" check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use super::{violated_constraint, UNIQUE_VIOLATION};
use crate::{
    error::{AppError, AppResult, LifecycleError},
    models::{book::Book, borrowing::Borrowing},
};

/// Storage seam for the lifecycle services and the expiry sweeper
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LifecycleStore: Send + Sync {
    /// available → reserved
    async fn reserve(&self, book_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Book>;

    /// reserved → borrowed, opening a borrowing
    async fn approve(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Book, Borrowing)>;

    /// borrowed → available, closing the open borrowing
    async fn return_book(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Book, Borrowing)>;

    /// reserved → available for every reservation taken at or before `cutoff`.
    /// Returns the number of released books.
    async fn release_expired(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct PgLifecycleStore {
    pool: Pool<Postgres>,
}

impl PgLifecycleStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

async fn lock_user(conn: &mut PgConnection, user_id: Uuid) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))
}

async fn has_open_borrowing(conn: &mut PgConnection, user_id: Uuid) -> AppResult<bool> {
    let open: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM borrowings WHERE user_id = $1 AND returned_at IS NULL)",
    )
    .bind(user_id)
    .fetch_one(conn)
    .await?;
    Ok(open)
}

async fn has_reservation(conn: &mut PgConnection, user_id: Uuid) -> AppResult<bool> {
    let reserved: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE reserved_by = $1)")
            .bind(user_id)
            .fetch_one(conn)
            .await?;
    Ok(reserved)
}

async fn find_book(conn: &mut PgConnection, book_id: Uuid) -> AppResult<Book> {
    sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
        .bind(book_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| LifecycleError::BookNotFound.into())
}

/// Unique index hits on the per-user indexes mean the user is already engaged
fn map_engagement_violation(err: sqlx::Error) -> AppError {
    match violated_constraint(&err, UNIQUE_VIOLATION) {
        Some("books_one_reservation_per_user") | Some("borrowings_one_open_per_user") => {
            LifecycleError::AlreadyBorrowing.into()
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl LifecycleStore for PgLifecycleStore {
    async fn reserve(&self, book_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        if has_open_borrowing(&mut tx, user_id).await? || has_reservation(&mut tx, user_id).await? {
            return Err(LifecycleError::AlreadyBorrowing.into());
        }

        let reserved = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = 'reserved', reserved_by = $2, reserved_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'available'
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_engagement_violation)?;

        let book = match reserved {
            Some(book) => book,
            None => {
                // Distinguish a missing book from one in another state
                find_book(&mut tx, book_id).await?;
                return Err(LifecycleError::NotAvailable.into());
            }
        };

        tx.commit().await?;
        Ok(book)
    }

    async fn approve(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Book, Borrowing)> {
        let mut tx = self.pool.begin().await?;

        lock_user(&mut tx, user_id).await?;
        if has_open_borrowing(&mut tx, user_id).await? {
            return Err(LifecycleError::AlreadyBorrowing.into());
        }

        let approved = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = 'borrowed', reserved_by = NULL, reserved_at = NULL,
                borrowed_by = $2, borrowed_at = $3, updated_at = $3
            WHERE id = $1 AND status = 'reserved' AND reserved_by = $2
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?;

        let book = match approved {
            Some(book) => book,
            None => {
                let current = find_book(&mut tx, book_id).await?;
                return Err(current.approval_conflict(user_id).into());
            }
        };

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            INSERT INTO borrowings (user_id, book_id, borrowed_at)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_engagement_violation)?;

        tx.commit().await?;
        Ok((book, borrowing))
    }

    async fn return_book(
        &self,
        book_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Book, Borrowing)> {
        let mut tx = self.pool.begin().await?;

        let borrowing = sqlx::query_as::<_, Borrowing>(
            r#"
            UPDATE borrowings
            SET returned_at = $3
            WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(LifecycleError::NoOpenBorrowing)?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET status = 'available', borrowed_by = NULL, borrowed_at = NULL, updated_at = $3
            WHERE id = $1 AND status = 'borrowed' AND borrowed_by = $2
            RETURNING *
            "#,
        )
        .bind(book_id)
        .bind(user_id)
        .bind(now)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            LifecycleError::Inconsistent(format!(
                "borrowing {} is open but book {} is not borrowed by {}",
                borrowing.id, book_id, user_id
            ))
        })?;

        tx.commit().await?;
        Ok((book, borrowing))
    }

    async fn release_expired(&self, cutoff: DateTime<Utc>, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books
            SET status = 'available', reserved_by = NULL, reserved_at = NULL, updated_at = $2
            WHERE status = 'reserved' AND reserved_at <= $1
            "#,
        )
        .bind(cutoff)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
