//! Books repository for catalog operations

use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{violated_constraint, FOREIGN_KEY_VIOLATION};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

fn push_details_select<'a>(builder: &mut QueryBuilder<'a, Postgres>, viewer: Option<Uuid>) {
    builder.push(
        r#"
        SELECT b.*, c.name AS category_name, u.email AS holder_email,
               (SELECT COUNT(*) FROM favorites f WHERE f.book_id = b.id) AS favorite_count,
               EXISTS(SELECT 1 FROM favorites f WHERE f.book_id = b.id AND f.user_id = "#,
    );
    builder.push_bind(viewer);
    builder.push(
        r#") AS is_favorite
        FROM books b
        LEFT JOIN categories c ON c.id = b.category_id
        LEFT JOIN users u ON u.id = COALESCE(b.reserved_by, b.borrowed_by)
        "#,
    );
}

fn push_filters<'a>(builder: &mut QueryBuilder<'a, Postgres>, query: &BookQuery, viewer: Option<Uuid>) {
    builder.push(" WHERE TRUE");

    if let Some(status) = query.status {
        builder.push(" AND b.status = ").push_bind(status);
    }
    if let Some(category) = query.category {
        builder.push(" AND b.category_id = ").push_bind(category);
    }
    if let Some(term) = query.search_term() {
        let pattern = like_pattern(term);
        builder
            .push(" AND (b.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR b.author ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if query.favorite.unwrap_or(false) {
        // Anonymous callers have no favorites: viewer binds as NULL and matches nothing
        builder
            .push(" AND EXISTS(SELECT 1 FROM favorites f WHERE f.book_id = b.id AND f.user_id = ")
            .push_bind(viewer)
            .push(")");
    }
}

/// `%term%` with LIKE wildcards in `term` escaped
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Get book with catalog context as seen by `viewer`
    pub async fn get_details(&self, id: Uuid, viewer: Option<Uuid>) -> AppResult<BookDetails> {
        let mut builder = QueryBuilder::new("");
        push_details_select(&mut builder, viewer);
        builder.push(" WHERE b.id = ").push_bind(id);

        builder
            .build_query_as::<BookDetails>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Search books with filters, ordering and pagination
    pub async fn search(&self, query: &BookQuery, viewer: Option<Uuid>) -> AppResult<(Vec<BookDetails>, i64)> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM books b");
        push_filters(&mut count, query, viewer);
        let total: i64 = count
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("");
        push_details_select(&mut builder, viewer);
        push_filters(&mut builder, query, viewer);
        builder
            .push(" ORDER BY ")
            .push(query.sort_by.unwrap_or_default().order_by())
            .push(" LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let books = builder
            .build_query_as::<BookDetails>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    /// Create a new book (always starts available)
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, publisher, year, description, category_id, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(&book.description)
        .bind(book.category_id)
        .bind(&book.image)
        .fetch_one(&self.pool)
        .await
        .map_err(map_category_violation)
    }

    /// Update catalog fields of a book
    pub async fn update(&self, id: Uuid, book: &UpdateBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                author = COALESCE($3, author),
                publisher = COALESCE($4, publisher),
                year = COALESCE($5, year),
                description = COALESCE($6, description),
                category_id = COALESCE($7, category_id),
                image = COALESCE($8, image),
                updated_at = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(book.year)
        .bind(&book.description)
        .bind(book.category_id)
        .bind(&book.image)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_category_violation)?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Delete a book; only available books can be deleted
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND status = 'available'")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            let book = self.get_by_id(id).await?;
            return Err(AppError::Conflict(format!(
                "Book is {} and cannot be deleted",
                book.status
            )));
        }
        Ok(())
    }
}

fn map_category_violation(err: sqlx::Error) -> AppError {
    if violated_constraint(&err, FOREIGN_KEY_VIOLATION) == Some("books_category_id_fkey") {
        AppError::Validation("Unknown category".to_string())
    } else {
        AppError::Database(err)
    }
}
