//! Borrowings repository (read side; mutations live in the lifecycle store)

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{error::AppResult, models::borrowing::BorrowingDetails};

const DETAILS_SELECT: &str = r#"
    SELECT br.*, u.email AS user_email, u.name AS user_name,
           b.title AS book_title, b.author AS book_author, b.publisher AS book_publisher,
           b.image AS book_image, c.name AS category_name
    FROM borrowings br
    JOIN books b ON b.id = br.book_id
    LEFT JOIN users u ON u.id = br.user_id
    LEFT JOIN categories c ON c.id = b.category_id
"#;

#[derive(Clone)]
pub struct BorrowingsRepository {
    pool: Pool<Postgres>,
}

impl BorrowingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All borrowings, most recent first
    pub async fn list_all(&self) -> AppResult<Vec<BorrowingDetails>> {
        let borrowings = sqlx::query_as::<_, BorrowingDetails>(&format!(
            "{} ORDER BY br.borrowed_at DESC",
            DETAILS_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(borrowings)
    }

    /// Borrowings of one user, open ones first
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowingDetails>> {
        let borrowings = sqlx::query_as::<_, BorrowingDetails>(&format!(
            "{} WHERE br.user_id = $1 ORDER BY (br.returned_at IS NULL) DESC, br.borrowed_at DESC",
            DETAILS_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(borrowings)
    }
}
