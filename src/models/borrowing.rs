//! Borrowing (approved loan) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Borrowing row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Borrowing {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub borrowed_at: DateTime<Utc>,
    /// `None` while the loan is open
    pub returned_at: Option<DateTime<Utc>>,
}

impl Borrowing {
    pub fn is_open(&self) -> bool {
        self.returned_at.is_none()
    }
}

/// Borrowing joined with user and book summaries
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub borrowing: Borrowing,
    pub user_email: Option<String>,
    pub user_name: Option<String>,
    pub book_title: String,
    pub book_author: String,
    pub book_publisher: String,
    pub book_image: Option<String>,
    pub category_name: Option<String>,
}

/// Target of an approval or return: a user and one of their books
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct BorrowingKey {
    pub user_id: Uuid,
    pub book_id: Uuid,
}
