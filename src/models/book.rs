//! Book model and lifecycle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::LifecycleError;

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_PAGE: i64 = 100_000;

/// Lifecycle status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "book_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Reserved,
    Borrowed,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Reserved => "reserved",
            BookStatus::Borrowed => "borrowed",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Book row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub year: i32,
    pub description: String,
    pub category_id: Uuid,
    /// Cover image URL
    pub image: Option<String>,
    pub status: BookStatus,
    pub reserved_by: Option<Uuid>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub borrowed_by: Option<Uuid>,
    pub borrowed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Check that `status` agrees with the reservation and borrow columns.
    pub fn check_invariants(&self) -> Result<(), String> {
        let reserved = self.reserved_by.is_some() || self.reserved_at.is_some();
        let borrowed = self.borrowed_by.is_some() || self.borrowed_at.is_some();
        let fully_reserved = self.reserved_by.is_some() && self.reserved_at.is_some();
        let fully_borrowed = self.borrowed_by.is_some() && self.borrowed_at.is_some();

        let consistent = match self.status {
            BookStatus::Available => !reserved && !borrowed,
            BookStatus::Reserved => fully_reserved && !borrowed,
            BookStatus::Borrowed => fully_borrowed && !reserved,
        };

        if consistent {
            Ok(())
        } else {
            Err(format!(
                "book {} is {} with reserved_by={:?}, borrowed_by={:?}",
                self.id, self.status, self.reserved_by, self.borrowed_by
            ))
        }
    }

    /// Explain why approving this book for `user_id` did not match.
    pub fn approval_conflict(&self, user_id: Uuid) -> LifecycleError {
        match self.status {
            BookStatus::Reserved if self.reserved_by != Some(user_id) => {
                LifecycleError::ReservedByAnotherUser
            }
            BookStatus::Reserved => LifecycleError::Inconsistent(format!(
                "book {} is reserved by {} but the approval did not apply",
                self.id, user_id
            )),
            BookStatus::Available | BookStatus::Borrowed => LifecycleError::NotReserved,
        }
    }
}

/// Book with catalog context for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookDetails {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub book: Book,
    pub category_name: Option<String>,
    /// E-mail of the user reserving or borrowing the book
    pub holder_email: Option<String>,
    pub favorite_count: i64,
    pub is_favorite: bool,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 3, max = 255, message = "Title must be 3-255 characters"))]
    pub title: String,
    #[validate(length(min = 3, max = 255, message = "Author must be 3-255 characters"))]
    pub author: String,
    #[validate(length(min = 3, max = 255, message = "Publisher must be 3-255 characters"))]
    pub publisher: String,
    #[validate(range(min = 0, message = "Year must be positive"))]
    pub year: i32,
    #[validate(length(min = 5, message = "Description must be at least 5 characters"))]
    pub description: String,
    pub category_id: Uuid,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Update book request. Lifecycle columns are not editable.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 3, max = 255, message = "Title must be 3-255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 3, max = 255, message = "Author must be 3-255 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 3, max = 255, message = "Publisher must be 3-255 characters"))]
    pub publisher: Option<String>,
    #[validate(range(min = 0, message = "Year must be positive"))]
    pub year: Option<i32>,
    #[validate(length(min = 5, message = "Description must be at least 5 characters"))]
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "Image must be a valid URL"))]
    pub image: Option<String>,
}

/// Ordering of book listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookSort {
    FavMost,
    FavLeast,
    #[default]
    AddedNew,
    AddedOld,
}

impl BookSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            BookSort::FavMost => "favorite_count DESC, b.created_at DESC",
            BookSort::FavLeast => "favorite_count ASC, b.created_at DESC",
            BookSort::AddedNew => "b.created_at DESC",
            BookSort::AddedOld => "b.created_at ASC",
        }
    }
}

/// Book query parameters
#[derive(Debug, Default, Deserialize, Validate, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub status: Option<BookStatus>,
    /// Category ID
    pub category: Option<Uuid>,
    pub sort_by: Option<BookSort>,
    /// Case-insensitive match on title or author
    pub search: Option<String>,
    /// Only the caller's favorites
    pub favorite: Option<bool>,
    #[validate(range(min = 1, max = 100_000, message = "Page must be between 1 and 100000"))]
    pub page: Option<i64>,
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<i64>,
}

impl BookQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
