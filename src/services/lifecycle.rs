//! Book lifecycle service: reservation, approval, return and expiry

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{book::Book, borrowing::Borrowing},
    repository::LifecycleStore,
};

#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn LifecycleStore>,
    expiry: Duration,
}

fn audit(book: &Book) {
    if let Err(violation) = book.check_invariants() {
        tracing::error!(book_id = %book.id, "Lifecycle invariant violated: {}", violation);
    }
}

impl LifecycleService {
    pub fn new(store: Arc<dyn LifecycleStore>, expiry: Duration) -> Self {
        Self { store, expiry }
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Reserve an available book for `user_id`
    pub async fn reserve(&self, book_id: Uuid, user_id: Uuid) -> AppResult<Book> {
        let book = self.store.reserve(book_id, user_id, Utc::now()).await?;
        audit(&book);
        tracing::info!(%book_id, %user_id, "Book reserved");
        Ok(book)
    }

    /// Approve the reservation held by `user_id`, opening a borrowing
    pub async fn approve(&self, book_id: Uuid, user_id: Uuid) -> AppResult<(Book, Borrowing)> {
        let (book, borrowing) = self.store.approve(book_id, user_id, Utc::now()).await?;
        audit(&book);
        tracing::info!(%book_id, %user_id, borrowing_id = %borrowing.id, "Borrowing approved");
        Ok((book, borrowing))
    }

    /// Close the open borrowing of `user_id` on `book_id`
    pub async fn return_book(&self, book_id: Uuid, user_id: Uuid) -> AppResult<(Book, Borrowing)> {
        let (book, borrowing) = self.store.return_book(book_id, user_id, Utc::now()).await?;
        audit(&book);
        tracing::info!(%book_id, %user_id, borrowing_id = %borrowing.id, "Book returned");
        Ok((book, borrowing))
    }

    /// Release every reservation older than the expiry as of `now`
    pub async fn release_expired_reservations(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - self.expiry;
        self.store.release_expired(cutoff, now).await
    }
}
