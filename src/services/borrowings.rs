//! Borrowing history listings

use uuid::Uuid;

use crate::{error::AppResult, models::borrowing::BorrowingDetails, repository::Repository};

#[derive(Clone)]
pub struct BorrowingsService {
    repository: Repository,
}

impl BorrowingsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.list_all().await
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.borrowings.list_for_user(user_id).await
    }
}
