use uuid::Uuid;

use crate::{error::AppResult, models::favorite::Favorite, repository::Repository};

#[derive(Clone)]
pub struct FavoritesService {
    repository: Repository,
}

impl FavoritesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn add(&self, user_id: Uuid, book_id: Uuid) -> AppResult<Favorite> {
        self.repository.favorites.add(user_id, book_id).await
    }

    pub async fn remove(&self, user_id: Uuid, book_id: Uuid) -> AppResult<()> {
        self.repository.favorites.remove(user_id, book_id).await
    }
}
