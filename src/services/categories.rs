use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::category::{Category, CategoryInput},
    repository::Repository,
};

#[derive(Clone)]
pub struct CategoriesService {
    repository: Repository,
}

fn normalized_name(input: &CategoryInput) -> AppResult<&str> {
    input.validate()?;
    let name = input.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    Ok(name)
}

impl CategoriesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Category>> {
        self.repository.categories.list().await
    }

    pub async fn create(&self, input: CategoryInput) -> AppResult<Category> {
        let name = normalized_name(&input)?;
        self.repository.categories.create(name).await
    }

    pub async fn rename(&self, id: Uuid, input: CategoryInput) -> AppResult<Category> {
        let name = normalized_name(&input)?;
        self.repository.categories.rename(id, name).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.categories.delete(id).await
    }
}
