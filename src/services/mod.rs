//! Business logic services

pub mod borrowings;
pub mod catalog;
pub mod categories;
pub mod favorites;
pub mod identity;
pub mod lifecycle;
pub mod users;

use std::sync::Arc;

use crate::{
    config::ReservationsConfig,
    error::AppResult,
    repository::{LifecycleStore, Repository},
};
use identity::IdentityProvider;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    repository: Repository,
    pub borrowings: borrowings::BorrowingsService,
    pub catalog: catalog::CatalogService,
    pub categories: categories::CategoriesService,
    pub favorites: favorites::FavoritesService,
    pub lifecycle: lifecycle::LifecycleService,
    pub users: users::UsersService,
}

impl Services {
    pub fn new(
        repository: Repository,
        lifecycle_store: Arc<dyn LifecycleStore>,
        identity: Arc<dyn IdentityProvider>,
        reservations: &ReservationsConfig,
    ) -> Self {
        Self {
            borrowings: borrowings::BorrowingsService::new(repository.clone()),
            catalog: catalog::CatalogService::new(repository.clone()),
            categories: categories::CategoriesService::new(repository.clone()),
            favorites: favorites::FavoritesService::new(repository.clone()),
            lifecycle: lifecycle::LifecycleService::new(lifecycle_store, reservations.expiry()),
            users: users::UsersService::new(repository.clone(), identity),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await?;
        Ok(())
    }
}
