//! Bookshelf library management server
//!
//! REST JSON API for a small library catalog: books move from available to
//! reserved to borrowed and back, with a daily job releasing stale reservations.

use std::sync::Arc;

pub mod api;
pub mod background;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
