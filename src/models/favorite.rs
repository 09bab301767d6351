use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A book marked as favorite by a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Favorite {
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub created_at: DateTime<Utc>,
}
