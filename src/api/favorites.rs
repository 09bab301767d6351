//! Favorite endpoints

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{favorite::Favorite, user::Role},
    AppState,
};

use super::{response::ApiResponse, AuthenticatedUser};

#[utoipa::path(
    post,
    path = "/favorites/{book_id}",
    tag = "favorites",
    security(("session_cookie" = [])),
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book added to favorites", body = Favorite),
        (status = 400, description = "Already a favorite", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<ApiResponse<Favorite>> {
    user.require_role(Role::User)?;
    let favorite = state.services.favorites.add(user.id, book_id).await?;
    Ok(ApiResponse::ok("Book added to favorites", favorite))
}

#[utoipa::path(
    delete,
    path = "/favorites/unfavorite/{book_id}",
    tag = "favorites",
    security(("session_cookie" = [])),
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book removed from favorites"),
        (status = 404, description = "Not a favorite", body = crate::error::ErrorResponse)
    )
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(book_id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    user.require_role(Role::User)?;
    state.services.favorites.remove(user.id, book_id).await?;
    Ok(ApiResponse::ok("Book removed from favorites", ()))
}
