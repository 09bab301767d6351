//! Category endpoints

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::category::{Category, CategoryInput},
    AppState,
};

use super::{response::ApiResponse, AuthenticatedUser, ValidJson};

#[utoipa::path(
    get,
    path = "/categories",
    tag = "categories",
    responses(
        (status = 200, description = "All categories", body = Vec<Category>)
    )
)]
pub async fn list_categories(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<Category>>> {
    let categories = state.services.categories.list().await?;
    Ok(ApiResponse::ok("Categories retrieved", categories))
}

#[utoipa::path(
    post,
    path = "/categories/add",
    tag = "categories",
    security(("session_cookie" = [])),
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, description = "Invalid or duplicate name", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(input): ValidJson<CategoryInput>,
) -> AppResult<ApiResponse<Category>> {
    user.require_admin()?;
    let category = state.services.categories.create(input).await?;
    Ok(ApiResponse::created("Category created", category))
}

#[utoipa::path(
    put,
    path = "/categories/edit/{id}",
    tag = "categories",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category renamed", body = Category),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(input): ValidJson<CategoryInput>,
) -> AppResult<ApiResponse<Category>> {
    user.require_admin()?;
    let category = state.services.categories.rename(id, input).await?;
    Ok(ApiResponse::ok("Category updated", category))
}

#[utoipa::path(
    delete,
    path = "/categories/delete/{id}",
    tag = "categories",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category still has books", body = crate::error::ErrorResponse),
        (status = 404, description = "Category not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    user.require_admin()?;
    state.services.categories.delete(id).await?;
    Ok(ApiResponse::ok("Category deleted", ()))
}
