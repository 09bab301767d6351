//! Borrowing endpoints

use axum::extract::State;

use crate::{
    error::AppResult,
    models::{
        borrowing::{Borrowing, BorrowingDetails, BorrowingKey},
        user::Role,
    },
    AppState,
};

use super::{response::ApiResponse, AuthenticatedUser, ValidJson};

/// List every borrowing with user and book summary
#[utoipa::path(
    get,
    path = "/borrowings",
    tag = "borrowings",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "All borrowings", body = Vec<BorrowingDetails>),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_borrowings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<BorrowingDetails>>> {
    user.require_admin()?;
    let borrowings = state.services.borrowings.list_all().await?;
    Ok(ApiResponse::ok("Borrowings retrieved", borrowings))
}

/// List the caller's borrowings
#[utoipa::path(
    get,
    path = "/borrowings/user",
    tag = "borrowings",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Caller's borrowings", body = Vec<BorrowingDetails>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_borrowings(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> AppResult<ApiResponse<Vec<BorrowingDetails>>> {
    user.require_role(Role::User)?;
    let borrowings = state.services.borrowings.list_for_user(user.id).await?;
    Ok(ApiResponse::ok("Borrowings retrieved", borrowings))
}

/// Record a borrowing for a book reserved by the given user
#[utoipa::path(
    post,
    path = "/borrowings/add",
    tag = "lifecycle",
    security(("session_cookie" = [])),
    request_body = BorrowingKey,
    responses(
        (status = 201, description = "Borrowing created", body = Borrowing),
        (status = 400, description = "Book not reserved by this user", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(key): ValidJson<BorrowingKey>,
) -> AppResult<ApiResponse<Borrowing>> {
    user.require_admin()?;
    let (_, borrowing) = state.services.lifecycle.approve(key.book_id, key.user_id).await?;
    Ok(ApiResponse::created("Borrowing created", borrowing))
}

/// Mark a borrowed book as returned
#[utoipa::path(
    put,
    path = "/borrowings/returned",
    tag = "lifecycle",
    security(("session_cookie" = [])),
    request_body = BorrowingKey,
    responses(
        (status = 201, description = "Borrowing closed", body = Borrowing),
        (status = 404, description = "No open borrowing for this user and book", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_borrowing(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(key): ValidJson<BorrowingKey>,
) -> AppResult<ApiResponse<Borrowing>> {
    user.require_admin()?;
    let (_, borrowing) = state.services.lifecycle.return_book(key.book_id, key.user_id).await?;
    Ok(ApiResponse::created("Book returned", borrowing))
}
