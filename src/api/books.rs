//! Catalog and book lifecycle endpoints

use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookDetails, BookQuery, CreateBook, UpdateBook},
        user::Role,
    },
    AppState,
};

use super::{response::ApiResponse, AuthenticatedUser, OptionalUser, ValidJson, ValidQuery};

/// Paginated response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Page content
    pub items: Vec<T>,
    /// Total number of matching entries
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Entries per page
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, page: i64, limit: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

/// Approval request body
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ApproveRequest {
    /// User holding the reservation
    pub user_id: Uuid,
}

async fn search(
    state: &AppState,
    query: &BookQuery,
    viewer: Option<Uuid>,
) -> AppResult<ApiResponse<PaginatedResponse<BookDetails>>> {
    let (books, total) = state.services.catalog.search_books(query, viewer).await?;
    Ok(ApiResponse::ok(
        "Books retrieved",
        PaginatedResponse::new(books, total, query.page(), query.limit()),
    ))
}

/// List books with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = PaginatedResponse<BookDetails>),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    ValidQuery(query): ValidQuery<BookQuery>,
) -> AppResult<ApiResponse<PaginatedResponse<BookDetails>>> {
    search(&state, &query, viewer.map(|u| u.id)).await
}

/// Admin book listing, including holder details
#[utoipa::path(
    get,
    path = "/books/admin",
    tag = "books",
    security(("session_cookie" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = PaginatedResponse<BookDetails>),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn list_books_admin(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidQuery(query): ValidQuery<BookQuery>,
) -> AppResult<ApiResponse<PaginatedResponse<BookDetails>>> {
    user.require_admin()?;
    search(&state, &query, Some(user.id)).await
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = BookDetails),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<BookDetails>> {
    let book = state.services.catalog.get_book(id, viewer.map(|u| u.id)).await?;
    Ok(ApiResponse::ok("Book retrieved", book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books/add",
    tag = "books",
    security(("session_cookie" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid book", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    ValidJson(book): ValidJson<CreateBook>,
) -> AppResult<ApiResponse<Book>> {
    user.require_admin()?;
    let book = state.services.catalog.create_book(book).await?;
    Ok(ApiResponse::created("Book created", book))
}

/// Edit descriptive fields of a book
#[utoipa::path(
    put,
    path = "/books/edit/{id}",
    tag = "books",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(book): ValidJson<UpdateBook>,
) -> AppResult<ApiResponse<Book>> {
    user.require_admin()?;
    let book = state.services.catalog.update_book(id, book).await?;
    Ok(ApiResponse::ok("Book updated", book))
}

/// Delete an available book
#[utoipa::path(
    delete,
    path = "/books/delete/{id}",
    tag = "books",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted"),
        (status = 400, description = "Book is reserved or borrowed", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<()>> {
    user.require_admin()?;
    state.services.catalog.delete_book(id).await?;
    Ok(ApiResponse::ok("Book deleted", ()))
}

/// Reserve an available book for the caller
#[utoipa::path(
    put,
    path = "/books/reserve/{id}",
    tag = "lifecycle",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book reserved", body = Book),
        (status = 400, description = "Book not available or caller already engaged", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reserve_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<Book>> {
    user.require_role(Role::User)?;
    let book = state.services.lifecycle.reserve(id, user.id).await?;
    Ok(ApiResponse::ok("Book reserved", book))
}

/// Approve a reservation, turning it into a borrowing
#[utoipa::path(
    put,
    path = "/books/approve/{id}",
    tag = "lifecycle",
    security(("session_cookie" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Reservation approved", body = Book),
        (status = 400, description = "Book not reserved by this user", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn approve_book(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    ValidJson(request): ValidJson<ApproveRequest>,
) -> AppResult<ApiResponse<Book>> {
    user.require_admin()?;
    let (book, _) = state.services.lifecycle.approve(id, request.user_id).await?;
    Ok(ApiResponse::ok("Reservation approved", book))
}
