//! API handlers for the Bookshelf REST endpoints

pub mod auth;
pub mod books;
pub mod borrowings;
pub mod categories;
pub mod favorites;
pub mod health;
pub mod openapi;
pub mod response;
pub mod users;

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequest, FromRequestParts, Query, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{error::AppError, models::user::SessionUser, AppState};

/// Session token from the session cookie, or from an `Authorization: Bearer` header
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for the authenticated caller
pub struct AuthenticatedUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.session.cookie_name)
            .ok_or_else(|| AppError::Authentication("Missing session token".to_string()))?;

        let user = state.services.users.resolve_session(&token).await?;
        Ok(AuthenticatedUser(user))
    }
}

/// Extractor for endpoints open to anonymous callers; an invalid session counts as anonymous
pub struct OptionalUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers, &state.config.session.cookie_name) else {
            return Ok(OptionalUser(None));
        };

        match state.services.users.resolve_session(&token).await {
            Ok(user) => Ok(OptionalUser(Some(user))),
            Err(AppError::Authentication(_) | AppError::Authorization(_)) => Ok(OptionalUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// JSON body extractor that validates the payload and rejects with the error envelope
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidJson(value))
    }
}

/// Query string extractor that rejects with the error envelope
pub struct ValidQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| AppError::Validation(rejection.body_text()))?;
        value.validate()?;
        Ok(ValidQuery(value))
    }
}

/// Build the API router with all routes
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        // Profiles
        .route("/", get(users::current_user))
        .route("/admin", get(users::admin_profile))
        // Books
        .route("/books", get(books::list_books))
        .route("/books/admin", get(books::list_books_admin))
        .route("/books/add", post(books::create_book))
        .route("/books/edit/:id", put(books::update_book))
        .route("/books/delete/:id", delete(books::delete_book))
        .route("/books/reserve/:id", put(books::reserve_book))
        .route("/books/approve/:id", put(books::approve_book))
        .route("/books/:id", get(books::get_book))
        // Borrowings
        .route("/borrowings", get(borrowings::list_borrowings))
        .route("/borrowings/user", get(borrowings::list_my_borrowings))
        .route("/borrowings/add", post(borrowings::add_borrowing))
        .route("/borrowings/returned", put(borrowings::return_borrowing))
        // Categories
        .route("/categories", get(categories::list_categories))
        .route("/categories/add", post(categories::create_category))
        .route("/categories/edit/:id", put(categories::update_category))
        .route("/categories/delete/:id", delete(categories::delete_category))
        // Favorites
        .route("/favorites/:book_id", post(favorites::add_favorite))
        .route("/favorites/unfavorite/:book_id", delete(favorites::remove_favorite))
        .with_state(state)
        .merge(openapi::create_openapi_router())
}
