//! Authentication endpoints

use axum::{extract::State, http::HeaderMap};
use axum_extra::extract::{
    cookie::{Cookie, SameSite},
    CookieJar,
};

use crate::{
    config::SessionConfig,
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterRequest, User},
    AppState,
};

use super::{response::ApiResponse, session_token, ValidJson};

fn session_cookie(config: &SessionConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.max_age_days))
        .build()
}

/// Register a reader account
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = User),
        (status = 400, description = "Invalid payload or email already registered", body = crate::error::ErrorResponse),
        (status = 403, description = "Admin domain addresses cannot register", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<RegisterRequest>,
) -> AppResult<ApiResponse<User>> {
    let user = state.services.users.register(request).await?;
    Ok(ApiResponse::created("Registration successful", user))
}

/// Sign in and receive the session cookie
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in, session cookie set", body = User),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(request): ValidJson<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<User>)> {
    let (session, user) = state.services.users.login(request).await?;
    let jar = jar.add(session_cookie(&state.config.session, session.access_token));
    Ok((jar, ApiResponse::ok("Login successful", user)))
}

/// Sign out and clear the session cookie
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Signed out"),
        (status = 400, description = "No active session", body = crate::error::ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<()>)> {
    let cookie_name = state.config.session.cookie_name.clone();
    let token = session_token(&headers, &cookie_name)
        .ok_or_else(|| AppError::BadRequest("No active session".to_string()))?;

    if let Err(e) = state.services.users.logout(&token).await {
        tracing::warn!(error = %e, "Identity provider sign-out failed");
    }

    let jar = jar.remove(Cookie::build(cookie_name).path("/"));
    Ok((jar, ApiResponse::ok("Logout successful", ())))
}
