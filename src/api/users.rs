//! Profile endpoints

use axum::extract::State;

use crate::{error::AppResult, models::user::User, AppState};

use super::{response::ApiResponse, AuthenticatedUser, OptionalUser};

/// Current user profile; `data` is null for anonymous callers
#[utoipa::path(
    get,
    path = "/",
    tag = "users",
    responses(
        (status = 200, description = "Current user, null data when anonymous", body = User)
    )
)]
pub async fn current_user(
    State(state): State<AppState>,
    OptionalUser(session): OptionalUser,
) -> AppResult<ApiResponse<Option<User>>> {
    let Some(session) = session else {
        return Ok(ApiResponse::ok("Anonymous", None));
    };

    let user = state.services.users.get_profile(session.id).await?;
    Ok(ApiResponse::ok("Profile retrieved", Some(user)))
}

/// Admin profile
#[utoipa::path(
    get,
    path = "/admin",
    tag = "users",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Admin profile", body = User),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required")
    )
)]
pub async fn admin_profile(
    State(state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
) -> AppResult<ApiResponse<User>> {
    session.require_admin()?;
    let user = state.services.users.get_profile(session.id).await?;
    Ok(ApiResponse::ok("Admin profile retrieved", user))
}
