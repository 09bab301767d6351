//! Authentication and user profile service

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginRequest, RegisterRequest, Role, SessionUser, User},
    repository::Repository,
    services::identity::{IdentityProvider, IdentitySession},
};

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    identity: Arc<dyn IdentityProvider>,
}

impl UsersService {
    pub fn new(repository: Repository, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { repository, identity }
    }

    /// Register a reader account with the identity provider and the users table.
    /// Addresses in the admin domain cannot self-register.
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request.validate()?;
        if request.uses_admin_domain() {
            return Err(AppError::Authorization(
                "Admin accounts cannot be registered".to_string(),
            ));
        }

        let identity = self
            .identity
            .create_user(&request.email, &request.password, &request.name)
            .await?;
        let email = identity.email.as_deref().unwrap_or(&request.email);
        let user = match self
            .repository
            .users
            .create(identity.id, email, &request.name, Role::User)
            .await
        {
            Ok(user) => user,
            Err(e) => {
                self.discard_identity(identity.id).await;
                return Err(e);
            }
        };

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Roll back a provider account whose profile row could not be written
    async fn discard_identity(&self, identity_id: Uuid) {
        match self.identity.delete_user(identity_id).await {
            Ok(()) => tracing::warn!(%identity_id, "Removed identity account after profile creation failed"),
            Err(e) => tracing::error!(
                %identity_id,
                error = %e,
                "Profile creation failed and the identity account could not be removed"
            ),
        }
    }

    /// Sign in with email and password
    pub async fn login(&self, request: LoginRequest) -> AppResult<(IdentitySession, User)> {
        request.validate()?;
        let session = self
            .identity
            .sign_in_with_password(&request.email, &request.password)
            .await?;

        let user = match self.repository.users.get_by_id(session.user.id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Account is not registered".to_string()))
            }
            Err(e) => return Err(e),
        };

        tracing::info!(user_id = %user.id, "User signed in");
        Ok((session, user))
    }

    pub async fn logout(&self, access_token: &str) -> AppResult<()> {
        self.identity.sign_out(access_token).await
    }

    /// Resolve the caller behind a session token, with the role from the users table
    pub async fn resolve_session(&self, access_token: &str) -> AppResult<SessionUser> {
        let identity = self.identity.get_user(access_token).await?;
        let role = self
            .repository
            .users
            .find_role(identity.id)
            .await?
            .ok_or_else(|| AppError::Authorization("User has no role".to_string()))?;

        Ok(SessionUser {
            id: identity.id,
            email: identity.email,
            role,
        })
    }

    pub async fn get_profile(&self, id: Uuid) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }
}
