//! Identity provider client (GoTrue-compatible REST API)
//!
//! Session tokens are the provider's HS256 access tokens; they are verified
//! locally with the shared JWT secret. Account creation, password sign-in and
//! sign-out are delegated to the provider over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::{
    config::IdentityConfig,
    error::{AppError, AppResult},
};

/// User as known by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Session returned by a successful password sign-in
#[derive(Debug, Clone, Deserialize)]
pub struct IdentitySession {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub user: IdentityUser,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> AppResult<IdentityUser>;

    /// Create a confirmed account
    async fn create_user(&self, email: &str, password: &str, name: &str) -> AppResult<IdentityUser>;

    /// Remove an account created by `create_user`
    async fn delete_user(&self, id: Uuid) -> AppResult<()>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<IdentitySession>;

    /// Revoke the session behind an access token
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: Uuid,
    email: Option<String>,
    exp: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderError {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

impl ProviderError {
    fn into_message(self, status: reqwest::StatusCode) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| format!("identity provider returned {}", status))
    }
}

#[derive(Clone)]
pub struct GoTrueIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl GoTrueIdentityProvider {
    pub fn new(config: &IdentityConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[config.audience.as_str()]);

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn verify(&self, access_token: &str) -> AppResult<IdentityUser> {
        let data = decode::<AccessClaims>(access_token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!("Rejected access token: {}", e);
                AppError::Authentication("Invalid or expired session".to_string())
            })?;

        Ok(IdentityUser {
            id: data.claims.sub,
            email: data.claims.email,
        })
    }
}

/// Split a provider response into its body or a `(status, message)` failure
async fn read_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> AppResult<Result<T, (reqwest::StatusCode, String)>> {
    let status = response.status();
    if status.is_success() {
        let body = response
            .json::<T>()
            .await
            .map_err(|e| AppError::Identity(format!("Malformed provider response: {}", e)))?;
        return Ok(Ok(body));
    }

    let error: ProviderError = response.json().await.unwrap_or_default();
    Ok(Err((status, error.into_message(status))))
}

fn transport_error(e: reqwest::Error) -> AppError {
    AppError::Identity(e.to_string())
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    async fn get_user(&self, access_token: &str) -> AppResult<IdentityUser> {
        self.verify(access_token)
    }

    async fn create_user(&self, email: &str, password: &str, name: &str) -> AppResult<IdentityUser> {
        let response = self
            .http
            .post(self.endpoint("admin/users"))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": { "name": name },
            }))
            .send()
            .await
            .map_err(transport_error)?;

        match read_response::<IdentityUser>(response).await? {
            Ok(user) => Ok(user),
            Err((status, message)) if status.is_client_error() => Err(AppError::BadRequest(message)),
            Err((_, message)) => Err(AppError::Identity(message)),
        }
    }

    async fn delete_user(&self, id: Uuid) -> AppResult<()> {
        let response = self
            .http
            .delete(self.endpoint(&format!("admin/users/{}", id)))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error: ProviderError = response.json().await.unwrap_or_default();
        Err(AppError::Identity(error.into_message(status)))
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> AppResult<IdentitySession> {
        let response = self
            .http
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(transport_error)?;

        match read_response::<IdentitySession>(response).await? {
            Ok(session) => Ok(session),
            Err((status, message)) if status.is_client_error() => {
                Err(AppError::Authentication(message))
            }
            Err((_, message)) => Err(AppError::Identity(message)),
        }
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http
            .post(self.endpoint("logout"))
            .header("apikey", &self.api_key)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let error: ProviderError = response.json().await.unwrap_or_default();
        let message = error.into_message(status);
        if status.is_client_error() {
            Err(AppError::BadRequest(message))
        } else {
            Err(AppError::Identity(message))
        }
    }
}
