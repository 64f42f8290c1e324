//! `SeaORM` implementation of the `AuthService` trait.

use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::user::{UserRecord, hash_password_blocking, verify_password};
use crate::domain::{AuthUser, UserId};
use crate::models::user::User;
use crate::services::auth_service::{AuthError, AuthService, LoginResult, Registration};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub struct SeaOrmAuthService {
    store: Arc<Store>,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Arc<Store>, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

fn identity(user: User) -> AuthUser {
    AuthUser {
        id: UserId::new(user.id),
        username: user.username,
        role: user.role,
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<LoginResult, AuthError> {
        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_string();
        if username.is_empty() || email.is_empty() {
            return Err(AuthError::Validation(
                "username and email are required".to_string(),
            ));
        }

        let security = self.config.read().await.security.clone();
        if registration.password.len() < security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                security.min_password_length
            )));
        }

        let repo = self.store.user_repo();
        if repo.is_taken(Some(&username), Some(&email), None).await? {
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = hash_password_blocking(registration.password, security).await?;
        let (user, token) = repo
            .create(UserRecord {
                username,
                email,
                password_hash,
                role: registration.role,
            })
            .await?;

        Ok(LoginResult { token, user })
    }

    async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AuthError> {
        let repo = self.store.user_repo();

        let Some((user, password_hash)) = repo.get_by_username_with_password(username).await?
        else {
            warn!(username, "Login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password.to_string(), password_hash).await? {
            warn!(username, "Login attempt with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let token = repo
            .get_api_key(UserId::new(user.id))
            .await?
            .ok_or(AuthError::UserNotFound)?;

        info!(user_id = user.id, "User logged in");
        Ok(LoginResult { token, user })
    }

    async fn authenticate_api_key(&self, api_key: &str) -> Result<Option<AuthUser>, AuthError> {
        let user = self.store.user_repo().get_by_api_key(api_key).await?;
        Ok(user.map(identity))
    }

    async fn authenticate_user_id(&self, id: UserId) -> Result<Option<AuthUser>, AuthError> {
        let user = self.store.user_repo().get_by_id(id).await?;
        Ok(user.map(identity))
    }

    async fn regenerate_api_key(&self, id: UserId) -> Result<String, AuthError> {
        let key = self.store.user_repo().regenerate_api_key(id).await?;
        info!(user_id = id.value(), "Regenerated API key");
        Ok(key)
    }
}
