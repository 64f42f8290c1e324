//! `SeaORM` implementation of the `UserService` trait.

use crate::config::Config;
use crate::db::repositories::user::{UserChanges, UserFilter, UserSort, hash_password_blocking};
use crate::db::{CascadeReport, Page, PageSpec, SortSpec, Store};
use crate::domain::{AuthUser, UserId};
use crate::models::user::{User, UserUpdate};
use crate::services::user_service::{UserError, UserService};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

pub struct SeaOrmUserService {
    store: Arc<Store>,
    config: Arc<RwLock<Config>>,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Arc<Store>, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list_users(
        &self,
        filter: UserFilter,
        sort: SortSpec<UserSort>,
        page: PageSpec,
    ) -> Result<Page<User>, UserError> {
        Ok(self.store.user_repo().list(&filter, sort, page).await?)
    }

    async fn get_user(&self, id: UserId) -> Result<User, UserError> {
        self.store
            .user_repo()
            .get_by_id(id)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    async fn update_user(
        &self,
        actor: &AuthUser,
        id: UserId,
        changes: UserUpdate,
    ) -> Result<User, UserError> {
        if !actor.can_manage(id) {
            return Err(UserError::Forbidden(id));
        }

        if changes.is_empty() {
            return Err(UserError::Validation("No fields to update".to_string()));
        }

        let repo = self.store.user_repo();
        if repo.get_by_id(id).await?.is_none() {
            return Err(UserError::NotFound(id));
        }

        if repo
            .is_taken(changes.username.as_deref(), changes.email.as_deref(), Some(id))
            .await?
        {
            return Err(UserError::Conflict(
                "Username or email already in use".to_string(),
            ));
        }

        let password_hash = match changes.password {
            Some(password) => {
                let security = self.config.read().await.security.clone();
                if password.len() < security.min_password_length {
                    return Err(UserError::Validation(format!(
                        "Password must be at least {} characters",
                        security.min_password_length
                    )));
                }
                Some(hash_password_blocking(password, security).await?)
            }
            None => None,
        };

        let updated = repo
            .update(
                id,
                UserChanges {
                    username: changes.username,
                    email: changes.email,
                    password_hash,
                    bio: changes.bio,
                    profile_pic: changes.profile_pic,
                },
            )
            .await?
            .ok_or(UserError::NotFound(id))?;

        info!(user_id = id.value(), actor = actor.id.value(), "Updated user");
        Ok(updated)
    }

    async fn delete_user(&self, id: UserId) -> Result<CascadeReport, UserError> {
        let report = self.store.user_repo().delete(id).await?;
        info!(user_id = id.value(), rows = report.total(), "Deleted user");
        Ok(report)
    }
}
