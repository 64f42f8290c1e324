use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, Set,
};
use tokio::task;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::StoreError;
use crate::db::cascade::{self, CascadeError, CascadeReport, CascadeTarget};
use crate::db::query::{ListQuery, Page, PageSpec, SortField, SortSpec, column};
use crate::domain::{Role, SortOrder, UserId};
use crate::entities::{prelude::*, users};
use crate::models::user::User;

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Substring of the username or the email.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Username,
    Email,
    Role,
    CreatedAt,
}

impl SortField for UserSort {
    const DEFAULT: Self = Self::CreatedAt;
    const DEFAULT_ORDER: SortOrder = SortOrder::Descending;

    fn from_param(raw: &str) -> Option<Self> {
        match raw.trim() {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "role" => Some(Self::Role),
            "created_at" | "createdAt" => Some(Self::CreatedAt),
            _ => None,
        }
    }

    fn expr(self) -> SimpleExpr {
        let col = match self {
            Self::Username => users::Column::Username,
            Self::Email => users::Column::Email,
            Self::Role => users::Column::Role,
            Self::CreatedAt => users::Column::CreatedAt,
        };
        Expr::col(column(Users, col)).into()
    }

    fn tie_breaker() -> SimpleExpr {
        Expr::col(column(Users, users::Column::Id)).into()
    }
}

/// Row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Column changes for an existing account; the password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(
        &self,
        filter: &UserFilter,
        sort: SortSpec<UserSort>,
        page: PageSpec,
    ) -> Result<Page<User>, StoreError> {
        let query = ListQuery::new(sort, page)
            .equals_opt(
                column(Users, users::Column::Role),
                filter.role.map(Role::as_str),
            )
            .contains_any(
                vec![
                    column(Users, users::Column::Username),
                    column(Users, users::Column::Email),
                ],
                filter.search.as_deref(),
            );

        let page = query.fetch(Users::find(), &self.conn).await?;
        Ok(page.map(User::from))
    }

    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let user = Users::find_by_id(id.value()).one(&self.conn).await?;
        Ok(user.map(User::from))
    }

    /// Get user by username with password hash (for login)
    pub async fn get_by_username_with_password(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, StoreError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Verify API key and return the associated user
    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<User>, StoreError> {
        let user = Users::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await?;

        Ok(user.map(User::from))
    }

    pub async fn get_api_key(&self, id: UserId) -> Result<Option<String>, StoreError> {
        let user = Users::find_by_id(id.value()).one(&self.conn).await?;
        Ok(user.map(|u| u.api_key))
    }

    /// Whether another account already uses `username` or `email`.
    pub async fn is_taken(
        &self,
        username: Option<&str>,
        email: Option<&str>,
        except: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let mut any = Condition::any();
        if let Some(username) = username {
            any = any.add(users::Column::Username.eq(username));
        }
        if let Some(email) = email {
            any = any.add(users::Column::Email.eq(email));
        }
        if any.is_empty() {
            return Ok(false);
        }

        let mut query = Users::find().filter(any);
        if let Some(except) = except {
            query = query.filter(users::Column::Id.ne(except.value()));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    /// Inserts the account with a fresh API key; returns the user and the key.
    pub async fn create(&self, record: UserRecord) -> Result<(User, String), StoreError> {
        let api_key = generate_api_key();
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = users::ActiveModel {
            username: Set(record.username),
            email: Set(record.email),
            password_hash: Set(record.password_hash),
            role: Set(record.role.as_str().to_string()),
            api_key: Set(api_key.clone()),
            created_at: Set(now),
            ..Default::default()
        };

        let model = active_model.insert(&self.conn).await?;
        info!(user_id = model.id, username = %model.username, "Created user");
        Ok((model.into(), api_key))
    }

    pub async fn update(
        &self,
        id: UserId,
        changes: UserChanges,
    ) -> Result<Option<User>, StoreError> {
        let Some(user) = Users::find_by_id(id.value()).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        if let Some(username) = changes.username {
            active.username = Set(username);
        }
        if let Some(email) = changes.email {
            active.email = Set(email);
        }
        if let Some(password_hash) = changes.password_hash {
            active.password_hash = Set(password_hash);
        }
        if let Some(bio) = changes.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(profile_pic) = changes.profile_pic {
            active.profile_pic = Set(Some(profile_pic));
        }

        let updated = active.update(&self.conn).await?;
        Ok(Some(updated.into()))
    }

    /// Regenerate API key for a user
    pub async fn regenerate_api_key(&self, id: UserId) -> Result<String, StoreError> {
        let user = Users::find_by_id(id.value())
            .one(&self.conn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("User {id}")))?;

        let new_api_key = generate_api_key();

        let mut active: users::ActiveModel = user.into();
        active.api_key = Set(new_api_key.clone());
        active.update(&self.conn).await?;

        Ok(new_api_key)
    }

    /// Removes the account with its comments, threads and watchlist.
    pub async fn delete(&self, id: UserId) -> Result<CascadeReport, CascadeError> {
        cascade::delete_cascade(&self.conn, CascadeTarget::User(id)).await
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None, // output length (use default)
    )
    .map_err(|e| StoreError::Internal(format!("Invalid Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| StoreError::Internal(format!("Failed to hash password: {e}")))?;

    Ok(hash.to_string())
}

/// Hashes on the blocking pool; Argon2 is CPU-intensive.
pub async fn hash_password_blocking(
    password: String,
    config: SecurityConfig,
) -> Result<String, StoreError> {
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .map_err(|e| StoreError::Internal(format!("Password hashing task panicked: {e}")))?
}

/// Checks `password` against a stored PHC hash string on the blocking pool.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, StoreError> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| StoreError::Internal(format!("Invalid password hash format: {e}")))?;

        // Parameters are read from the hash itself
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| StoreError::Internal(format!("Password verification task panicked: {e}")))?
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
