//! User service.

use crate::services::auth::{TokenService, hash_password, verify_password};
use platebook_common::{AppError, AppResult, IdGenerator, PageRequest, Paginated};
use platebook_db::{
    entities::{
        loved_restaurant, restaurant,
        user::{self, UserRole},
    },
    repositories::{LovedRestaurantRepository, RestaurantRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Input for registering an account.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(length(max = 128))]
    pub name: Option<String>,
}

/// Input for logging in. `login` is a username or an email address.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[serde(alias = "email", alias = "username")]
    #[validate(length(min = 1, message = "Username or email is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Input for updating one's own profile.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 128))]
    pub name: Option<String>,

    #[validate(url(message = "Invalid avatar URL"))]
    pub avatar_url: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

/// Input for changing the password.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordInput {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

/// A freshly authenticated user.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: user::Model,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    loved_repo: LovedRestaurantRepository,
    restaurant_repo: RestaurantRepository,
    tokens: TokenService,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        loved_repo: LovedRestaurantRepository,
        restaurant_repo: RestaurantRepository,
        tokens: TokenService,
    ) -> Self {
        Self {
            user_repo,
            loved_repo,
            restaurant_repo,
            tokens,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a regular account and sign it in.
    pub async fn register(&self, input: RegisterInput) -> AppResult<AuthSession> {
        let user = self.create_account(input, UserRole::User).await?;
        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }

    /// Create an administrator account. The caller must be an admin.
    pub async fn register_admin(
        &self,
        caller: &user::Model,
        input: RegisterInput,
    ) -> AppResult<user::Model> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        let user = self.create_account(input, UserRole::Admin).await?;
        tracing::info!(admin_id = %caller.id, user_id = %user.id, "Admin account created");
        Ok(user)
    }

    async fn create_account(&self, input: RegisterInput, role: UserRole) -> AppResult<user::Model> {
        input.validate()?;

        let username = input.username.trim().to_string();
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(AppError::invalid_field(
                "username",
                "Username may contain letters, digits, '_' and '.' only",
            ));
        }
        let email = input.email.trim().to_lowercase();

        if self.user_repo.find_by_username(&username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = hash_password(&input.password)?;

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username_lower: Set(username.to_lowercase()),
            username: Set(username),
            email: Set(email),
            password_hash: Set(password_hash),
            name: Set(input.name.filter(|n| !n.trim().is_empty())),
            avatar_url: Set(None),
            role: Set(role),
            is_banned: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and issue a token.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        input.validate()?;
        let login = input.login.trim();

        let found = if login.contains('@') {
            self.user_repo.find_by_email(login).await?
        } else {
            self.user_repo.find_by_username(login).await?
        };
        let user = found.ok_or(AppError::Unauthorized)?;

        if !verify_password(&input.password, &user.password_hash)? {
            tracing::debug!(user_id = %user.id, "Password mismatch");
            return Err(AppError::Unauthorized);
        }

        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }

    /// Resolve a bearer token to its user.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let claims = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(&claims.sub)
            .await?
            .ok_or(AppError::Unauthorized)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Update the caller's own profile.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.validate()?;
        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();

        if let Some(name) = input.name {
            let name = name.trim().to_string();
            active.name = Set(if name.is_empty() { None } else { Some(name) });
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }
        if let Some(email) = input.email {
            let email = email.trim().to_lowercase();
            if let Some(other) = self.user_repo.find_by_email(&email).await? {
                if other.id != user_id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
            active.email = Set(email);
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await
    }

    /// Replace the password after checking the current one.
    pub async fn change_password(&self, user_id: &str, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;
        let user = self.user_repo.get_by_id(user_id).await?;

        if !verify_password(&input.current_password, &user.password_hash)? {
            return Err(AppError::invalid_field(
                "currentPassword",
                "Current password is incorrect",
            ));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&input.new_password)?);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    /// List users (admin only).
    pub async fn list(
        &self,
        caller: &user::Model,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<Paginated<user::Model>> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        let (users, total) = self.user_repo.find_paginated(search, page).await?;
        Ok(Paginated::new(users, total, page))
    }

    /// Flip a user's ban flag (admin only).
    pub async fn toggle_ban(&self, caller: &user::Model, target_id: &str) -> AppResult<user::Model> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        if caller.id == target_id {
            return Err(AppError::Forbidden("You cannot ban yourself".to_string()));
        }

        let target = self.user_repo.get_by_id(target_id).await?;
        let updated = self.user_repo.set_banned(target_id, !target.is_banned).await?;

        tracing::info!(
            admin_id = %caller.id,
            user_id = %target_id,
            is_banned = updated.is_banned,
            "Ban state changed"
        );
        Ok(updated)
    }

    fn ensure_self_or_admin(caller: &user::Model, user_id: &str) -> AppResult<()> {
        if caller.id == user_id || caller.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "Cannot modify another user's loved restaurants".to_string(),
            ))
        }
    }

    /// Add a restaurant to a user's loved set.
    pub async fn love_restaurant(
        &self,
        caller: &user::Model,
        user_id: &str,
        restaurant_id: &str,
    ) -> AppResult<Vec<restaurant::Model>> {
        Self::ensure_self_or_admin(caller, user_id)?;
        self.user_repo.get_by_id(user_id).await?;
        self.restaurant_repo.get_by_id(restaurant_id).await?;

        if self.loved_repo.exists(user_id, restaurant_id).await? {
            return Err(AppError::Conflict("Restaurant already loved".to_string()));
        }

        self.loved_repo
            .create(loved_restaurant::ActiveModel {
                id: Set(self.id_gen.generate()),
                user_id: Set(user_id.to_string()),
                restaurant_id: Set(restaurant_id.to_string()),
                created_at: Set(chrono::Utc::now().into()),
            })
            .await?;

        self.loved_repo.find_restaurants_by_user(user_id).await
    }

    /// Remove a restaurant from a user's loved set.
    pub async fn unlove_restaurant(
        &self,
        caller: &user::Model,
        user_id: &str,
        restaurant_id: &str,
    ) -> AppResult<Vec<restaurant::Model>> {
        Self::ensure_self_or_admin(caller, user_id)?;

        if !self.loved_repo.delete(user_id, restaurant_id).await? {
            return Err(AppError::NotFound("Loved restaurant".to_string()));
        }

        self.loved_repo.find_restaurants_by_user(user_id).await
    }

    /// A user's loved restaurants.
    pub async fn loved_restaurants(&self, user_id: &str) -> AppResult<Vec<restaurant::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        self.loved_repo.find_restaurants_by_user(user_id).await
    }
}
