//! User repository.

use std::sync::Arc;

use super::{db_err, like_pattern, write_err};
use crate::entities::{User, user};
use platebook_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::{Expr, extension::postgres::PgExpr},
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id).one(self.db.as_ref()).await.map_err(db_err)
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(write_err("Username or email already exists"))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(write_err("Username or email already exists"))
    }

    /// List users, newest first, optionally matching `search` against
    /// username, email and name.
    pub async fn find_paginated(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> AppResult<(Vec<user::Model>, u64)> {
        let mut query = User::find();

        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = like_pattern(term.trim());
            query = query.filter(
                Condition::any()
                    .add(Expr::col(user::Column::Username).ilike(&pattern))
                    .add(Expr::col(user::Column::Email).ilike(&pattern))
                    .add(Expr::col(user::Column::Name).ilike(&pattern)),
            );
        }

        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let users = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_desc(user::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((users, total))
    }

    /// Set the banned flag.
    pub async fn set_banned(&self, id: &str, banned: bool) -> AppResult<user::Model> {
        let user = self.get_by_id(id).await?;
        let mut active: user::ActiveModel = user.into();
        active.is_banned = Set(banned);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.update(active).await
    }
}
