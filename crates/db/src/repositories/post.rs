//! Post repository.

use std::sync::Arc;

use super::db_err;
use crate::entities::{Post, post};
use platebook_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

/// Post listing filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFilter {
    pub post_type: Option<post::PostType>,
    pub author_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub dish_id: Option<String>,
    pub parent_id: Option<String>,
    /// Review state to match.
    pub reviewed: bool,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            post_type: None,
            author_id: None,
            restaurant_id: None,
            dish_id: None,
            parent_id: None,
            reviewed: true,
        }
    }
}

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id).one(self.db.as_ref()).await.map_err(db_err)
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post".to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Update a post.
    pub async fn update(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model.update(self.db.as_ref()).await.map_err(db_err)
    }

    /// Delete a post. Its comments, likes and notifications go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Post::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Post".to_string()));
        }
        Ok(())
    }

    /// Set the review flag.
    pub async fn set_reviewed(&self, id: &str, reviewed: bool) -> AppResult<post::Model> {
        let post = self.get_by_id(id).await?;
        let mut active: post::ActiveModel = post.into();
        active.reviewed = Set(reviewed);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.update(active).await
    }

    /// List posts, newest first.
    pub async fn find_paginated(
        &self,
        filter: &PostFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let mut query = Post::find().filter(post::Column::Reviewed.eq(filter.reviewed));

        if let Some(post_type) = filter.post_type {
            query = query.filter(post::Column::PostType.eq(post_type));
        }
        if let Some(id) = &filter.author_id {
            query = query.filter(post::Column::AuthorId.eq(id.as_str()));
        }
        if let Some(id) = &filter.restaurant_id {
            query = query.filter(post::Column::RestaurantId.eq(id.as_str()));
        }
        if let Some(id) = &filter.dish_id {
            query = query.filter(post::Column::DishId.eq(id.as_str()));
        }
        if let Some(id) = &filter.parent_id {
            query = query.filter(post::Column::ParentId.eq(id.as_str()));
        }

        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let posts = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((posts, total))
    }
}
