//! Post service.
//!
//! Feedback, dish feedback and comments share one table. The variant is
//! modelled as [`PostKind`], built exhaustively from client input and
//! re-derived from stored rows, so a post never carries another variant's
//! fields.

use crate::services::notification::NotificationService;
use platebook_common::{AppError, AppResult, IdGenerator, PageRequest, Paginated};
use platebook_db::{
    entities::{
        notification::NotificationType,
        post::{self, PostType},
        user,
    },
    repositories::{DishRepository, PostFilter, PostRepository, RestaurantRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use std::collections::HashMap;
use validator::Validate;

/// A star rating between 1 and 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i32> for Rating {
    type Error = AppError;

    fn try_from(value: i32) -> AppResult<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or_else(|| AppError::invalid_field("rating", "Rating must be between 1 and 5"))
    }
}

impl From<Rating> for i32 {
    fn from(rating: Rating) -> Self {
        Self::from(rating.0)
    }
}

/// Variant-specific part of a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostKind {
    Feedback { restaurant_id: String, rating: Rating },
    DishFeedback { dish_id: String, rating: Rating },
    Comment { parent_id: String },
}

impl PostKind {
    /// Stored discriminator.
    #[must_use]
    pub const fn post_type(&self) -> PostType {
        match self {
            Self::Feedback { .. } => PostType::Feedback,
            Self::DishFeedback { .. } => PostType::DishFeedback,
            Self::Comment { .. } => PostType::Comment,
        }
    }

    /// Rating, for rated variants.
    #[must_use]
    pub const fn rating(&self) -> Option<Rating> {
        match self {
            Self::Feedback { rating, .. } | Self::DishFeedback { rating, .. } => Some(*rating),
            Self::Comment { .. } => None,
        }
    }

    /// Rebuild the variant of a stored post.
    pub fn from_model(model: &post::Model) -> AppResult<Self> {
        let corrupt = || AppError::Internal(format!("Post {} has inconsistent variant fields", model.id));
        let rating = || -> AppResult<Rating> { Rating::try_from(model.rating.ok_or_else(corrupt)?) };

        match model.post_type {
            PostType::Feedback => Ok(Self::Feedback {
                restaurant_id: model.restaurant_id.clone().ok_or_else(corrupt)?,
                rating: rating()?,
            }),
            PostType::DishFeedback => Ok(Self::DishFeedback {
                dish_id: model.dish_id.clone().ok_or_else(corrupt)?,
                rating: rating()?,
            }),
            PostType::Comment => Ok(Self::Comment {
                parent_id: model.parent_id.clone().ok_or_else(corrupt)?,
            }),
        }
    }
}

/// Input for creating a post.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[serde(rename = "type")]
    pub post_type: PostType,

    pub restaurant_id: Option<String>,

    pub dish_id: Option<String>,

    pub parent_id: Option<String>,

    pub rating: Option<i32>,

    #[validate(length(max = 200))]
    pub caption: Option<String>,

    #[validate(length(min = 1, max = 5000, message = "Content is required"))]
    pub content: String,

    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 media URLs"))]
    pub media_urls: Vec<String>,
}

fn required(field: &str, value: Option<String>) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::invalid_field(field, format!("{field} is required")))
}

fn forbidden_field<T>(field: &str, value: Option<&T>) -> AppResult<()> {
    if value.is_some() {
        Err(AppError::invalid_field(field, format!("{field} is not allowed for this post type")))
    } else {
        Ok(())
    }
}

impl CreatePostInput {
    /// Validate the variant fields and split them off.
    fn take_kind(&mut self) -> AppResult<PostKind> {
        let restaurant_id = self.restaurant_id.take();
        let dish_id = self.dish_id.take();
        let parent_id = self.parent_id.take();
        let rating = self.rating.take();

        match self.post_type {
            PostType::Feedback => {
                forbidden_field("dishId", dish_id.as_ref())?;
                forbidden_field("parentId", parent_id.as_ref())?;
                let rating = rating.ok_or_else(|| AppError::invalid_field("rating", "rating is required"))?;
                Ok(PostKind::Feedback {
                    restaurant_id: required("restaurantId", restaurant_id)?,
                    rating: Rating::try_from(rating)?,
                })
            }
            PostType::DishFeedback => {
                forbidden_field("restaurantId", restaurant_id.as_ref())?;
                forbidden_field("parentId", parent_id.as_ref())?;
                let rating = rating.ok_or_else(|| AppError::invalid_field("rating", "rating is required"))?;
                Ok(PostKind::DishFeedback {
                    dish_id: required("dishId", dish_id)?,
                    rating: Rating::try_from(rating)?,
                })
            }
            PostType::Comment => {
                forbidden_field("restaurantId", restaurant_id.as_ref())?;
                forbidden_field("dishId", dish_id.as_ref())?;
                forbidden_field("rating", rating.as_ref())?;
                Ok(PostKind::Comment {
                    parent_id: required("parentId", parent_id)?,
                })
            }
        }
    }
}

/// Input for updating a post. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    #[validate(length(max = 200))]
    pub caption: Option<String>,

    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,

    pub rating: Option<i32>,

    #[validate(length(max = 10, message = "At most 10 media URLs"))]
    pub media_urls: Option<Vec<String>>,
}

/// Query parameters of the post listing.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    #[serde(rename = "type")]
    pub post_type: Option<PostType>,
    pub author_id: Option<String>,
    pub restaurant_id: Option<String>,
    pub dish_id: Option<String>,
    pub parent_id: Option<String>,
    pub reviewed: Option<bool>,
}

/// What a post is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostTarget {
    Restaurant { id: String, name: String },
    Dish { id: String, name: String, restaurant_id: String },
    Parent { id: String },
}

/// A post with its author and target resolved.
#[derive(Debug, Clone)]
pub struct PostDetail {
    pub post: post::Model,
    pub author: user::Model,
    pub target: PostTarget,
}

/// A post with its author, for listings. The author is absent only if
/// the row vanished between the two reads.
#[derive(Debug, Clone)]
pub struct PostSummary {
    pub post: post::Model,
    pub author: Option<user::Model>,
}

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    restaurant_repo: RestaurantRepository,
    dish_repo: DishRepository,
    notifications: NotificationService,
    id_gen: IdGenerator,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub fn new(
        post_repo: PostRepository,
        user_repo: UserRepository,
        restaurant_repo: RestaurantRepository,
        dish_repo: DishRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            post_repo,
            user_repo,
            restaurant_repo,
            dish_repo,
            notifications,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post.
    pub async fn create(&self, author: &user::Model, mut input: CreatePostInput) -> AppResult<post::Model> {
        if author.is_banned {
            return Err(AppError::Forbidden("Banned users cannot post".to_string()));
        }
        input.validate()?;
        let kind = input.take_kind()?;

        // The rated restaurant, or the commented post's author.
        let (restaurant_id, parent_author) = match &kind {
            PostKind::Feedback { restaurant_id, .. } => {
                self.restaurant_repo.get_by_id(restaurant_id).await?;
                (Some(restaurant_id.clone()), None)
            }
            PostKind::DishFeedback { dish_id, .. } => {
                let dish = self.dish_repo.get_by_id(dish_id).await?;
                (Some(dish.restaurant_id), None)
            }
            PostKind::Comment { parent_id } => {
                let parent = self.post_repo.get_by_id(parent_id).await?;
                (None, Some(parent.author_id))
            }
        };

        let (restaurant_ref, dish_ref, parent_ref) = match &kind {
            PostKind::Feedback { restaurant_id, .. } => (Some(restaurant_id.clone()), None, None),
            PostKind::DishFeedback { dish_id, .. } => (None, Some(dish_id.clone()), None),
            PostKind::Comment { parent_id } => (None, None, Some(parent_id.clone())),
        };

        let model = post::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_type: Set(kind.post_type()),
            author_id: Set(author.id.clone()),
            restaurant_id: Set(restaurant_ref),
            dish_id: Set(dish_ref),
            parent_id: Set(parent_ref),
            rating: Set(kind.rating().map(i32::from)),
            caption: Set(input.caption),
            content: Set(input.content),
            media_urls: Set(serde_json::json!(input.media_urls)),
            like_count: Set(0),
            // Rated posts wait for moderation.
            reviewed: Set(!kind.post_type().is_rated()),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.post_repo.create(model).await?;
        tracing::info!(post_id = %created.id, author_id = %author.id, post_type = ?created.post_type, "Post created");

        if let Some(restaurant_id) = restaurant_id {
            self.restaurant_repo.recompute_avg_rating(&restaurant_id).await?;
        }

        if let (PostKind::Comment { parent_id }, Some(recipient)) = (&kind, parent_author) {
            self.notifications
                .dispatch(NotificationType::Comment, &recipient, author, parent_id)
                .await;
        }

        Ok(created)
    }

    /// Get a post with its author and target.
    pub async fn get(&self, id: &str) -> AppResult<PostDetail> {
        let post = self.post_repo.get_by_id(id).await?;
        let author = self.user_repo.get_by_id(&post.author_id).await?;

        let target = match PostKind::from_model(&post)? {
            PostKind::Feedback { restaurant_id, .. } => {
                let restaurant = self.restaurant_repo.get_by_id(&restaurant_id).await?;
                PostTarget::Restaurant {
                    id: restaurant.id,
                    name: restaurant.name,
                }
            }
            PostKind::DishFeedback { dish_id, .. } => {
                let dish = self.dish_repo.get_by_id(&dish_id).await?;
                PostTarget::Dish {
                    id: dish.id,
                    name: dish.name,
                    restaurant_id: dish.restaurant_id,
                }
            }
            PostKind::Comment { parent_id } => PostTarget::Parent { id: parent_id },
        };

        Ok(PostDetail { post, author, target })
    }

    /// Update a post (author or admin).
    pub async fn update(
        &self,
        caller: &user::Model,
        id: &str,
        input: UpdatePostInput,
    ) -> AppResult<post::Model> {
        if caller.is_banned {
            return Err(AppError::Forbidden("Banned users cannot post".to_string()));
        }
        input.validate()?;

        let existing = self.post_repo.get_by_id(id).await?;
        if existing.author_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden("You can only edit your own posts".to_string()));
        }

        let kind = PostKind::from_model(&existing)?;
        let new_rating = match (input.rating, kind.rating()) {
            (None, _) => None,
            (Some(_), None) => {
                return Err(AppError::invalid_field("rating", "Comments cannot be rated"));
            }
            (Some(value), Some(current)) => Some(Rating::try_from(value)?).filter(|r| *r != current),
        };

        let mut active: post::ActiveModel = existing.into();
        if let Some(caption) = input.caption {
            active.caption = Set(Some(caption).filter(|c| !c.is_empty()));
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(media_urls) = input.media_urls {
            active.media_urls = Set(serde_json::json!(media_urls));
        }
        if let Some(rating) = new_rating {
            active.rating = Set(Some(i32::from(rating)));
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let updated = self.post_repo.update(active).await?;

        if new_rating.is_some() {
            if let Some(restaurant_id) = self.rated_restaurant(&kind).await? {
                self.restaurant_repo.recompute_avg_rating(&restaurant_id).await?;
            }
        }

        Ok(updated)
    }

    /// Delete a post (author or admin).
    pub async fn delete(&self, caller: &user::Model, id: &str) -> AppResult<()> {
        let existing = self.post_repo.get_by_id(id).await?;
        if existing.author_id != caller.id && !caller.is_admin() {
            return Err(AppError::Forbidden("You can only delete your own posts".to_string()));
        }

        let kind = PostKind::from_model(&existing)?;
        let restaurant_id = self.rated_restaurant(&kind).await?;

        self.post_repo.delete(id).await?;
        tracing::info!(post_id = %id, deleted_by = %caller.id, "Post deleted");

        if let Some(restaurant_id) = restaurant_id {
            self.restaurant_repo.recompute_avg_rating(&restaurant_id).await?;
        }
        Ok(())
    }

    /// List posts. Unreviewed posts are visible to admins only.
    pub async fn list(
        &self,
        caller: Option<&user::Model>,
        query: PostQuery,
        page: PageRequest,
    ) -> AppResult<Paginated<PostSummary>> {
        let reviewed = query.reviewed.unwrap_or(true);
        if !reviewed && !caller.is_some_and(user::Model::is_admin) {
            return Err(AppError::Forbidden(
                "Only admins can list unreviewed posts".to_string(),
            ));
        }

        let filter = PostFilter {
            post_type: query.post_type,
            author_id: query.author_id,
            restaurant_id: query.restaurant_id,
            dish_id: query.dish_id,
            parent_id: query.parent_id,
            reviewed,
        };
        let (posts, total) = self.post_repo.find_paginated(&filter, page).await?;

        let mut author_ids: Vec<String> = posts.iter().map(|p| p.author_id.clone()).collect();
        author_ids.sort_unstable();
        author_ids.dedup();
        let authors: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let summaries = posts
            .into_iter()
            .map(|post| PostSummary {
                author: authors.get(&post.author_id).cloned(),
                post,
            })
            .collect();

        Ok(Paginated::new(summaries, total, page))
    }

    /// Mark a post as reviewed (admin only).
    pub async fn approve(&self, caller: &user::Model, id: &str) -> AppResult<post::Model> {
        self.set_reviewed(caller, id, true).await
    }

    /// Mark a post as not reviewed (admin only).
    pub async fn reject(&self, caller: &user::Model, id: &str) -> AppResult<post::Model> {
        self.set_reviewed(caller, id, false).await
    }

    async fn set_reviewed(&self, caller: &user::Model, id: &str, reviewed: bool) -> AppResult<post::Model> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        let post = self.post_repo.set_reviewed(id, reviewed).await?;
        tracing::info!(post_id = %id, admin_id = %caller.id, reviewed, "Post review state changed");
        Ok(post)
    }

    /// The restaurant whose average a post contributes to.
    async fn rated_restaurant(&self, kind: &PostKind) -> AppResult<Option<String>> {
        match kind {
            PostKind::Feedback { restaurant_id, .. } => Ok(Some(restaurant_id.clone())),
            PostKind::DishFeedback { dish_id, .. } => Ok(self
                .dish_repo
                .find_by_id(dish_id)
                .await?
                .map(|dish| dish.restaurant_id)),
            PostKind::Comment { .. } => Ok(None),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::{
        live_delivery::NoOpLiveDelivery,
        notification::tests::{RecordingDelivery, sender},
    };
    use chrono::Utc;
    use platebook_db::{
        entities::{dish, notification, restaurant, user::UserRole},
        repositories::NotificationRepository,
    };
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, Value};
    use std::sync::Arc;

    fn member(id: &str, role: UserRole, is_banned: bool) -> user::Model {
        user::Model {
            id: id.to_string(),
            role,
            is_banned,
            ..sender()
        }
    }

    fn restaurant_row(id: &str) -> restaurant::Model {
        restaurant::Model {
            id: id.to_string(),
            name: "Pho Thin".to_string(),
            address: "13 Lo Duc".to_string(),
            latitude: 21.0,
            longitude: 105.8,
            location_approximate: false,
            open_time: "06:00".to_string(),
            close_time: "21:00".to_string(),
            description: None,
            image_urls: serde_json::json!([]),
            owner_id: "admin".to_string(),
            avg_rating: 0.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn post_row(id: &str, post_type: PostType, author_id: &str) -> post::Model {
        let (restaurant_id, dish_id, parent_id, rating) = match post_type {
            PostType::Feedback => (Some("r1".to_string()), None, None, Some(4)),
            PostType::DishFeedback => (None, Some("d1".to_string()), None, Some(3)),
            PostType::Comment => (None, None, Some("p0".to_string()), None),
        };
        post::Model {
            id: id.to_string(),
            post_type,
            author_id: author_id.to_string(),
            restaurant_id,
            dish_id,
            parent_id,
            rating,
            caption: None,
            content: "Great broth".to_string(),
            media_urls: serde_json::json!([]),
            like_count: 0,
            reviewed: post_type == PostType::Comment,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn avg_row(avg: f64) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! { "avg_rating" => Value::Double(Some(avg)) }
    }

    fn service_with(db: DatabaseConnection, live: crate::services::LiveDeliveryService) -> PostService {
        let db = Arc::new(db);
        PostService::new(
            PostRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            RestaurantRepository::new(Arc::clone(&db)),
            DishRepository::new(Arc::clone(&db)),
            NotificationService::new(NotificationRepository::new(db), live),
        )
    }

    fn service(db: DatabaseConnection) -> PostService {
        service_with(db, Arc::new(NoOpLiveDelivery))
    }

    fn feedback_input(rating: i32) -> CreatePostInput {
        CreatePostInput {
            post_type: PostType::Feedback,
            restaurant_id: Some("r1".to_string()),
            dish_id: None,
            parent_id: None,
            rating: Some(rating),
            caption: None,
            content: "Great broth".to_string(),
            media_urls: vec![],
        }
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::try_from(0).is_err());
        assert_eq!(Rating::try_from(1).unwrap().get(), 1);
        assert_eq!(Rating::try_from(5).unwrap().get(), 5);
        assert!(Rating::try_from(6).is_err());
        assert!(Rating::try_from(-3).is_err());
    }

    #[test]
    fn test_kind_rejects_foreign_fields() {
        let mut input = feedback_input(4);
        input.dish_id = Some("d1".to_string());
        assert!(matches!(input.take_kind(), Err(AppError::Validation(_))));

        let mut comment = feedback_input(4);
        comment.post_type = PostType::Comment;
        comment.restaurant_id = None;
        comment.parent_id = Some("p0".to_string());
        assert!(matches!(comment.take_kind(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_kind_requires_variant_fields() {
        let mut input = feedback_input(4);
        input.restaurant_id = None;
        assert!(matches!(input.take_kind(), Err(AppError::Validation(_))));

        let mut unrated = feedback_input(4);
        unrated.rating = None;
        assert!(matches!(unrated.take_kind(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_only_comments_skip_moderation() {
        let rated = PostKind::DishFeedback {
            dish_id: "d1".to_string(),
            rating: Rating::try_from(3).unwrap(),
        };
        let comment = PostKind::Comment {
            parent_id: "p1".to_string(),
        };

        assert!(rated.post_type().is_rated());
        assert!(!comment.post_type().is_rated());
        assert!(PostType::Feedback.is_rated());
    }

    #[test]
    fn test_kind_from_model() {
        let kind = PostKind::from_model(&post_row("p1", PostType::DishFeedback, "a")).unwrap();
        assert_eq!(
            kind,
            PostKind::DishFeedback {
                dish_id: "d1".to_string(),
                rating: Rating::try_from(3).unwrap()
            }
        );

        let mut broken = post_row("p2", PostType::Feedback, "a");
        broken.restaurant_id = None;
        assert!(matches!(PostKind::from_model(&broken), Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_create_banned_forbidden() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let banned = member("u1", UserRole::Admin, true);

        let result = svc.create(&banned, feedback_input(4)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_feedback_recomputes_average() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[restaurant_row("r1")]])
            .append_query_results([[post_row("p1", PostType::Feedback, "u1")]])
            .append_query_results([[avg_row(4.0)]])
            .into_connection();
        let svc = service(db);

        let created = svc
            .create(&member("u1", UserRole::User, false), feedback_input(4))
            .await
            .unwrap();

        assert!(!created.reviewed);
        assert_eq!(created.rating, Some(4));
    }

    #[tokio::test]
    async fn test_create_feedback_unknown_restaurant() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<restaurant::Model>::new()])
            .into_connection();

        let result = service(db)
            .create(&member("u1", UserRole::User, false), feedback_input(4))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_comment_notifies_parent_author() {
        let comment = post_row("c1", PostType::Comment, "fan");
        let stored_notification = notification::Model {
            id: "n1".to_string(),
            notification_type: NotificationType::Comment,
            recipient_id: "author".to_string(),
            sender_id: "fan".to_string(),
            post_id: "p0".to_string(),
            message: "fan commented on your post".to_string(),
            is_sent: true,
            created_at: Utc::now().into(),
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post_row("p0", PostType::Feedback, "author")]])
            .append_query_results([[comment]])
            .append_query_results([[stored_notification]])
            .into_connection();
        let live = Arc::new(RecordingDelivery {
            connected: true,
            ..Default::default()
        });
        let svc = service_with(db, live.clone());

        let input = CreatePostInput {
            post_type: PostType::Comment,
            restaurant_id: None,
            dish_id: None,
            parent_id: Some("p0".to_string()),
            rating: None,
            caption: None,
            content: "Agreed!".to_string(),
            media_urls: vec![],
        };
        let created = svc.create(&sender(), input).await.unwrap();

        assert!(created.reviewed);
        let delivered = live.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "author");
        assert_eq!(delivered[0].1.message, "fan commented on your post");
    }

    #[tokio::test]
    async fn test_update_by_stranger_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post_row("p1", PostType::Feedback, "owner")]])
            .into_connection();

        let result = service(db)
            .update(
                &member("stranger", UserRole::User, false),
                "p1",
                UpdatePostInput::default(),
            )
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_banned_admin_forbidden() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = svc
            .update(&member("root", UserRole::Admin, true), "p1", UpdatePostInput::default())
            .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_rating_on_comment_rejected() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post_row("c1", PostType::Comment, "u1")]])
            .into_connection();

        let result = service(db)
            .update(
                &member("u1", UserRole::User, false),
                "c1",
                UpdatePostInput {
                    rating: Some(5),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_dish_feedback_rating_recomputes() {
        let mut updated = post_row("p1", PostType::DishFeedback, "u1");
        updated.rating = Some(5);
        let dish_row = dish::Model {
            id: "d1".to_string(),
            restaurant_id: "r1".to_string(),
            name: "Pho Bo".to_string(),
            price: 50.0,
            description: None,
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[post_row("p1", PostType::DishFeedback, "u1")]])
            .append_query_results([[updated]])
            .append_query_results([[dish_row]])
            .append_query_results([[avg_row(5.0)]])
            .into_connection();

        let post = service(db)
            .update(
                &member("u1", UserRole::User, false),
                "p1",
                UpdatePostInput {
                    rating: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(post.rating, Some(5));
    }

    #[tokio::test]
    async fn test_list_unreviewed_requires_admin() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let query = PostQuery {
            reviewed: Some(false),
            ..Default::default()
        };

        let anonymous = svc.list(None, query, PageRequest::default()).await;
        assert!(matches!(anonymous, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_list_unreviewed_as_admin() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => Value::BigInt(Some(1))
            }]])
            .append_query_results([[post_row("p1", PostType::Feedback, "u1")]])
            .append_query_results([[member("u1", UserRole::User, false)]])
            .into_connection();
        let admin = member("root", UserRole::Admin, false);

        let page = service(db)
            .list(
                Some(&admin),
                PostQuery {
                    reviewed: Some(false),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert!(!page.data[0].post.reviewed);
        assert_eq!(page.data[0].author.as_ref().unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_approve_requires_admin() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        let result = svc.approve(&member("u1", UserRole::User, false), "p1").await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
