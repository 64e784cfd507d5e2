//! Like service.

use crate::services::notification::NotificationService;
use platebook_common::{AppResult, PageRequest, Paginated};
use platebook_db::{
    entities::{notification::NotificationType, post, user},
    repositories::{LikeRepository, PostRepository, UserRepository},
};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    post_repo: PostRepository,
    user_repo: UserRepository,
    notifications: NotificationService,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(
        like_repo: LikeRepository,
        post_repo: PostRepository,
        user_repo: UserRepository,
        notifications: NotificationService,
    ) -> Self {
        Self {
            like_repo,
            post_repo,
            user_repo,
            notifications,
        }
    }

    /// Like a post and notify its author. Returns the new like count.
    pub async fn like(&self, user: &user::Model, post_id: &str) -> AppResult<i32> {
        let post = self.post_repo.get_by_id(post_id).await?;
        let like_count = self.like_repo.like(post_id, &user.id).await?;

        tracing::debug!(post_id = %post_id, user_id = %user.id, like_count, "Post liked");

        self.notifications
            .dispatch(NotificationType::Like, &post.author_id, user, post_id)
            .await;

        Ok(like_count)
    }

    /// Remove a like. Returns the new like count.
    pub async fn unlike(&self, user: &user::Model, post_id: &str) -> AppResult<i32> {
        self.post_repo.get_by_id(post_id).await?;
        let like_count = self.like_repo.unlike(post_id, &user.id).await?;

        tracing::debug!(post_id = %post_id, user_id = %user.id, like_count, "Post unliked");
        Ok(like_count)
    }

    /// Users who liked a post.
    pub async fn likers(&self, post_id: &str, page: PageRequest) -> AppResult<Paginated<user::Model>> {
        self.post_repo.get_by_id(post_id).await?;
        let (users, total) = self.like_repo.find_likers(post_id, page).await?;
        Ok(Paginated::new(users, total, page))
    }

    /// Posts a user has liked.
    pub async fn liked_posts(&self, user_id: &str, page: PageRequest) -> AppResult<Paginated<post::Model>> {
        self.user_repo.get_by_id(user_id).await?;
        let (posts, total) = self.like_repo.find_liked_posts(user_id, page).await?;
        Ok(Paginated::new(posts, total, page))
    }
}
