//! Like repository.
//!
//! A like row and the post's `like_count` always change together inside one
//! transaction, and the counter moves with a single `UPDATE`.

use std::sync::Arc;

use super::{db_err, write_err};
use crate::entities::{Post, PostLike, User, post, post_like, user};
use platebook_common::{AppError, AppResult, IdGenerator, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::Expr,
};

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
    id_gen: IdGenerator,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            id_gen: IdGenerator::new(),
        }
    }

    /// Record a like and bump the counter. Returns the new `like_count`.
    pub async fn like(&self, post_id: &str, user_id: &str) -> AppResult<i32> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let existing = PostLike::find()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .one(&txn)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(AppError::Conflict("Post already liked".to_string()));
        }

        post_like::ActiveModel {
            id: Set(self.id_gen.generate()),
            post_id: Set(post_id.to_string()),
            user_id: Set(user_id.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&txn)
        .await
        .map_err(write_err("Post already liked"))?;

        Post::update_many()
            .col_expr(
                post::Column::LikeCount,
                Expr::col(post::Column::LikeCount).add(1),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let like_count = current_like_count(&txn, post_id).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(like_count)
    }

    /// Remove a like and drop the counter, floored at zero.
    /// Returns the new `like_count`.
    pub async fn unlike(&self, post_id: &str, user_id: &str) -> AppResult<i32> {
        let txn = self.db.begin().await.map_err(db_err)?;

        let removed = PostLike::delete_many()
            .filter(post_like::Column::PostId.eq(post_id))
            .filter(post_like::Column::UserId.eq(user_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;
        if removed.rows_affected == 0 {
            return Err(AppError::NotFound("Like".to_string()));
        }

        Post::update_many()
            .col_expr(
                post::Column::LikeCount,
                Expr::cust("GREATEST(like_count - 1, 0)"),
            )
            .filter(post::Column::Id.eq(post_id))
            .exec(&txn)
            .await
            .map_err(db_err)?;

        let like_count = current_like_count(&txn, post_id).await?;
        txn.commit().await.map_err(db_err)?;

        Ok(like_count)
    }

    /// Users who liked a post, most recent first.
    pub async fn find_likers(
        &self,
        post_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<user::Model>, u64)> {
        let query = PostLike::find().filter(post_like::Column::PostId.eq(post_id));
        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let ids: Vec<String> = query
            .select_only()
            .column(post_like::Column::UserId)
            .order_by_desc(post_like::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if ids.is_empty() {
            return Ok((vec![], total));
        }

        let mut users = User::find()
            .filter(user::Column::Id.is_in(ids.clone()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;
        users.sort_by_key(|u| ids.iter().position(|id| *id == u.id));

        Ok((users, total))
    }

    /// Posts liked by a user, most recently liked first.
    pub async fn find_liked_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<post::Model>, u64)> {
        let query = PostLike::find().filter(post_like::Column::UserId.eq(user_id));
        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let ids: Vec<String> = query
            .select_only()
            .column(post_like::Column::PostId)
            .order_by_desc(post_like::Column::CreatedAt)
            .offset(page.offset())
            .limit(page.limit)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if ids.is_empty() {
            return Ok((vec![], total));
        }

        let mut posts = Post::find()
            .filter(post::Column::Id.is_in(ids.clone()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;
        posts.sort_by_key(|p| ids.iter().position(|id| *id == p.id));

        Ok((posts, total))
    }
}

async fn current_like_count<C: ConnectionTrait>(conn: &C, post_id: &str) -> AppResult<i32> {
    Post::find_by_id(post_id)
        .select_only()
        .column(post::Column::LikeCount)
        .into_tuple::<i32>()
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound("Post".to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_like(post_id: &str, user_id: &str) -> post_like::Model {
        post_like::Model {
            id: "l1".to_string(),
            post_id: post_id.to_string(),
            user_id: user_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    fn count_row(n: i32) -> std::collections::BTreeMap<&'static str, Value> {
        maplit::btreemap! { "like_count" => Value::Int(Some(n)) }
    }

    #[tokio::test]
    async fn test_like_increments_counter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post_like::Model>::new()])
                .append_query_results([[create_test_like("p1", "u1")]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .append_query_results([[count_row(1)]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.like("p1", "u1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_like_twice_conflicts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_like("p1", "u1")]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(matches!(
            repo.like("p1", "u1").await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_unlike_decrements_counter() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .append_query_results([[count_row(0)]])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert_eq!(repo.unlike("p1", "u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unlike_without_like_is_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        assert!(matches!(
            repo.unlike("p1", "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_likers_empty_page() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => Value::BigInt(Some(0))
                }]])
                .append_query_results([Vec::<std::collections::BTreeMap<&str, Value>>::new()])
                .into_connection(),
        );

        let repo = LikeRepository::new(db);
        let (users, total) = repo
            .find_likers("p1", PageRequest::default())
            .await
            .unwrap();

        assert!(users.is_empty());
        assert_eq!(total, 0);
    }
}
