//! Notification repository.

use std::sync::Arc;

use super::db_err;
use crate::entities::{Notification, notification};
use platebook_common::{AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Persist a notification.
    pub async fn create(
        &self,
        model: notification::ActiveModel,
    ) -> AppResult<notification::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_err)
    }

    /// Unsent notifications for a recipient, oldest first.
    pub async fn find_pending(&self, recipient_id: &str) -> AppResult<Vec<notification::Model>> {
        Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsSent.eq(false))
            .order_by_asc(notification::Column::CreatedAt)
            .order_by_asc(notification::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Flag a notification as delivered.
    pub async fn mark_sent(&self, id: &str) -> AppResult<()> {
        Notification::update_many()
            .col_expr(notification::Column::IsSent, Expr::value(true))
            .filter(notification::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Notifications for a recipient, newest first.
    pub async fn find_by_recipient(
        &self,
        recipient_id: &str,
        page: PageRequest,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let query =
            Notification::find().filter(notification::Column::RecipientId.eq(recipient_id));
        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let notifications = query
            .order_by_desc(notification::Column::CreatedAt)
            .order_by_desc(notification::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((notifications, total))
    }
}
