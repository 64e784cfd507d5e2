//! Notification service.
//!
//! Notifications are pushed live when the recipient is connected and
//! persisted either way; `is_sent` records whether the push happened.
//! Unsent rows are flushed when the recipient next registers a connection.

use crate::services::live_delivery::{LiveDeliveryService, NotificationEvent};
use platebook_common::{AppResult, IdGenerator, PageRequest, Paginated};
use platebook_db::{
    entities::{
        notification::{self, NotificationType},
        user,
    },
    repositories::NotificationRepository,
};
use sea_orm::Set;

/// Notification service for business logic.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    live: LiveDeliveryService,
    id_gen: IdGenerator,
}

/// Human-readable message for a notification.
#[must_use]
pub fn notification_message(kind: NotificationType, sender_username: &str) -> String {
    match kind {
        NotificationType::Like => format!("{sender_username} liked your post"),
        NotificationType::Comment => format!("{sender_username} commented on your post"),
    }
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub fn new(notification_repo: NotificationRepository, live: LiveDeliveryService) -> Self {
        Self {
            notification_repo,
            live,
            id_gen: IdGenerator::new(),
        }
    }

    /// Build, push if possible, and persist a notification.
    pub async fn notify(
        &self,
        kind: NotificationType,
        recipient_id: &str,
        sender: &user::Model,
        post_id: &str,
    ) -> AppResult<notification::Model> {
        let now = chrono::Utc::now();
        let mut model = notification::Model {
            id: self.id_gen.generate(),
            notification_type: kind,
            recipient_id: recipient_id.to_string(),
            sender_id: sender.id.clone(),
            post_id: post_id.to_string(),
            message: notification_message(kind, &sender.username),
            is_sent: false,
            created_at: now.into(),
        };

        if self.live.is_connected(recipient_id).await {
            model.is_sent = self
                .live
                .deliver(recipient_id, &NotificationEvent::from(&model))
                .await;
        }

        let saved = self
            .notification_repo
            .create(notification::ActiveModel {
                id: Set(model.id),
                notification_type: Set(model.notification_type),
                recipient_id: Set(model.recipient_id),
                sender_id: Set(model.sender_id),
                post_id: Set(model.post_id),
                message: Set(model.message),
                is_sent: Set(model.is_sent),
                created_at: Set(model.created_at),
            })
            .await?;

        tracing::debug!(
            notification_id = %saved.id,
            recipient_id = %recipient_id,
            is_sent = saved.is_sent,
            "Notification recorded"
        );

        Ok(saved)
    }

    /// Like [`Self::notify`], but failures are logged instead of returned.
    /// Used after the triggering write has already succeeded.
    pub async fn dispatch(
        &self,
        kind: NotificationType,
        recipient_id: &str,
        sender: &user::Model,
        post_id: &str,
    ) {
        if let Err(e) = self.notify(kind, recipient_id, sender, post_id).await {
            tracing::warn!(
                error = %e,
                recipient_id = %recipient_id,
                post_id = %post_id,
                "Failed to record notification"
            );
        }
    }

    /// Push every unsent notification of a user, oldest first.
    /// Stops at the first push that finds no open connection.
    pub async fn flush_pending(&self, user_id: &str) -> AppResult<usize> {
        let pending = self.notification_repo.find_pending(user_id).await?;
        let mut flushed = 0;

        for n in &pending {
            if !self.live.deliver(user_id, &NotificationEvent::from(n)).await {
                break;
            }
            self.notification_repo.mark_sent(&n.id).await?;
            flushed += 1;
        }

        if flushed > 0 {
            tracing::info!(user_id = %user_id, count = flushed, "Flushed pending notifications");
        }
        Ok(flushed)
    }

    /// A user's notifications, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> AppResult<Paginated<notification::Model>> {
        let (items, total) = self
            .notification_repo
            .find_by_recipient(user_id, page)
            .await?;
        Ok(Paginated::new(items, total, page))
    }
}
