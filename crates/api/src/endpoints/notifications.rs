//! Notifications endpoints.

use axum::{Router, extract::State, routing::get};
use platebook_common::{AppResult, Paginated};

use crate::{
    extractors::{AuthUser, PageQuery, ValidatedQuery},
    middleware::AppState,
    response::{ApiResponse, NotificationResponse},
};

/// The caller's notifications, newest first.
async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<NotificationResponse>>> {
    let notifications = state
        .notification_service
        .list(&user.id, page.into())
        .await?;
    Ok(ApiResponse::ok(notifications.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list))
}
