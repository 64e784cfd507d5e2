//! API endpoints.

mod dishes;
mod notifications;
mod posts;
mod restaurants;
mod users;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/users", users::router())
        .nest("/restaurants", restaurants::router())
        .nest("/dishes", dishes::router())
        .nest("/posts", posts::router())
        .nest("/notifications", notifications::router())
}
