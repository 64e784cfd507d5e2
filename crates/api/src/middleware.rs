//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use platebook_core::{
    DishService, LikeService, NotificationService, PostService, RestaurantService, UserService,
    VerificationService,
};

use crate::streaming::NotificationGateway;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub restaurant_service: RestaurantService,
    pub dish_service: DishService,
    pub post_service: PostService,
    pub like_service: LikeService,
    pub notification_service: NotificationService,
    pub verification_service: VerificationService,
    pub gateway: NotificationGateway,
}

/// Authentication middleware.
///
/// A valid bearer token puts the user into the request extensions. Missing
/// or invalid tokens leave the request anonymous; handlers that need a user
/// reject it through the extractors.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned);

    if let Some(token) = token {
        match state.user_service.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "Bearer token rejected");
            }
        }
    }

    next.run(req).await
}
