//! Users endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use platebook_common::{AppResult, Paginated};
use platebook_core::{
    ChangePasswordInput, LoginInput, RegisterInput, SendCodeInput, UpdateProfileInput,
    VerifyCodeInput,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    extractors::{AdminUser, AuthUser, PageQuery, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    response::{
        ApiResponse, AuthResponse, MessageResponse, PostResponse, RestaurantResponse, UserResponse,
    },
};

/// User list filter.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UserSearchQuery {
    #[validate(length(max = 100))]
    pub search: Option<String>,
}

/// Loved restaurant request body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LovedRestaurantRequest {
    #[validate(length(min = 1, message = "restaurantId is required"))]
    pub restaurant_id: String,
}

/// Register a new account.
async fn register(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state.user_service.register(input).await?;
    Ok(ApiResponse::created(session.into()))
}

/// Sign in.
async fn login(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state.user_service.login(input).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Get the current user.
async fn profile(AuthUser(user): AuthUser) -> ApiResponse<UserResponse> {
    ApiResponse::ok(user.into())
}

/// Update the current user.
async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(input): ValidatedJson<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let updated = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(updated.into()))
}

/// Change the current user's password.
async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(input): ValidatedJson<ChangePasswordInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.user_service.change_password(&user.id, input).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Password changed")))
}

/// Create an administrator account.
async fn register_admin(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let admin = state.user_service.register_admin(&user, input).await?;
    Ok(ApiResponse::created(admin.into()))
}

/// List users.
async fn list(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedQuery(query): ValidatedQuery<UserSearchQuery>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<UserResponse>>> {
    let users = state
        .user_service
        .list(&admin, query.search.as_deref(), page.into())
        .await?;
    Ok(ApiResponse::ok(users.map(Into::into)))
}

/// Get a user by ID.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Toggle a user's ban.
async fn toggle_ban(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.toggle_ban(&admin, &id).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Add a loved restaurant.
async fn love_restaurant(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<LovedRestaurantRequest>,
) -> AppResult<ApiResponse<Vec<RestaurantResponse>>> {
    let loved = state
        .user_service
        .love_restaurant(&user, &id, &req.restaurant_id)
        .await?;
    Ok(ApiResponse::created(loved.into_iter().map(Into::into).collect()))
}

/// Remove a loved restaurant.
async fn unlove_restaurant(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<LovedRestaurantRequest>,
) -> AppResult<ApiResponse<Vec<RestaurantResponse>>> {
    let loved = state
        .user_service
        .unlove_restaurant(&user, &id, &req.restaurant_id)
        .await?;
    Ok(ApiResponse::ok(loved.into_iter().map(Into::into).collect()))
}

/// List loved restaurants.
async fn loved_restaurants(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<RestaurantResponse>>> {
    let loved = state.user_service.loved_restaurants(&id).await?;
    Ok(ApiResponse::ok(loved.into_iter().map(Into::into).collect()))
}

/// Posts liked by a user.
async fn liked_posts(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let posts = state.like_service.liked_posts(&id, page.into()).await?;
    Ok(ApiResponse::ok(posts.map(Into::into)))
}

/// Email a verification code.
async fn send_code(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SendCodeInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.verification_service.send_code(input).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Verification code sent")))
}

/// Check a verification code.
async fn verify_code(
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<VerifyCodeInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.verification_service.verify_code(input).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Email verified")))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile).put(update_profile))
        .route("/change-password", put(change_password))
        .route("/register-admin", post(register_admin))
        .route("/send-code", post(send_code))
        .route("/verify-code", post(verify_code))
        .route("/{id}", get(show))
        .route("/{id}/ban", put(toggle_ban))
        .route(
            "/{id}/loved_restaurants",
            get(loved_restaurants)
                .post(love_restaurant)
                .delete(unlove_restaurant),
        )
        .route("/{id}/posts", get(liked_posts))
}
