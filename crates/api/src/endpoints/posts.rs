//! Posts endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use platebook_common::{AppResult, Paginated};
use platebook_core::{CreatePostInput, PostQuery, UpdatePostInput};

use crate::{
    extractors::{AdminUser, AuthUser, MaybeAuthUser, PageQuery, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    response::{ApiResponse, LikeCountResponse, PostResponse, UserSummary},
};

/// Create a post.
async fn create(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(input): ValidatedJson<CreatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.create(&user, input).await?;
    Ok(ApiResponse::created(post.into()))
}

/// List posts.
async fn list(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
    ValidatedQuery(query): ValidatedQuery<PostQuery>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<PostResponse>>> {
    let posts = state
        .post_service
        .list(user.as_ref(), query, page.into())
        .await?;
    Ok(ApiResponse::ok(posts.map(Into::into)))
}

/// Get a post with its author and target.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let detail = state.post_service.get(&id).await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Update a post.
async fn update(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdatePostInput>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Delete a post.
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.post_service.delete(&user, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a post as reviewed.
async fn approve(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.approve(&admin, &id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Send a post back to review.
async fn reject(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<PostResponse>> {
    let post = state.post_service.reject(&admin, &id).await?;
    Ok(ApiResponse::ok(post.into()))
}

/// Like a post.
async fn like(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeCountResponse>> {
    let like_count = state.like_service.like(&user, &id).await?;
    Ok(ApiResponse::created(LikeCountResponse {
        post_id: id,
        like_count,
    }))
}

/// Remove a like.
async fn unlike(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<LikeCountResponse>> {
    let like_count = state.like_service.unlike(&user, &id).await?;
    Ok(ApiResponse::ok(LikeCountResponse {
        post_id: id,
        like_count,
    }))
}

/// Users who liked a post.
async fn likers(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<UserSummary>>> {
    let users = state.like_service.likers(&id, page.into()).await?;
    Ok(ApiResponse::ok(users.map(Into::into)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(remove))
        .route("/{id}/approve", put(approve))
        .route("/{id}/reject", put(reject))
        .route("/{id}/like", post(like))
        .route("/{id}/unlike", delete(unlike))
        .route("/{id}/users", get(likers))
}
