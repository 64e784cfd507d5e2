//! Restaurants endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use platebook_common::{AppResult, Paginated};
use platebook_core::{CreateRestaurantInput, RestaurantQuery, UpdateRestaurantInput};

use crate::{
    extractors::{AdminUser, PageQuery, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    response::{ApiResponse, RestaurantResponse},
};

/// Search restaurants.
async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<RestaurantQuery>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<RestaurantResponse>>> {
    let restaurants = state.restaurant_service.list(query, page.into()).await?;
    Ok(ApiResponse::ok(restaurants.map(Into::into)))
}

/// Get a restaurant.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<RestaurantResponse>> {
    let detail = state.restaurant_service.get(&id).await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Create a restaurant.
async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(input): ValidatedJson<CreateRestaurantInput>,
) -> AppResult<ApiResponse<RestaurantResponse>> {
    let restaurant = state.restaurant_service.create(&admin, input).await?;
    Ok(ApiResponse::created(restaurant.into()))
}

/// Update a restaurant.
async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateRestaurantInput>,
) -> AppResult<ApiResponse<RestaurantResponse>> {
    let restaurant = state.restaurant_service.update(&admin, &id, input).await?;
    Ok(ApiResponse::ok(restaurant.into()))
}

/// Delete a restaurant.
async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.restaurant_service.delete(&admin, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
}
