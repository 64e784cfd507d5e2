//! Dishes endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use platebook_common::{AppResult, Paginated};
use platebook_core::{CreateDishInput, DishQuery, UpdateDishInput};

use crate::{
    extractors::{AdminUser, PageQuery, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    response::{ApiResponse, DishResponse},
};

async fn list(
    State(state): State<AppState>,
    ValidatedQuery(query): ValidatedQuery<DishQuery>,
    ValidatedQuery(page): ValidatedQuery<PageQuery>,
) -> AppResult<ApiResponse<Paginated<DishResponse>>> {
    let dishes = state.dish_service.list(query, page.into()).await?;
    Ok(ApiResponse::ok(dishes.map(Into::into)))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<DishResponse>> {
    let dish = state.dish_service.get(&id).await?;
    Ok(ApiResponse::ok(dish.into()))
}

async fn create(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ValidatedJson(input): ValidatedJson<CreateDishInput>,
) -> AppResult<ApiResponse<DishResponse>> {
    let dish = state.dish_service.create(&admin, input).await?;
    Ok(ApiResponse::created(dish.into()))
}

async fn update(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdateDishInput>,
) -> AppResult<ApiResponse<DishResponse>> {
    let dish = state.dish_service.update(&admin, &id, input).await?;
    Ok(ApiResponse::ok(dish.into()))
}

async fn delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    state.dish_service.delete(&admin, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).put(update).delete(delete))
}
