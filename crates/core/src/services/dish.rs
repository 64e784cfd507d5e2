//! Dish service.

use crate::services::restaurant::trimmed_required;
use platebook_common::{AppError, AppResult, IdGenerator, PageRequest, Paginated};
use platebook_db::{
    entities::{dish, user},
    repositories::{DishFilter, DishRepository, RestaurantRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Query parameters of the dish listing.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DishQuery {
    pub restaurant_id: Option<String>,

    #[validate(length(max = 200))]
    pub search: Option<String>,
}

/// Input for creating a dish.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDishInput {
    #[validate(length(min = 1, message = "Restaurant is required"))]
    pub restaurant_id: String,

    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

/// Input for updating a dish. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDishInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(url(message = "Invalid image URL"))]
    pub image_url: Option<String>,
}

/// Dish service for business logic.
#[derive(Clone)]
pub struct DishService {
    dish_repo: DishRepository,
    restaurant_repo: RestaurantRepository,
    id_gen: IdGenerator,
}

impl DishService {
    /// Create a new dish service.
    #[must_use]
    pub fn new(dish_repo: DishRepository, restaurant_repo: RestaurantRepository) -> Self {
        Self {
            dish_repo,
            restaurant_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List dishes.
    pub async fn list(&self, query: DishQuery, page: PageRequest) -> AppResult<Paginated<dish::Model>> {
        query.validate()?;
        let filter = DishFilter {
            restaurant_id: query.restaurant_id,
            search: query.search,
        };
        let (dishes, total) = self.dish_repo.find_paginated(&filter, page).await?;
        Ok(Paginated::new(dishes, total, page))
    }

    /// Get a dish by ID.
    pub async fn get(&self, id: &str) -> AppResult<dish::Model> {
        self.dish_repo.get_by_id(id).await
    }

    /// Create a dish (admin only).
    pub async fn create(&self, caller: &user::Model, input: CreateDishInput) -> AppResult<dish::Model> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        input.validate()?;
        let name = trimmed_required("name", &input.name)?;

        self.restaurant_repo.get_by_id(&input.restaurant_id).await?;

        if self
            .dish_repo
            .find_by_restaurant_and_name(&input.restaurant_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "Dish already exists in this restaurant".to_string(),
            ));
        }

        let model = dish::ActiveModel {
            id: Set(self.id_gen.generate()),
            restaurant_id: Set(input.restaurant_id),
            name: Set(name),
            price: Set(input.price),
            description: Set(input.description),
            image_url: Set(input.image_url),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.dish_repo.create(model).await?;
        tracing::info!(dish_id = %created.id, restaurant_id = %created.restaurant_id, "Dish created");
        Ok(created)
    }

    /// Update a dish (admin only).
    pub async fn update(
        &self,
        caller: &user::Model,
        id: &str,
        input: UpdateDishInput,
    ) -> AppResult<dish::Model> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        input.validate()?;
        let new_name = input
            .name
            .as_deref()
            .map(|n| trimmed_required("name", n))
            .transpose()?;

        let existing = self.dish_repo.get_by_id(id).await?;
        let restaurant_id = existing.restaurant_id.clone();
        let old_name = existing.name.clone();
        let mut active: dish::ActiveModel = existing.into();

        if let Some(name) = new_name {
            if name != old_name {
                if self
                    .dish_repo
                    .find_by_restaurant_and_name(&restaurant_id, &name)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(
                        "Dish already exists in this restaurant".to_string(),
                    ));
                }
                active.name = Set(name);
            }
        }
        if let Some(price) = input.price {
            active.price = Set(price);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(Some(image_url));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.dish_repo.update(active).await
    }

    /// Delete a dish (admin only).
    pub async fn delete(&self, caller: &user::Model, id: &str) -> AppResult<()> {
        if !caller.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }
        let existing = self.dish_repo.get_by_id(id).await?;
        self.dish_repo.delete(id).await?;

        // Dish feedback was cascaded away with the dish.
        self.restaurant_repo
            .recompute_avg_rating(&existing.restaurant_id)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use platebook_db::entities::{restaurant, user::UserRole};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn admin() -> user::Model {
        user::Model {
            id: "admin".to_string(),
            username: "admin".to_string(),
            username_lower: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            avatar_url: None,
            role: UserRole::Admin,
            is_banned: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> DishService {
        let db = Arc::new(db.into_connection());
        DishService::new(DishRepository::new(Arc::clone(&db)), RestaurantRepository::new(db))
    }

    fn input(restaurant_id: &str, price: f64) -> CreateDishInput {
        CreateDishInput {
            restaurant_id: restaurant_id.to_string(),
            name: "Bun Bo".to_string(),
            price,
            description: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc.create(&admin(), input("r1", -1.0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let mut blank = input("r1", 30.0);
        blank.name = "   ".to_string();

        let result = svc.create(&admin(), blank).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let update = UpdateDishInput {
            name: Some("\t".to_string()),
            ..Default::default()
        };

        let result = svc.update(&admin(), "d1", update).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_unknown_restaurant() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<restaurant::Model>::new()]),
        );
        let result = svc.create(&admin(), input("missing", 30.0)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let caller = user::Model {
            role: UserRole::User,
            ..admin()
        };
        let result = svc.create(&caller, input("r1", 30.0)).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
