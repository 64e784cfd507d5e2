//! Dish repository.

use std::sync::Arc;

use super::{db_err, like_pattern, write_err};
use crate::entities::{Dish, dish};
use platebook_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
    sea_query::{Expr, extension::postgres::PgExpr},
};

/// Dish listing filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DishFilter {
    pub restaurant_id: Option<String>,
    /// Case-insensitive match on name.
    pub search: Option<String>,
}

/// Dish repository for database operations.
#[derive(Clone)]
pub struct DishRepository {
    db: Arc<DatabaseConnection>,
}

impl DishRepository {
    /// Create a new dish repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a dish by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<dish::Model>> {
        Dish::find_by_id(id).one(self.db.as_ref()).await.map_err(db_err)
    }

    /// Find a dish by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<dish::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Dish".to_string()))
    }

    /// Find a dish by restaurant and name.
    pub async fn find_by_restaurant_and_name(
        &self,
        restaurant_id: &str,
        name: &str,
    ) -> AppResult<Option<dish::Model>> {
        Dish::find()
            .filter(dish::Column::RestaurantId.eq(restaurant_id))
            .filter(dish::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new dish.
    pub async fn create(&self, model: dish::ActiveModel) -> AppResult<dish::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(write_err("Dish already exists in this restaurant"))
    }

    /// Update a dish.
    pub async fn update(&self, model: dish::ActiveModel) -> AppResult<dish::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(write_err("Dish already exists in this restaurant"))
    }

    /// Delete a dish. Dish feedback goes with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Dish::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Dish".to_string()));
        }
        Ok(())
    }

    /// List dishes, ordered by name.
    pub async fn find_paginated(
        &self,
        filter: &DishFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<dish::Model>, u64)> {
        let mut query = Dish::find();

        if let Some(restaurant_id) = &filter.restaurant_id {
            query = query.filter(dish::Column::RestaurantId.eq(restaurant_id.as_str()));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            query = query.filter(Expr::col(dish::Column::Name).ilike(like_pattern(term)));
        }

        let total = query.clone().count(self.db.as_ref()).await.map_err(db_err)?;

        let dishes = query
            .order_by_asc(dish::Column::Name)
            .order_by_asc(dish::Column::Id)
            .offset(page.offset())
            .limit(page.limit)
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok((dishes, total))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_dish(id: &str, restaurant_id: &str, name: &str, price: f64) -> dish::Model {
        dish::Model {
            id: id.to_string(),
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
            price,
            description: None,
            image_url: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<dish::Model>::new()])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        assert!(matches!(
            repo.get_by_id("missing").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_by_restaurant_and_name() {
        let dish = create_test_dish("d1", "r1", "Pho Bo", 55.0);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[dish]])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        let found = repo
            .find_by_restaurant_and_name("r1", "Pho Bo")
            .await
            .unwrap();

        assert_eq!(found.map(|d| d.id), Some("d1".to_string()));
    }

    #[tokio::test]
    async fn test_find_paginated() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .append_query_results([[
                    create_test_dish("d1", "r1", "Banh Xeo", 40.0),
                    create_test_dish("d2", "r1", "Pho Bo", 55.0),
                ]])
                .into_connection(),
        );

        let repo = DishRepository::new(db);
        let filter = DishFilter {
            restaurant_id: Some("r1".to_string()),
            search: None,
        };
        let (dishes, total) = repo
            .find_paginated(&filter, PageRequest::new(Some(1), Some(2)))
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(dishes.len(), 2);
    }
}
