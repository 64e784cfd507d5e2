//! Loved restaurant repository.

use std::sync::Arc;

use super::{db_err, write_err};
use crate::entities::{LovedRestaurant, Restaurant, loved_restaurant, restaurant};
use platebook_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

/// Repository for the user ↔ restaurant favourites set.
#[derive(Clone)]
pub struct LovedRestaurantRepository {
    db: Arc<DatabaseConnection>,
}

impl LovedRestaurantRepository {
    /// Create a new loved restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check whether a user already loves a restaurant.
    pub async fn exists(&self, user_id: &str, restaurant_id: &str) -> AppResult<bool> {
        let found = LovedRestaurant::find()
            .filter(loved_restaurant::Column::UserId.eq(user_id))
            .filter(loved_restaurant::Column::RestaurantId.eq(restaurant_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    /// Add a restaurant to a user's set.
    pub async fn create(
        &self,
        model: loved_restaurant::ActiveModel,
    ) -> AppResult<loved_restaurant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(write_err("Restaurant already loved"))
    }

    /// Remove a restaurant from a user's set. Returns whether a row was removed.
    pub async fn delete(&self, user_id: &str, restaurant_id: &str) -> AppResult<bool> {
        let result = LovedRestaurant::delete_many()
            .filter(loved_restaurant::Column::UserId.eq(user_id))
            .filter(loved_restaurant::Column::RestaurantId.eq(restaurant_id))
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    /// Restaurants loved by a user, most recently loved first.
    pub async fn find_restaurants_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<restaurant::Model>> {
        let ids: Vec<String> = LovedRestaurant::find()
            .select_only()
            .column(loved_restaurant::Column::RestaurantId)
            .filter(loved_restaurant::Column::UserId.eq(user_id))
            .order_by_desc(loved_restaurant::Column::CreatedAt)
            .into_tuple()
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if ids.is_empty() {
            return Ok(vec![]);
        }

        let mut restaurants = Restaurant::find()
            .filter(restaurant::Column::Id.is_in(ids.clone()))
            .all(self.db.as_ref())
            .await
            .map_err(db_err)?;

        restaurants.sort_by_key(|r| ids.iter().position(|id| *id == r.id));
        Ok(restaurants)
    }
}
