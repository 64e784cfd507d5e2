//! Restaurant repository.

use std::sync::Arc;

use super::{db_err, like_pattern, write_err};
use crate::entities::{Restaurant, dish, restaurant};
use platebook_common::{AppError, AppResult, PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, QueryFilter, QuerySelect, Statement, Value,
    prelude::{DateTimeWithTimeZone, Json},
};

/// Mean Earth radius used for great-circle distances, in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestaurantSort {
    #[default]
    Newest,
    Rating,
    Price,
    Name,
    Distance,
}

/// Geographic radius filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

/// Restaurant listing filter. Stages apply in field order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantFilter {
    /// Case-insensitive match on name or address.
    pub search: Option<String>,
    pub geo: Option<GeoFilter>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    /// Minimum average rating, rounded to the nearest integer.
    pub rating: Option<f64>,
    pub sort: RestaurantSort,
}

/// One row of a restaurant listing.
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct RestaurantListing {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_approximate: bool,
    pub open_time: String,
    pub close_time: String,
    pub description: Option<String>,
    pub image_urls: Json,
    pub owner_id: String,
    pub avg_rating: f64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: Option<DateTimeWithTimeZone>,
    /// Mean price of the restaurant's dishes, absent without dishes.
    pub average_price: Option<f64>,
    /// Distance from the query centre in kilometres, when one was given.
    pub distance: Option<f64>,
}

impl RestaurantListing {
    /// Split into the stored model and the computed columns.
    #[must_use]
    pub fn into_parts(self) -> (restaurant::Model, Option<f64>, Option<f64>) {
        (
            restaurant::Model {
                id: self.id,
                name: self.name,
                address: self.address,
                latitude: self.latitude,
                longitude: self.longitude,
                location_approximate: self.location_approximate,
                open_time: self.open_time,
                close_time: self.close_time,
                description: self.description,
                image_urls: self.image_urls,
                owner_id: self.owner_id,
                avg_rating: self.avg_rating,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            self.average_price,
            self.distance,
        )
    }
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct DishStatsRow {
    average_price: Option<f64>,
    dish_count: i64,
}

/// Listing SQL with its bind values.
#[derive(Debug)]
struct ListingQuery {
    select: String,
    count: String,
    values: Vec<Value>,
}

/// Builds the listing statements.
///
/// The CTE applies the text and radius filters and joins the per-restaurant
/// mean dish price; the outer query applies price and rating filters, then
/// sorts. The count statement reuses the same filters without paging.
fn build_listing_query(filter: &RestaurantFilter, page: PageRequest) -> ListingQuery {
    let mut values: Vec<Value> = Vec::new();
    let mut bind = |v: Value| {
        values.push(v);
        format!("${}", values.len())
    };

    let mut inner_where: Vec<String> = Vec::new();

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let p = bind(like_pattern(term).into());
        inner_where.push(format!("(r.name ILIKE {p} OR r.address ILIKE {p})"));
    }

    let distance_expr = filter.geo.map_or_else(
        || "NULL::float8".to_string(),
        |geo| {
            let lat = bind(geo.latitude.into());
            let lng = bind(geo.longitude.into());
            format!(
                "{EARTH_RADIUS_KM}::float8 * 2 * ASIN(SQRT(\
                 POWER(SIN(RADIANS(r.latitude - {lat}::float8) / 2), 2) + \
                 COS(RADIANS({lat}::float8)) * COS(RADIANS(r.latitude)) * \
                 POWER(SIN(RADIANS(r.longitude - {lng}::float8) / 2), 2)))"
            )
        },
    );

    if let Some(geo) = filter.geo {
        let radius = bind(geo.radius_km.into());
        inner_where.push(format!("{distance_expr} <= {radius}::float8"));
    }

    let mut outer_where: Vec<String> = Vec::new();

    if let Some(min) = filter.min_price {
        let p = bind(min.into());
        outer_where.push(format!("average_price >= {p}::float8"));
    }
    if let Some(max) = filter.max_price {
        let p = bind(max.into());
        outer_where.push(format!("average_price <= {p}::float8"));
    }
    if let Some(rating) = filter.rating {
        let p = bind(rating.round().into());
        outer_where.push(format!("avg_rating >= {p}::float8"));
    }

    let where_sql = |clauses: &[String]| {
        if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        }
    };

    let cte = format!(
        "WITH listing AS (\
         SELECT r.*, dp.average_price, {distance_expr} AS distance \
         FROM restaurant r \
         LEFT JOIN (SELECT restaurant_id, AVG(price)::float8 AS average_price \
         FROM dish GROUP BY restaurant_id) dp ON dp.restaurant_id = r.id \
         {inner}) ",
        inner = where_sql(&inner_where),
    );
    let outer = where_sql(&outer_where);

    let order = match filter.sort {
        RestaurantSort::Newest => "created_at DESC",
        RestaurantSort::Rating => "avg_rating DESC, created_at DESC",
        RestaurantSort::Price => "average_price ASC NULLS LAST, created_at DESC",
        RestaurantSort::Name => "name ASC",
        RestaurantSort::Distance if filter.geo.is_some() => "distance ASC",
        RestaurantSort::Distance => "created_at DESC",
    };

    let count = format!("{cte}SELECT COUNT(*)::int8 AS total FROM listing {outer}");
    let select = format!(
        "{cte}SELECT * FROM listing {outer} ORDER BY {order}, id DESC LIMIT {limit} OFFSET {offset}",
        limit = page.limit,
        offset = page.offset(),
    );

    ListingQuery {
        select,
        count,
        values,
    }
}

/// Restaurant repository for database operations.
#[derive(Clone)]
pub struct RestaurantRepository {
    db: Arc<DatabaseConnection>,
}

impl RestaurantRepository {
    /// Create a new restaurant repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a restaurant by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Find a restaurant by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<restaurant::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Restaurant".to_string()))
    }

    /// Find a restaurant by exact name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<restaurant::Model>> {
        Restaurant::find()
            .filter(restaurant::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(db_err)
    }

    /// Create a new restaurant.
    pub async fn create(&self, model: restaurant::ActiveModel) -> AppResult<restaurant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(write_err("Restaurant name already exists"))
    }

    /// Update a restaurant.
    pub async fn update(&self, model: restaurant::ActiveModel) -> AppResult<restaurant::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(write_err("Restaurant name already exists"))
    }

    /// Delete a restaurant. Dishes and posts go with it.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = Restaurant::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Restaurant".to_string()));
        }
        Ok(())
    }

    /// Run the filtered, sorted, paginated listing.
    pub async fn search(
        &self,
        filter: &RestaurantFilter,
        page: PageRequest,
    ) -> AppResult<(Vec<RestaurantListing>, u64)> {
        let query = build_listing_query(filter, page);

        let total = CountRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &query.count,
            query.values.clone(),
        ))
        .one(self.db.as_ref())
        .await
        .map_err(db_err)?
        .map_or(0, |row| u64::try_from(row.total).unwrap_or(0));

        let rows = RestaurantListing::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            &query.select,
            query.values,
        ))
        .all(self.db.as_ref())
        .await
        .map_err(db_err)?;

        Ok((rows, total))
    }

    /// Mean dish price and dish count for one restaurant.
    pub async fn dish_stats(&self, restaurant_id: &str) -> AppResult<(Option<f64>, u64)> {
        let row = dish::Entity::find()
            .select_only()
            .column_as(sea_orm::sea_query::Expr::cust("AVG(price)::float8"), "average_price")
            .column_as(sea_orm::sea_query::Expr::cust("COUNT(*)::int8"), "dish_count")
            .filter(dish::Column::RestaurantId.eq(restaurant_id))
            .into_model::<DishStatsRow>()
            .one(self.db.as_ref())
            .await
            .map_err(db_err)?;

        Ok(row.map_or((None, 0), |r| {
            (r.average_price, u64::try_from(r.dish_count).unwrap_or(0))
        }))
    }

    /// Recompute the denormalized average rating in one statement.
    ///
    /// The mean covers feedback on the restaurant and dish feedback on its
    /// dishes, regardless of review state; 0 when there is none.
    pub async fn recompute_avg_rating(&self, restaurant_id: &str) -> AppResult<f64> {
        let sql = r"
            UPDATE restaurant SET avg_rating = COALESCE((
                SELECT AVG(p.rating)::float8 FROM post p
                WHERE p.rating IS NOT NULL
                  AND p.post_type IN ('feedback', 'dish_feedback')
                  AND (p.restaurant_id = $1
                       OR p.dish_id IN (SELECT d.id FROM dish d WHERE d.restaurant_id = $1))
            ), 0)
            WHERE id = $1
            RETURNING avg_rating
        ";

        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                sql,
                [restaurant_id.into()],
            ))
            .await
            .map_err(db_err)?
            .ok_or_else(|| AppError::NotFound("Restaurant".to_string()))?;

        let avg: f64 = row.try_get("", "avg_rating").map_err(db_err)?;
        tracing::debug!(restaurant_id = %restaurant_id, avg_rating = avg, "Recomputed average rating");
        Ok(avg)
    }
}
