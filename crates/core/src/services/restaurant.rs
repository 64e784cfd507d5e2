//! Restaurant service.

use crate::services::geocoding::GeocodingService;
use platebook_common::{AppError, AppResult, IdGenerator, PageRequest, Paginated};
use platebook_db::{
    entities::{restaurant, user},
    repositories::{GeoFilter, RestaurantFilter, RestaurantListing, RestaurantRepository, RestaurantSort},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Largest accepted search radius, in kilometres.
const MAX_RADIUS_KM: f64 = 20_000.0;

/// Query parameters of the restaurant listing.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantQuery {
    #[validate(length(max = 200))]
    pub search: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,

    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,

    /// Radius around (`lat`, `lng`) in kilometres.
    #[validate(range(exclusive_min = 0.0, max = 20_000.0))]
    pub radius: Option<f64>,

    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,

    #[validate(range(min = 0.0))]
    pub max_price: Option<f64>,

    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,

    /// `newest`, `rating`, `price`, `name` or `distance`.
    pub sort: Option<String>,
}

impl RestaurantQuery {
    /// Turn the raw query into a repository filter.
    pub fn into_filter(self) -> AppResult<RestaurantFilter> {
        self.validate()?;

        let geo = match (self.lat, self.lng, self.radius) {
            (Some(latitude), Some(longitude), radius) => Some(GeoFilter {
                latitude,
                longitude,
                radius_km: radius.unwrap_or(MAX_RADIUS_KM),
            }),
            (None, None, None) => None,
            (None, None, Some(_)) => {
                return Err(AppError::invalid_field(
                    "radius",
                    "radius requires lat and lng",
                ));
            }
            _ => {
                return Err(AppError::invalid_field(
                    "lat",
                    "lat and lng must be given together",
                ));
            }
        };

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(AppError::invalid_field(
                    "minPrice",
                    "minPrice must not exceed maxPrice",
                ));
            }
        }

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("" | "newest") => RestaurantSort::Newest,
            Some("rating") => RestaurantSort::Rating,
            Some("price") => RestaurantSort::Price,
            Some("name") => RestaurantSort::Name,
            Some("distance") if geo.is_some() => RestaurantSort::Distance,
            Some("distance") => {
                return Err(AppError::invalid_field(
                    "sort",
                    "Sorting by distance requires lat and lng",
                ));
            }
            Some(_) => {
                return Err(AppError::invalid_field(
                    "sort",
                    "sort must be one of newest, rating, price, name, distance",
                ));
            }
        };

        Ok(RestaurantFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            geo,
            min_price: self.min_price,
            max_price: self.max_price,
            rating: self.rating,
            sort,
        })
    }
}

/// Input for creating a restaurant.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantInput {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 500, message = "Address is required"))]
    pub address: String,

    pub open_time: String,

    pub close_time: String,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20))]
    pub image_urls: Vec<String>,
}

/// Input for updating a restaurant. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 500))]
    pub address: Option<String>,

    pub open_time: Option<String>,

    pub close_time: Option<String>,

    #[validate(length(max = 5000))]
    pub description: Option<String>,

    #[validate(length(max = 20))]
    pub image_urls: Option<Vec<String>>,
}

/// A restaurant with its dish statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantDetail {
    pub restaurant: restaurant::Model,
    pub average_price: Option<f64>,
    pub dish_count: u64,
}

/// Check a 24-hour `HH:MM` time of day.
#[must_use]
pub fn is_valid_time_of_day(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    hours.len() == 2
        && minutes.len() == 2
        && hours.parse::<u8>().is_ok_and(|h| h < 24)
        && minutes.parse::<u8>().is_ok_and(|m| m < 60)
}

fn check_time(field: &str, value: &str) -> AppResult<()> {
    if is_valid_time_of_day(value) {
        Ok(())
    } else {
        Err(AppError::invalid_field(field, "Expected a time in HH:MM format"))
    }
}

/// Trim a required text field, rejecting values that are only whitespace.
pub(crate) fn trimmed_required(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(AppError::invalid_field(field, format!("{field} must not be blank")))
    } else {
        Ok(trimmed.to_string())
    }
}

fn require_admin(caller: &user::Model) -> AppResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

/// Restaurant service for business logic.
#[derive(Clone)]
pub struct RestaurantService {
    restaurant_repo: RestaurantRepository,
    geocoding: GeocodingService,
    id_gen: IdGenerator,
}

impl RestaurantService {
    /// Create a new restaurant service.
    #[must_use]
    pub fn new(restaurant_repo: RestaurantRepository, geocoding: GeocodingService) -> Self {
        Self {
            restaurant_repo,
            geocoding,
            id_gen: IdGenerator::new(),
        }
    }

    /// Filtered, sorted, paginated listing.
    pub async fn list(
        &self,
        query: RestaurantQuery,
        page: PageRequest,
    ) -> AppResult<Paginated<RestaurantListing>> {
        let filter = query.into_filter()?;
        let (rows, total) = self.restaurant_repo.search(&filter, page).await?;
        Ok(Paginated::new(rows, total, page))
    }

    /// A restaurant with its average dish price and dish count.
    pub async fn get(&self, id: &str) -> AppResult<RestaurantDetail> {
        let restaurant = self.restaurant_repo.get_by_id(id).await?;
        let (average_price, dish_count) = self.restaurant_repo.dish_stats(id).await?;
        Ok(RestaurantDetail {
            restaurant,
            average_price,
            dish_count,
        })
    }

    /// Create a restaurant (admin only). The address is geocoded.
    pub async fn create(
        &self,
        caller: &user::Model,
        input: CreateRestaurantInput,
    ) -> AppResult<restaurant::Model> {
        require_admin(caller)?;
        input.validate()?;
        check_time("openTime", &input.open_time)?;
        check_time("closeTime", &input.close_time)?;

        let name = trimmed_required("name", &input.name)?;
        let address = trimmed_required("address", &input.address)?;
        if self.restaurant_repo.find_by_name(&name).await?.is_some() {
            return Err(AppError::Conflict("Restaurant name already exists".to_string()));
        }

        let location = self.geocoding.locate(&address).await;

        let model = restaurant::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            address: Set(address),
            latitude: Set(location.point.latitude),
            longitude: Set(location.point.longitude),
            location_approximate: Set(location.approximate),
            open_time: Set(input.open_time),
            close_time: Set(input.close_time),
            description: Set(input.description),
            image_urls: Set(serde_json::json!(input.image_urls)),
            owner_id: Set(caller.id.clone()),
            avg_rating: Set(0.0),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let created = self.restaurant_repo.create(model).await?;
        tracing::info!(
            restaurant_id = %created.id,
            approximate = created.location_approximate,
            "Restaurant created"
        );
        Ok(created)
    }

    /// Update a restaurant (admin only). A changed address is re-geocoded.
    pub async fn update(
        &self,
        caller: &user::Model,
        id: &str,
        input: UpdateRestaurantInput,
    ) -> AppResult<restaurant::Model> {
        require_admin(caller)?;
        input.validate()?;
        if let Some(open_time) = &input.open_time {
            check_time("openTime", open_time)?;
        }
        if let Some(close_time) = &input.close_time {
            check_time("closeTime", close_time)?;
        }
        let new_name = input
            .name
            .as_deref()
            .map(|n| trimmed_required("name", n))
            .transpose()?;
        let new_address = input
            .address
            .as_deref()
            .map(|a| trimmed_required("address", a))
            .transpose()?;

        let existing = self.restaurant_repo.get_by_id(id).await?;
        let old_address = existing.address.clone();
        let old_name = existing.name.clone();
        let mut active: restaurant::ActiveModel = existing.into();

        if let Some(name) = new_name {
            if name != old_name {
                if self.restaurant_repo.find_by_name(&name).await?.is_some() {
                    return Err(AppError::Conflict("Restaurant name already exists".to_string()));
                }
                active.name = Set(name);
            }
        }

        if let Some(address) = new_address {
            if address != old_address {
                let location = self.geocoding.locate(&address).await;
                active.latitude = Set(location.point.latitude);
                active.longitude = Set(location.point.longitude);
                active.location_approximate = Set(location.approximate);
                active.address = Set(address);
            }
        }

        if let Some(open_time) = input.open_time {
            active.open_time = Set(open_time);
        }
        if let Some(close_time) = input.close_time {
            active.close_time = Set(close_time);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description).filter(|d| !d.is_empty()));
        }
        if let Some(image_urls) = input.image_urls {
            active.image_urls = Set(serde_json::json!(image_urls));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.restaurant_repo.update(active).await
    }

    /// Delete a restaurant (admin only). Its dishes and posts go with it.
    pub async fn delete(&self, caller: &user::Model, id: &str) -> AppResult<()> {
        require_admin(caller)?;
        self.restaurant_repo.delete(id).await?;
        tracing::info!(restaurant_id = %id, admin_id = %caller.id, "Restaurant deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::geocoding::{GeoPoint, tests::FixedGeocoder};
    use chrono::Utc;
    use platebook_common::config::GeocodingConfig;
    use platebook_db::entities::user::UserRole;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn caller(role: UserRole) -> user::Model {
        user::Model {
            id: "admin".to_string(),
            username: "admin".to_string(),
            username_lower: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: String::new(),
            name: None,
            avatar_url: None,
            role,
            is_banned: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn stored(name: &str, address: &str) -> restaurant::Model {
        restaurant::Model {
            id: "r1".to_string(),
            name: name.to_string(),
            address: address.to_string(),
            latitude: 21.0,
            longitude: 105.8,
            location_approximate: false,
            open_time: "08:00".to_string(),
            close_time: "22:00".to_string(),
            description: None,
            image_urls: serde_json::json!([]),
            owner_id: "admin".to_string(),
            avg_rating: 0.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> RestaurantService {
        let geocoder = FixedGeocoder(Ok(Some(GeoPoint {
            latitude: 21.0,
            longitude: 105.8,
        })));
        RestaurantService::new(
            RestaurantRepository::new(Arc::new(db.into_connection())),
            GeocodingService::new(Some(Arc::new(geocoder)), &GeocodingConfig::default()),
        )
    }

    fn create_input(name: &str) -> CreateRestaurantInput {
        CreateRestaurantInput {
            name: name.to_string(),
            address: "12 Hang Bac".to_string(),
            open_time: "07:30".to_string(),
            close_time: "21:00".to_string(),
            description: None,
            image_urls: vec![],
        }
    }

    #[test]
    fn test_time_of_day() {
        assert!(is_valid_time_of_day("00:00"));
        assert!(is_valid_time_of_day("23:59"));
        assert!(!is_valid_time_of_day("24:00"));
        assert!(!is_valid_time_of_day("7:30"));
        assert!(!is_valid_time_of_day("07:60"));
        assert!(!is_valid_time_of_day("noon"));
    }

    #[test]
    fn test_query_geo_requires_both_coordinates() {
        let query = RestaurantQuery {
            lat: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_query_distance_sort_needs_center() {
        let query = RestaurantQuery {
            sort: Some("distance".to_string()),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::Validation(_))));

        let filter = RestaurantQuery {
            lat: Some(10.0),
            lng: Some(106.0),
            radius: Some(5.0),
            sort: Some("distance".to_string()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.sort, RestaurantSort::Distance);
        assert!((filter.geo.unwrap().radius_km - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_query_price_bounds_ordered() {
        let query = RestaurantQuery {
            min_price: Some(50.0),
            max_price: Some(10.0),
            ..Default::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let result = svc.create(&caller(UserRole::User), create_input("Pho 10")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_time() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let mut input = create_input("Pho 10");
        input.close_time = "25:00".to_string();

        let result = svc.create(&caller(UserRole::Admin), input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_name_and_address() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let result = svc.create(&caller(UserRole::Admin), create_input("   ")).await;
        match result {
            Err(AppError::Validation(failure)) => assert_eq!(failure.errors[0].field, "name"),
            other => panic!("unexpected result: {other:?}"),
        }

        let mut input = create_input("Pho 10");
        input.address = " \t ".to_string();
        let result = svc.create(&caller(UserRole::Admin), input).await;
        match result {
            Err(AppError::Validation(failure)) => assert_eq!(failure.errors[0].field, "address"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));
        let input = UpdateRestaurantInput {
            name: Some("  ".to_string()),
            ..Default::default()
        };

        let result = svc.update(&caller(UserRole::Admin), "r1", input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_trimmed_required() {
        assert_eq!(trimmed_required("name", "  Pho 10 ").unwrap(), "Pho 10");
        assert!(trimmed_required("name", "").is_err());
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored("Pho 10", "1 A")]]),
        );
        let result = svc.create(&caller(UserRole::Admin), create_input("Pho 10")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_geocodes() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<restaurant::Model>::new()])
                .append_query_results([[stored("Pho 10", "12 Hang Bac")]]),
        );
        let created = svc
            .create(&caller(UserRole::Admin), create_input("Pho 10"))
            .await
            .unwrap();

        assert_eq!(created.name, "Pho 10");
        assert!(!created.location_approximate);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([
            MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            },
        ]));
        let result = svc.delete(&caller(UserRole::Admin), "nope").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
