//! API integration tests.
//!
//! These tests drive the full router with a mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use platebook_api::{AppState, NotificationGateway, app};
use platebook_common::config::{EmailConfig, GeocodingConfig};
use platebook_core::{
    DishService, EmailService, GeocodingService, LikeService, NotificationService, PostService,
    RestaurantService, TokenService, UserService, VerificationService,
};
use platebook_db::{
    entities::{
        notification::{self, NotificationType},
        post::{self, PostType},
        post_like,
        user::{self, UserRole},
    },
    repositories::{
        DishRepository, LikeRepository, LovedRestaurantRepository, NotificationRepository,
        PostRepository, RestaurantRepository, UserRepository, VerificationCodeRepository,
    },
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use serde_json::Value as Json;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

fn tokens() -> TokenService {
    TokenService::new(SECRET, 1)
}

/// Build the app over a mock database.
fn create_test_app(db: MockDatabase) -> Router {
    let db = Arc::new(db.into_connection());
    let gateway = NotificationGateway::new();

    let user_repo = UserRepository::new(Arc::clone(&db));
    let restaurant_repo = RestaurantRepository::new(Arc::clone(&db));
    let dish_repo = DishRepository::new(Arc::clone(&db));
    let post_repo = PostRepository::new(Arc::clone(&db));

    let notification_service = NotificationService::new(
        NotificationRepository::new(Arc::clone(&db)),
        Arc::new(gateway.clone()),
    );
    let user_service = UserService::new(
        user_repo.clone(),
        LovedRestaurantRepository::new(Arc::clone(&db)),
        restaurant_repo.clone(),
        tokens(),
    );
    let geocoding = GeocodingService::new(
        None,
        &GeocodingConfig {
            enabled: false,
            ..Default::default()
        },
    );
    let restaurant_service = RestaurantService::new(restaurant_repo.clone(), geocoding);
    let dish_service = DishService::new(dish_repo.clone(), restaurant_repo.clone());
    let post_service = PostService::new(
        post_repo.clone(),
        user_repo.clone(),
        restaurant_repo,
        dish_repo,
        notification_service.clone(),
    );
    let like_service = LikeService::new(
        LikeRepository::new(Arc::clone(&db)),
        post_repo,
        user_repo,
        notification_service.clone(),
    );
    let verification_service = VerificationService::new(
        VerificationCodeRepository::new(Arc::clone(&db)),
        EmailService::new(&EmailConfig::default()).expect("email service"),
        10,
    );

    app(AppState {
        user_service,
        restaurant_service,
        dish_service,
        post_service,
        like_service,
        notification_service,
        verification_service,
        gateway,
    })
}

fn member(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_lowercase(),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        name: None,
        avatar_url: None,
        role,
        is_banned: false,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn bearer(user: &user::Model) -> String {
    format!("Bearer {}", tokens().issue(user).unwrap())
}

fn post_row() -> post::Model {
    post::Model {
        id: "p1".to_string(),
        post_type: PostType::Feedback,
        author_id: "author".to_string(),
        restaurant_id: Some("r1".to_string()),
        dish_id: None,
        parent_id: None,
        rating: Some(5),
        caption: None,
        content: "Best banh xeo in town".to_string(),
        media_urls: serde_json::json!([]),
        like_count: 0,
        reviewed: true,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn like_row() -> post_like::Model {
    post_like::Model {
        id: "l1".to_string(),
        post_id: "p1".to_string(),
        user_id: "fan".to_string(),
        created_at: Utc::now().into(),
    }
}

fn count_row(n: i32) -> std::collections::BTreeMap<&'static str, Value> {
    maplit::btreemap! { "like_count" => Value::Int(Some(n)) }
}

fn exec(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Json {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("GET", "/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("GET", "/nonexistent/endpoint", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_requires_token() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("GET", "/users/profile", None)).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_profile_with_token() {
    let me = member("mai", UserRole::User);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[me.clone()]]),
    );

    let response = send(&app, empty_request("GET", "/users/profile", Some(&bearer(&me)))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["username"], "mai");
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_with_invalid_json() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(
        &app,
        json_request("POST", "/users/register", None, "invalid json"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_register_reports_field_errors() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(
        &app,
        json_request(
            "POST",
            "/users/register",
            None,
            r#"{"username":"mai","email":"not-an-email","password":"short"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn test_register_admin_as_non_admin_is_forbidden() {
    let caller = member("bao", UserRole::User);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[caller.clone()]]),
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/users/register-admin",
            Some(&bearer(&caller)),
            r#"{"username":"chef","email":"chef@example.com","password":"long enough"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_register_admin_as_admin_creates_admin() {
    let caller = member("root", UserRole::Admin);
    let created = member("chef", UserRole::Admin);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[caller.clone()]])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[created]]),
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/users/register-admin",
            Some(&bearer(&caller)),
            r#"{"username":"chef","email":"chef@example.com","password":"long enough"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["role"], "admin");
}

#[tokio::test]
async fn test_like_unlike_scenario() {
    let fan = member("fan", UserRole::User);
    let stored_notification = notification::Model {
        id: "n1".to_string(),
        notification_type: NotificationType::Like,
        recipient_id: "author".to_string(),
        sender_id: "fan".to_string(),
        post_id: "p1".to_string(),
        message: "fan liked your post".to_string(),
        is_sent: false,
        created_at: Utc::now().into(),
    };

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        // like: user, post, no existing like, inserted like, counter, notification
        .append_query_results([[fan.clone()]])
        .append_query_results([[post_row()]])
        .append_query_results([Vec::<post_like::Model>::new()])
        .append_query_results([[like_row()]])
        .append_query_results([[count_row(1)]])
        .append_query_results([[stored_notification]])
        // like again: user, post, existing like
        .append_query_results([[fan.clone()]])
        .append_query_results([[post_row()]])
        .append_query_results([[like_row()]])
        // unlike: user, post, counter
        .append_query_results([[fan.clone()]])
        .append_query_results([[post_row()]])
        .append_query_results([[count_row(0)]])
        // unlike again: user, post
        .append_query_results([[fan.clone()]])
        .append_query_results([[post_row()]])
        .append_exec_results([exec(1), exec(1), exec(1), exec(0)]);
    let app = create_test_app(db);
    let auth = bearer(&fan);

    let response = send(&app, empty_request("POST", "/posts/p1/like", Some(&auth))).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["likeCount"], 1);

    let response = send(&app, empty_request("POST", "/posts/p1/like", Some(&auth))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = send(&app, empty_request("DELETE", "/posts/p1/unlike", Some(&auth))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["likeCount"], 0);

    let response = send(&app, empty_request("DELETE", "/posts/p1/unlike", Some(&auth))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_requires_token() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("POST", "/posts/p1/like", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unreviewed_listing_forbidden_for_non_admin() {
    let caller = member("bao", UserRole::User);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[caller.clone()]]),
    );

    let response = send(
        &app,
        empty_request("GET", "/posts?reviewed=false", Some(&bearer(&caller))),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_banned_user_cannot_post() {
    let banned = user::Model {
        is_banned: true,
        ..member("troll", UserRole::Admin)
    };
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[banned.clone()]]),
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/posts",
            Some(&bearer(&banned)),
            r#"{"type":"Feedback","restaurantId":"r1","rating":5,"content":"spam"}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_restaurant_requires_admin() {
    let caller = member("bao", UserRole::User);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[caller.clone()]]),
    );

    let response = send(
        &app,
        json_request(
            "POST",
            "/restaurants",
            Some(&bearer(&caller)),
            r#"{"name":"Pho 24","address":"5 Nguyen Thiep","openTime":"06:00","closeTime":"22:00"}"#,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_distance_sort_without_center_is_rejected() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("GET", "/restaurants?sort=distance", None)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "sort");
}

#[tokio::test]
async fn test_page_limit_out_of_range_is_rejected() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(&app, empty_request("GET", "/dishes?limit=1000", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notifications_listing() {
    let me = member("author", UserRole::User);
    let app = create_test_app(
        MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[me.clone()]])
            .append_query_results([[maplit::btreemap! {
                "num_items" => Value::BigInt(Some(0))
            }]])
            .append_query_results([Vec::<notification::Model>::new()]),
    );

    let response = send(
        &app,
        empty_request("GET", "/notifications?page=1&limit=5", Some(&bearer(&me))),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 0);
    assert_eq!(body["limit"], 5);
    assert_eq!(body["totalPages"], 0);
}

#[tokio::test]
async fn test_huge_page_number_is_rejected() {
    let app = create_test_app(MockDatabase::new(DatabaseBackend::Postgres));

    let response = send(
        &app,
        empty_request("GET", "/posts?page=18446744073709551615", None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["errors"][0]["field"], "page");
}
