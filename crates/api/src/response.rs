//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use platebook_core::{AuthSession, PostDetail, PostSummary, PostTarget, RestaurantDetail};
use platebook_db::{
    entities::{
        dish,
        notification::{self, NotificationType},
        post::{self, PostType},
        restaurant,
        user::{self, UserRole},
    },
    repositories::RestaurantListing,
};
use serde::Serialize;
use serde_json::Value;

/// JSON response with a status code.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK.
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    /// 201 Created.
    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.data)).into_response()
    }
}

/// Plain `{ "message": ... }` body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

fn string_list(value: Value) -> Vec<String> {
    serde_json::from_value(value).unwrap_or_default()
}

/// User response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub is_banned: bool,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            avatar_url: user.avatar_url,
            role: user.role,
            is_banned: user.is_banned,
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Public author card embedded in posts.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<user::Model> for UserSummary {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            name: user.name,
            avatar_url: user.avatar_url,
        }
    }
}

/// Token plus the signed-in user.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<AuthSession> for AuthResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Restaurant response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantResponse {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_approximate: bool,
    pub open_time: String,
    pub close_time: String,
    pub description: Option<String>,
    pub image_urls: Vec<String>,
    pub owner_id: String,
    pub avg_rating: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_count: Option<u64>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<restaurant::Model> for RestaurantResponse {
    fn from(r: restaurant::Model) -> Self {
        Self {
            id: r.id,
            name: r.name,
            address: r.address,
            latitude: r.latitude,
            longitude: r.longitude,
            location_approximate: r.location_approximate,
            open_time: r.open_time,
            close_time: r.close_time,
            description: r.description,
            image_urls: string_list(r.image_urls),
            owner_id: r.owner_id,
            avg_rating: r.avg_rating,
            average_price: None,
            distance: None,
            dish_count: None,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<RestaurantListing> for RestaurantResponse {
    fn from(listing: RestaurantListing) -> Self {
        let (model, average_price, distance) = listing.into_parts();
        Self {
            average_price,
            distance,
            ..model.into()
        }
    }
}

impl From<RestaurantDetail> for RestaurantResponse {
    fn from(detail: RestaurantDetail) -> Self {
        Self {
            average_price: detail.average_price,
            dish_count: Some(detail.dish_count),
            ..detail.restaurant.into()
        }
    }
}

/// Dish response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DishResponse {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<dish::Model> for DishResponse {
    fn from(d: dish::Model) -> Self {
        Self {
            id: d.id,
            restaurant_id: d.restaurant_id,
            name: d.name,
            price: d.price,
            description: d.description,
            image_url: d.image_url,
            created_at: d.created_at.to_rfc3339(),
            updated_at: d.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// What a post is about.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TargetResponse {
    #[serde(rename_all = "camelCase")]
    Restaurant { id: String, name: String },
    #[serde(rename_all = "camelCase")]
    Dish {
        id: String,
        name: String,
        restaurant_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Post { id: String },
}

impl From<PostTarget> for TargetResponse {
    fn from(target: PostTarget) -> Self {
        match target {
            PostTarget::Restaurant { id, name } => Self::Restaurant { id, name },
            PostTarget::Dish {
                id,
                name,
                restaurant_id,
            } => Self::Dish {
                id,
                name,
                restaurant_id,
            },
            PostTarget::Parent { id } => Self::Post { id },
        }
    }
}

/// Post response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub post_type: PostType,
    pub author_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dish_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<i32>,
    pub caption: Option<String>,
    pub content: String,
    pub media_urls: Vec<String>,
    pub like_count: i32,
    pub reviewed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetResponse>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<post::Model> for PostResponse {
    fn from(p: post::Model) -> Self {
        Self {
            id: p.id,
            post_type: p.post_type,
            author_id: p.author_id,
            author: None,
            restaurant_id: p.restaurant_id,
            dish_id: p.dish_id,
            parent_id: p.parent_id,
            rating: p.rating,
            caption: p.caption,
            content: p.content,
            media_urls: string_list(p.media_urls),
            like_count: p.like_count,
            reviewed: p.reviewed,
            target: None,
            created_at: p.created_at.to_rfc3339(),
            updated_at: p.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<PostSummary> for PostResponse {
    fn from(summary: PostSummary) -> Self {
        Self {
            author: summary.author.map(Into::into),
            ..summary.post.into()
        }
    }
}

impl From<PostDetail> for PostResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            author: Some(detail.author.into()),
            target: Some(detail.target.into()),
            ..detail.post.into()
        }
    }
}

/// New like counter of a post.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeCountResponse {
    pub post_id: String,
    pub like_count: i32,
}

/// Notification response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub recipient_id: String,
    pub sender_id: String,
    pub post_id: String,
    pub message: String,
    pub is_sent: bool,
    pub created_at: String,
}

impl From<notification::Model> for NotificationResponse {
    fn from(n: notification::Model) -> Self {
        Self {
            id: n.id,
            notification_type: n.notification_type,
            recipient_id: n.recipient_id,
            sender_id: n.sender_id,
            post_id: n.post_id,
            message: n.message,
            is_sent: n.is_sent,
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_post_response_shape() {
        let model = post::Model {
            id: "p1".to_string(),
            post_type: PostType::DishFeedback,
            author_id: "u1".to_string(),
            restaurant_id: None,
            dish_id: Some("d1".to_string()),
            parent_id: None,
            rating: Some(4),
            caption: None,
            content: "Crunchy".to_string(),
            media_urls: serde_json::json!(["https://cdn.example.com/a.jpg"]),
            like_count: 2,
            reviewed: false,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let json = serde_json::to_value(PostResponse::from(model)).unwrap();

        assert_eq!(json["type"], "DishFeedback");
        assert_eq!(json["dishId"], "d1");
        assert_eq!(json["likeCount"], 2);
        assert_eq!(json["mediaUrls"][0], "https://cdn.example.com/a.jpg");
        assert!(json.get("restaurantId").is_none());
        assert!(json.get("parentId").is_none());
    }

    #[test]
    fn test_user_response_hides_password() {
        let user = user::Model {
            id: "u1".to_string(),
            username: "Mai".to_string(),
            username_lower: "mai".to_string(),
            email: "mai@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: None,
            avatar_url: None,
            role: UserRole::Admin,
            is_banned: false,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        let text = serde_json::to_string(&UserResponse::from(user)).unwrap();

        assert!(!text.contains("argon2"));
        assert!(text.contains(r#""role":"admin""#));
        assert!(text.contains(r#""isBanned":false"#));
    }
}
