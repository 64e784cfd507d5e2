//! Business logic services.

pub mod auth;
pub mod dish;
pub mod email;
pub mod geocoding;
pub mod like;
pub mod live_delivery;
pub mod notification;
pub mod post;
pub mod restaurant;
pub mod user;
pub mod verification;

pub use auth::{Claims, TokenService, hash_password, verify_password};
pub use dish::{CreateDishInput, DishQuery, DishService, UpdateDishInput};
pub use email::EmailService;
pub use geocoding::{GeoPoint, Geocoder, GeocoderService, GeocodingService, Location, NominatimGeocoder};
pub use like::LikeService;
pub use live_delivery::{LiveDelivery, LiveDeliveryService, NoOpLiveDelivery, NotificationEvent};
pub use notification::{NotificationService, notification_message};
pub use post::{
    CreatePostInput, PostDetail, PostKind, PostQuery, PostService, PostSummary, PostTarget, Rating,
    UpdatePostInput,
};
pub use restaurant::{
    CreateRestaurantInput, RestaurantDetail, RestaurantQuery, RestaurantService,
    UpdateRestaurantInput,
};
pub use user::{
    AuthSession, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput, UserService,
};
pub use verification::{SendCodeInput, VerificationService, VerifyCodeInput};
