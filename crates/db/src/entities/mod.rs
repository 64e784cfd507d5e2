//! Database entities.

pub mod dish;
pub mod loved_restaurant;
pub mod notification;
pub mod post;
pub mod post_like;
pub mod restaurant;
pub mod user;
pub mod verification_code;

pub use dish::Entity as Dish;
pub use loved_restaurant::Entity as LovedRestaurant;
pub use notification::Entity as Notification;
pub use post::Entity as Post;
pub use post_like::Entity as PostLike;
pub use restaurant::Entity as Restaurant;
pub use user::Entity as User;
pub use verification_code::Entity as VerificationCode;
