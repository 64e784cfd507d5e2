//! Database repositories.

pub mod dish;
pub mod like;
pub mod loved_restaurant;
pub mod notification;
pub mod post;
pub mod restaurant;
pub mod user;
pub mod verification_code;

pub use dish::{DishFilter, DishRepository};
pub use like::LikeRepository;
pub use loved_restaurant::LovedRestaurantRepository;
pub use notification::NotificationRepository;
pub use post::{PostFilter, PostRepository};
pub use restaurant::{
    GeoFilter, RestaurantFilter, RestaurantListing, RestaurantRepository, RestaurantSort,
};
pub use user::UserRepository;
pub use verification_code::VerificationCodeRepository;

use platebook_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map a database error to an application error.
pub(crate) fn db_err(e: DbErr) -> AppError {
    AppError::Database(e.to_string())
}

/// Map a write error, turning unique-constraint violations into `Conflict`.
pub(crate) fn write_err(conflict: &str) -> impl Fn(DbErr) -> AppError + '_ {
    move |e| match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(conflict.to_string()),
        _ => db_err(e),
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
