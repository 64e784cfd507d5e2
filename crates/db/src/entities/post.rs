//! Post entity (feedback, dish feedback and comments share one table).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Post discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PostType {
    #[sea_orm(string_value = "feedback")]
    #[serde(rename = "Feedback")]
    Feedback,
    #[sea_orm(string_value = "dish_feedback")]
    #[serde(rename = "DishFeedback")]
    DishFeedback,
    #[sea_orm(string_value = "comment")]
    #[serde(rename = "Comment")]
    Comment,
}

impl PostType {
    /// Whether posts of this type carry a rating.
    #[must_use]
    pub const fn is_rated(self) -> bool {
        matches!(self, Self::Feedback | Self::DishFeedback)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "post")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub post_type: PostType,

    pub author_id: String,

    /// Set for feedback only
    #[sea_orm(nullable)]
    pub restaurant_id: Option<String>,

    /// Set for dish feedback only
    #[sea_orm(nullable)]
    pub dish_id: Option<String>,

    /// Set for comments only
    #[sea_orm(nullable)]
    pub parent_id: Option<String>,

    /// 1-5, absent on comments
    #[sea_orm(nullable)]
    pub rating: Option<i32>,

    #[sea_orm(nullable)]
    pub caption: Option<String>,

    #[sea_orm(column_type = "Text")]
    pub content: String,

    /// Media URLs (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub media_urls: Json,

    /// Number of likes (denormalized)
    #[sea_orm(default_value = 0)]
    pub like_count: i32,

    #[sea_orm(default_value = false)]
    pub reviewed: bool,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::restaurant::Entity",
        from = "Column::RestaurantId",
        to = "super::restaurant::Column::Id",
        on_delete = "Cascade"
    )]
    Restaurant,

    #[sea_orm(
        belongs_to = "super::dish::Entity",
        from = "Column::DishId",
        to = "super::dish::Column::Id",
        on_delete = "Cascade"
    )]
    Dish,

    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,

    #[sea_orm(has_many = "super::post_like::Entity")]
    Likes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::restaurant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Restaurant.def()
    }
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dish.def()
    }
}

impl Related<super::post_like::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
