//! Restaurant entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restaurant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub name: String,

    pub address: String,

    pub latitude: f64,

    pub longitude: f64,

    /// Coordinates are a jittered fallback, not a geocoding hit
    #[sea_orm(default_value = false)]
    pub location_approximate: bool,

    /// `HH:MM`
    pub open_time: String,

    /// `HH:MM`
    pub close_time: String,

    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Image URLs (JSON array of strings)
    #[sea_orm(column_type = "JsonBinary")]
    pub image_urls: Json,

    /// Admin who created the restaurant
    pub owner_id: String,

    /// Mean rating of feedback on the restaurant and its dishes (denormalized)
    #[sea_orm(default_value = 0.0)]
    pub avg_rating: f64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::dish::Entity")]
    Dishes,

    #[sea_orm(has_many = "super::post::Entity")]
    Posts,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id"
    )]
    Owner,
}

impl Related<super::dish::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Dishes.def()
    }
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
