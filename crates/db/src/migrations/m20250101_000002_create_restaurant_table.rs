//! Create restaurant table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Restaurant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Restaurant::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Restaurant::Address).string_len(512).not_null())
                    .col(ColumnDef::new(Restaurant::Latitude).double().not_null())
                    .col(ColumnDef::new(Restaurant::Longitude).double().not_null())
                    .col(
                        ColumnDef::new(Restaurant::LocationApproximate)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Restaurant::OpenTime).string_len(5).not_null())
                    .col(ColumnDef::new(Restaurant::CloseTime).string_len(5).not_null())
                    .col(ColumnDef::new(Restaurant::Description).text())
                    .col(
                        ColumnDef::new(Restaurant::ImageUrls)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Restaurant::OwnerId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Restaurant::AvgRating)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(Restaurant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Restaurant::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_restaurant_owner")
                            .from(Restaurant::Table, Restaurant::OwnerId)
                            .to(User::Table, User::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_name")
                    .table(Restaurant::Table)
                    .col(Restaurant::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: created_at (default "newest" ordering)
        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_created_at")
                    .table(Restaurant::Table)
                    .col(Restaurant::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_avg_rating")
                    .table(Restaurant::Table)
                    .col(Restaurant::AvgRating)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Restaurant {
    Table,
    Id,
    Name,
    Address,
    Latitude,
    Longitude,
    LocationApproximate,
    OpenTime,
    CloseTime,
    Description,
    ImageUrls,
    OwnerId,
    AvgRating,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
