//! Create loved restaurant table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LovedRestaurant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LovedRestaurant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LovedRestaurant::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(LovedRestaurant::RestaurantId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LovedRestaurant::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loved_restaurant_user")
                            .from(LovedRestaurant::Table, LovedRestaurant::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_loved_restaurant_restaurant")
                            .from(LovedRestaurant::Table, LovedRestaurant::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_loved_restaurant_user_restaurant")
                    .table(LovedRestaurant::Table)
                    .col(LovedRestaurant::UserId)
                    .col(LovedRestaurant::RestaurantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LovedRestaurant::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum LovedRestaurant {
    Table,
    Id,
    UserId,
    RestaurantId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Restaurant {
    Table,
    Id,
}
