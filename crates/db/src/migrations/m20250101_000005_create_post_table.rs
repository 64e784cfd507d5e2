//! Create post table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Post::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Post::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Post::PostType).string_len(16).not_null())
                    .col(ColumnDef::new(Post::AuthorId).string_len(32).not_null())
                    .col(ColumnDef::new(Post::RestaurantId).string_len(32))
                    .col(ColumnDef::new(Post::DishId).string_len(32))
                    .col(ColumnDef::new(Post::ParentId).string_len(32))
                    .col(ColumnDef::new(Post::Rating).integer())
                    .col(ColumnDef::new(Post::Caption).string_len(512))
                    .col(ColumnDef::new(Post::Content).text().not_null())
                    .col(
                        ColumnDef::new(Post::MediaUrls)
                            .json_binary()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Post::LikeCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Post::Reviewed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Post::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Post::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_author")
                            .from(Post::Table, Post::AuthorId)
                            .to(User::Table, User::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_restaurant")
                            .from(Post::Table, Post::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_dish")
                            .from(Post::Table, Post::DishId)
                            .to(Dish::Table, Dish::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_post_parent")
                            .from(Post::Table, Post::ParentId)
                            .to(Post::Table, Post::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Rating stays in range even for rows written outside the service layer
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE post ADD CONSTRAINT chk_post_rating \
                 CHECK (rating IS NULL OR rating BETWEEN 1 AND 5)",
            )
            .await?;

        for (name, col) in [
            ("idx_post_author_id", Post::AuthorId),
            ("idx_post_restaurant_id", Post::RestaurantId),
            ("idx_post_dish_id", Post::DishId),
            ("idx_post_parent_id", Post::ParentId),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Post::Table)
                        .col(col)
                        .to_owned(),
                )
                .await?;
        }

        // Index: (reviewed, created_at) for the default listing
        manager
            .create_index(
                Index::create()
                    .name("idx_post_reviewed_created_at")
                    .table(Post::Table)
                    .col(Post::Reviewed)
                    .col(Post::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Post::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
enum Post {
    Table,
    Id,
    PostType,
    AuthorId,
    RestaurantId,
    DishId,
    ParentId,
    Rating,
    Caption,
    Content,
    MediaUrls,
    LikeCount,
    Reviewed,
    CreatedAt,
    UpdatedAt,
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

#[derive(Iden)]
enum Dish {
    Table,
    Id,
}
