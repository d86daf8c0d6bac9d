use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Banners {
    Table,
    Id,
    Title,
    Content,
    Link,
    IsActive,
    VisibleFrom,
    VisibleTo,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Banners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Banners::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Banners::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Banners::Content).text().not_null())
                    .col(ColumnDef::new(Banners::Link).string())
                    .col(
                        ColumnDef::new(Banners::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Banners::VisibleFrom).timestamp())
                    .col(ColumnDef::new(Banners::VisibleTo).timestamp())
                    .col(ColumnDef::new(Banners::CreatedBy).integer().not_null())
                    .col(
                        ColumnDef::new(Banners::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Banners::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_banners_created_by")
                            .from(Banners::Table, Banners::CreatedBy)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Banners::Table).to_owned())
            .await
    }
}
