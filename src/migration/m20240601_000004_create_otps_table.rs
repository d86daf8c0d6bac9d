use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Otps {
    Table,
    Id,
    UserId,
    OtpHash,
    Purpose,
    Used,
    ExpiresAt,
    CreatedAt,
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
                    .table(Otps::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Otps::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Otps::UserId).integer().not_null())
                    .col(ColumnDef::new(Otps::OtpHash).string().not_null())
                    .col(
                        ColumnDef::new(Otps::Purpose)
                            .string_len(30)
                            .not_null()
                            .default("forgot_password"),
                    )
                    .col(
                        ColumnDef::new(Otps::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Otps::ExpiresAt).timestamp().not_null())
                    .col(
                        ColumnDef::new(Otps::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_otps_user_id")
                            .from(Otps::Table, Otps::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otps_user_id_created_at")
                    .table(Otps::Table)
                    .col(Otps::UserId)
                    .col(Otps::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Otps::Table).to_owned())
            .await
    }
}
