use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum AuditLogs {
    Table,
    Id,
    AdminId,
    Action,
    TargetId,
    TargetType,
    Details,
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
                    .table(AuditLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuditLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuditLogs::AdminId).integer().not_null())
                    .col(ColumnDef::new(AuditLogs::Action).string_len(50).not_null())
                    .col(ColumnDef::new(AuditLogs::TargetId).integer().not_null())
                    .col(
                        ColumnDef::new(AuditLogs::TargetType)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuditLogs::Details).json_binary())
                    .col(
                        ColumnDef::new(AuditLogs::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_audit_logs_admin_id")
                            .from(AuditLogs::Table, AuditLogs::AdminId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_audit_logs_admin_id")
                    .table(AuditLogs::Table)
                    .col(AuditLogs::AdminId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuditLogs::Table).to_owned())
            .await
    }
}
