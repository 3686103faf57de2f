use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum OtpRecords {
    Table,
    Id,
    Phone,
    CodeHash,
    Attempts,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OtpRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OtpRecords::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OtpRecords::Phone).string_len(10).not_null())
                    .col(ColumnDef::new(OtpRecords::CodeHash).string().not_null())
                    .col(
                        ColumnDef::new(OtpRecords::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OtpRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // 按手机号查最新一条
        manager
            .create_index(
                Index::create()
                    .name("idx_otp_records_phone_created_at")
                    .table(OtpRecords::Table)
                    .col(OtpRecords::Phone)
                    .col((OtpRecords::CreatedAt, IndexOrder::Desc))
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // 过期清理任务按 created_at 扫描
        manager
            .create_index(
                Index::create()
                    .name("idx_otp_records_created_at")
                    .table(OtpRecords::Table)
                    .col(OtpRecords::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpRecords::Table).if_exists().to_owned())
            .await
    }
}
