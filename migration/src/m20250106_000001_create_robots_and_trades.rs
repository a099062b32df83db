use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Robots::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Robots::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Robots::OwnerId).string().not_null())
                    .col(ColumnDef::new(Robots::Name).string().not_null())
                    .col(ColumnDef::new(Robots::AccountId).string().not_null())
                    .col(ColumnDef::new(Robots::BrokerHandle).string().not_null())
                    .col(ColumnDef::new(Robots::Enabled).boolean().not_null().default(false))
                    .col(ColumnDef::new(Robots::Config).json().not_null())
                    .col(ColumnDef::new(Robots::CreatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP")))
                    .col(ColumnDef::new(Robots::UpdatedAt).timestamp().default(Expr::cust("CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP")))
                    .index(
                        Index::create()
                            .name("idx_robots_enabled")
                            .table(Robots::Table)
                            .col(Robots::Enabled),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Trades::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Trades::Id).big_unsigned().auto_increment().primary_key())
                    .col(ColumnDef::new(Trades::RobotId).big_unsigned().not_null())
                    .col(ColumnDef::new(Trades::AccountId).string().not_null())
                    .col(ColumnDef::new(Trades::PositionId).string().not_null())
                    .col(ColumnDef::new(Trades::Symbol).string().not_null())
                    .col(ColumnDef::new(Trades::Direction).string_len(4).not_null())
                    .col(ColumnDef::new(Trades::Volume).double().not_null())
                    .col(ColumnDef::new(Trades::EntryPrice).double().not_null())
                    .col(ColumnDef::new(Trades::StopLoss).double().not_null())
                    .col(ColumnDef::new(Trades::TakeProfit).double().not_null())
                    .col(ColumnDef::new(Trades::Strategy).string().not_null())
                    .col(ColumnDef::new(Trades::Agreeing).json().not_null())
                    .col(ColumnDef::new(Trades::Confidence).double().not_null())
                    .col(ColumnDef::new(Trades::LotMultiplier).double().not_null())
                    .col(ColumnDef::new(Trades::Rationale).text().not_null())
                    .col(ColumnDef::new(Trades::Status).string().not_null().default("open"))
                    .col(ColumnDef::new(Trades::OpenedAt).timestamp().not_null())
                    .col(ColumnDef::new(Trades::ClosedAt).timestamp().null())
                    .index(
                        Index::create()
                            .name("idx_trades_account_position")
                            .table(Trades::Table)
                            .col(Trades::AccountId)
                            .col(Trades::PositionId),
                    )
                    .index(
                        Index::create()
                            .name("idx_trades_robot_status")
                            .table(Trades::Table)
                            .col(Trades::RobotId)
                            .col(Trades::Status),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trades_robot")
                            .from(Trades::Table, Trades::RobotId)
                            .to(Robots::Table, Robots::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trades::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Robots::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Robots {
    Table,
    Id,
    OwnerId,
    Name,
    AccountId,
    BrokerHandle,
    Enabled,
    Config,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Trades {
    Table,
    Id,
    RobotId,
    AccountId,
    PositionId,
    Symbol,
    Direction,
    Volume,
    EntryPrice,
    StopLoss,
    TakeProfit,
    Strategy,
    Agreeing,
    Confidence,
    LotMultiplier,
    Rationale,
    Status,
    OpenedAt,
    ClosedAt,
}
