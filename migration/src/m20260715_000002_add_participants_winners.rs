use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Draws {
    Table,
    Id,
}

/// Participants (参与记录)
#[derive(DeriveIden)]
enum Participants {
    Table,
    Id,
    UserId,
    DrawId,
    Name,
    Email,
    Phone,
    PaymentMethod,
    BankName,
    Amount,
    JoinedAt,
}

/// Winners (开奖结果)
#[derive(DeriveIden)]
enum Winners {
    Table,
    Id,
    DrawId,
    UserId,
    SelectedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 两个唯一索引承载核心不变量:
/// - participants (draw_id, user_id) 唯一: 同一用户对同一活动只有一条报名记录,
///   重复报名走 upsert 更新
/// - winners draw_id 唯一: 每个活动至多一名中奖者, 并发开奖由该约束裁决
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 参与记录表
        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Participants::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::DrawId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Email)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::Phone)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::PaymentMethod)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Participants::BankName)
                            .string_len(255)
                            .null(),
                    )
                    .col(ColumnDef::new(Participants::Amount).string_len(64).null())
                    .col(
                        ColumnDef::new(Participants::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_user")
                            .from(Participants::Table, Participants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_participants_draw")
                            .from(Participants::Table, Participants::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // (draw_id, user_id) 唯一 -> upsert 的冲突目标
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_draw_user_unique")
                    .table(Participants::Table)
                    .col(Participants::DrawId)
                    .col(Participants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_participants_user")
                    .table(Participants::Table)
                    .col(Participants::UserId)
                    .to_owned(),
            )
            .await?;

        // 开奖结果表
        manager
            .create_table(
                Table::create()
                    .table(Winners::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Winners::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Winners::DrawId).big_integer().not_null())
                    .col(ColumnDef::new(Winners::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Winners::SelectedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_draw")
                            .from(Winners::Table, Winners::DrawId)
                            .to(Draws::Table, Draws::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_winners_user")
                            .from(Winners::Table, Winners::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // draw_id 唯一 -> 至多一名中奖者
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_winners_draw_unique")
                    .table(Winners::Table)
                    .col(Winners::DrawId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 删除顺序：结果 -> 参与记录
        manager
            .drop_table(Table::drop().if_exists().table(Winners::Table).to_owned())
            .await?;

        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(Participants::Table)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}
