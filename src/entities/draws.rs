use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 抽奖活动实体
/// 状态是派生的, 不落库:
/// - open: draw_date >= 今天 且尚无中奖记录
/// - expired: draw_date < 今天 (仅用于展示)
/// - closed: 已有中奖记录 (与日期无关)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "draws")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: String,
    pub draw_date: NaiveDate,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Model {
    /// 日期是否已过（不看中奖状态，展示用）
    pub fn is_expired(&self, as_of: NaiveDate) -> bool {
        self.draw_date < as_of
    }

    /// 是否可报名: 日期未过且尚无中奖者
    pub fn is_open(&self, as_of: NaiveDate, has_winner: bool) -> bool {
        !has_winner && !self.is_expired(as_of)
    }

    /// 是否算历史活动: 日期已过或已开奖（超集条件，不是单纯的日期截断）
    pub fn is_past(&self, as_of: NaiveDate, has_winner: bool) -> bool {
        has_winner || self.is_expired(as_of)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
