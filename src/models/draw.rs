use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::draw_entity;
use crate::models::{ParticipantResponse, WinnerResponse};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateDrawRequest {
    #[schema(example = "New Year Raffle")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Grand prize draw for the new year")]
    pub description: String,
    /// YYYY-MM-DD
    #[schema(example = "2026-12-31")]
    pub draw_date: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateDrawRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// YYYY-MM-DD
    pub draw_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrawResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub draw_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl From<draw_entity::Model> for DrawResponse {
    fn from(m: draw_entity::Model) -> Self {
        DrawResponse {
            id: m.id,
            title: m.title,
            description: m.description,
            draw_date: m.draw_date,
            created_at: m.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// 列表条目: 活动 + 每次查询即时重算的聚合字段
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DrawSummary {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub draw_date: NaiveDate,
    /// 当前报名人数
    pub participants_count: i64,
    /// 是否已开奖
    pub winner_selected: bool,
    /// 日期是否已过（展示用，与开奖状态无关）
    pub expired: bool,
    /// 当前用户是否已报名（仅个人面板视图填充）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub already_joined: Option<bool>,
}

/// 活动详情: 参与者页 / 管理端报表共用的数据载荷
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DrawDetailResponse {
    pub draw: DrawResponse,
    pub participants: Vec<ParticipantResponse>,
    pub winner: Option<WinnerResponse>,
}

/// 个人面板: 已参加总数 + 可报名活动列表
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub total_joined: i64,
    pub draws: Vec<DrawSummary>,
}
