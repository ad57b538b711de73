use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{user_entity, winner_entity};

/// 某个活动的中奖信息（活动详情页）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WinnerResponse {
    pub id: i64,
    pub draw_id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub selected_at: DateTime<Utc>,
}

impl WinnerResponse {
    pub fn with_user(m: winner_entity::Model, user: Option<user_entity::Model>) -> Self {
        let (username, email) = match user {
            Some(u) => (u.username, u.email),
            None => (String::new(), String::new()),
        };
        WinnerResponse {
            id: m.id,
            draw_id: m.draw_id,
            user_id: m.user_id,
            username,
            email,
            selected_at: m.selected_at,
        }
    }
}

/// 开奖结果: 附带展示/通知所需的冗余字段, 调用方无需再查询
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WinnerSelectionResponse {
    pub winner_id: i64,
    pub draw_id: i64,
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub draw_title: String,
    pub draw_date: NaiveDate,
    pub selected_at: DateTime<Utc>,
}

/// 中奖名单条目（全站中奖记录页）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WinnerRecordResponse {
    pub id: i64,
    pub draw_id: i64,
    pub draw_title: String,
    pub draw_date: NaiveDate,
    pub username: String,
    pub email: String,
    pub selected_at: DateTime<Utc>,
}
