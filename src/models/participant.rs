use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::{participant_entity, user_entity};

/// 报名/更新报名信息请求
/// name/email/phone/payment_method 必填非空; bank_name 仅银行转账类需要;
/// amount 原样保存为提交的字符串
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinDrawRequest {
    #[schema(example = "Ana")]
    pub name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "+15551234567")]
    pub phone: String,
    #[schema(example = "bank")]
    pub payment_method: String,
    #[schema(example = "First National")]
    pub bank_name: Option<String>,
    #[schema(example = "10")]
    pub amount: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ParticipantResponse {
    pub id: i64,
    pub user_id: i64,
    pub draw_id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub payment_method: String,
    pub bank_name: Option<String>,
    pub amount: Option<String>,
    pub joined_at: DateTime<Utc>,
    /// 报名账号的用户名（列表视图联表填充）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<participant_entity::Model> for ParticipantResponse {
    fn from(m: participant_entity::Model) -> Self {
        ParticipantResponse {
            id: m.id,
            user_id: m.user_id,
            draw_id: m.draw_id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            payment_method: m.payment_method,
            bank_name: m.bank_name,
            amount: m.amount,
            joined_at: m.joined_at,
            username: None,
        }
    }
}

impl ParticipantResponse {
    /// 联表视图: 附带报名账号信息
    pub fn with_user(m: participant_entity::Model, user: Option<user_entity::Model>) -> Self {
        let mut resp = ParticipantResponse::from(m);
        resp.username = user.map(|u| u.username);
        resp
    }
}
