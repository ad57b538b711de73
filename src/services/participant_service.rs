use crate::entities::{
    draw_entity as draws, participant_entity as participants, user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::{JoinDrawRequest, ParticipantResponse};
use crate::utils::{normalize_email, require_non_empty};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

#[derive(Clone)]
pub struct ParticipantService {
    pool: DatabaseConnection,
}

impl ParticipantService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 报名或更新报名信息
    ///
    /// (draw_id, user_id) 唯一键上的单条 upsert 语句, 插入与更新二选一,
    /// 不存在先查后写的竞态; joined_at 由服务端写入, 每次重新报名刷新,
    /// 客户端不能自带时间。返回写入后的记录, 调用方无需再读一次。
    ///
    /// 活动日期已过或已开奖时是否允许报名是调用方的策略, 这里不拦截。
    pub async fn join_or_update(
        &self,
        draw_id: i64,
        user_id: i64,
        details: JoinDrawRequest,
    ) -> AppResult<ParticipantResponse> {
        require_non_empty(&details.name, "name")?;
        require_non_empty(&details.phone, "phone")?;
        require_non_empty(&details.payment_method, "payment_method")?;
        let email = normalize_email(&details.email)?;

        // 先做存在性检查, 给出明确的 NotFound 而不是底层外键错误
        if draws::Entity::find_by_id(draw_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Draw not found".to_string()));
        }
        if users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        let participant = participants::ActiveModel {
            user_id: Set(user_id),
            draw_id: Set(draw_id),
            name: Set(details.name.trim().to_string()),
            email: Set(email),
            phone: Set(details.phone.trim().to_string()),
            payment_method: Set(details.payment_method.trim().to_string()),
            bank_name: Set(details.bank_name),
            amount: Set(details.amount),
            joined_at: Set(Utc::now()),
            ..Default::default()
        };

        let model = participants::Entity::insert(participant)
            .on_conflict(
                OnConflict::columns([participants::Column::DrawId, participants::Column::UserId])
                    .update_columns([
                        participants::Column::Name,
                        participants::Column::Email,
                        participants::Column::Phone,
                        participants::Column::PaymentMethod,
                        participants::Column::BankName,
                        participants::Column::Amount,
                        participants::Column::JoinedAt,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.pool)
            .await?;

        Ok(model.into())
    }

    /// 某用户在某活动的报名记录（报名页回显 / 开奖资格检查共用）
    pub async fn current_participant(
        &self,
        draw_id: i64,
        user_id: i64,
    ) -> AppResult<Option<participants::Model>> {
        let model = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .filter(participants::Column::UserId.eq(user_id))
            .one(&self.pool)
            .await?;
        Ok(model)
    }

    /// 某活动的全部报名记录, 联表带出账号用户名, 最近报名在前
    pub async fn list_for_draw(&self, draw_id: i64) -> AppResult<Vec<ParticipantResponse>> {
        if draws::Entity::find_by_id(draw_id)
            .one(&self.pool)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Draw not found".to_string()));
        }

        let rows = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .find_also_related(users::Entity)
            .order_by_desc(participants::Column::JoinedAt)
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(p, u)| ParticipantResponse::with_user(p, u))
            .collect())
    }

    /// 某用户参加过的活动总数（个人面板）
    pub async fn total_joined(&self, user_id: i64) -> AppResult<i64> {
        let total = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id))
            .count(&self.pool)
            .await? as i64;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_draw, create_user, join_details, setup_db};
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_join_creates_participant() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());
        let mut details = join_details("10");
        details.email = "Ana@Example.COM".to_string();

        let participant = service
            .join_or_update(draw.id, user.id, details)
            .await
            .unwrap();

        assert_eq!(participant.draw_id, draw.id);
        assert_eq!(participant.user_id, user.id);
        assert_eq!(participant.email, "ana@example.com");
        assert_eq!(participant.amount.as_deref(), Some("10"));
    }

    #[tokio::test]
    async fn test_rejoin_updates_in_place() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());
        let first = service
            .join_or_update(draw.id, user.id, join_details("10"))
            .await
            .unwrap();
        let second = service
            .join_or_update(draw.id, user.id, join_details("20"))
            .await
            .unwrap();

        // 同一 (draw, user) 只有一行, 字段整体更新, joined_at 刷新
        let rows = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount.as_deref(), Some("20"));
        assert_eq!(second.id, first.id);
        assert!(second.joined_at >= first.joined_at);
    }

    #[tokio::test]
    async fn test_join_requires_fields() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());

        let mut details = join_details("10");
        details.name = "  ".to_string();
        let err = service
            .join_or_update(draw.id, user.id, details)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let mut details = join_details("10");
        details.email = "not-an-email".to_string();
        let err = service
            .join_or_update(draw.id, user.id, details)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // 校验失败不应落库
        let rows = participants::Entity::find().all(&db).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_draw_or_user() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());

        let err = service
            .join_or_update(9999, user.id, join_details("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .join_or_update(draw.id, 9999, join_details("10"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_current_participant() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());
        assert!(
            service
                .current_participant(draw.id, user.id)
                .await
                .unwrap()
                .is_none()
        );

        service
            .join_or_update(draw.id, user.id, join_details("10"))
            .await
            .unwrap();

        let current = service
            .current_participant(draw.id, user.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.user_id, user.id);
    }

    #[tokio::test]
    async fn test_list_for_draw_includes_usernames() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let bob = create_user(&db, "bob").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = ParticipantService::new(db.clone());
        service
            .join_or_update(draw.id, ana.id, join_details("10"))
            .await
            .unwrap();
        service
            .join_or_update(draw.id, bob.id, join_details("15"))
            .await
            .unwrap();

        let list = service.list_for_draw(draw.id).await.unwrap();
        assert_eq!(list.len(), 2);
        let mut names: Vec<_> = list.iter().filter_map(|p| p.username.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["ana", "bob"]);

        assert_eq!(service.total_joined(ana.id).await.unwrap(), 1);
    }
}
