use crate::entities::{
    draw_entity as draws, participant_entity as participants, winner_entity as winners,
};
use crate::error::{AppError, AppResult};
use crate::models::{CreateDrawRequest, DrawResponse, DrawSummary, UpdateDrawRequest};
use crate::utils::{parse_draw_date, require_non_empty};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
pub struct DrawService {
    pool: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct DrawIdRow {
    draw_id: i64,
}

#[derive(Debug, FromQueryResult)]
struct ParticipantCountRow {
    draw_id: i64,
    count: i64,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 创建活动。标题必填; 日期不限制在未来, 管理员可以补录历史活动
    pub async fn create(&self, request: CreateDrawRequest) -> AppResult<DrawResponse> {
        require_non_empty(&request.title, "title")?;
        let draw_date = parse_draw_date(&request.draw_date)?;

        let model = draws::ActiveModel {
            title: Set(request.title.trim().to_string()),
            description: Set(request.description),
            draw_date: Set(draw_date),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Draw created: {} ({})", model.id, model.title);
        Ok(model.into())
    }

    /// 编辑活动
    pub async fn update(&self, id: i64, request: UpdateDrawRequest) -> AppResult<DrawResponse> {
        require_non_empty(&request.title, "title")?;
        let draw_date = parse_draw_date(&request.draw_date)?;

        let mut model = draws::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Draw not found".to_string()))?
            .into_active_model();
        model.title = Set(request.title.trim().to_string());
        model.description = Set(request.description);
        model.draw_date = Set(draw_date);
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&self.pool).await?;
        Ok(updated.into())
    }

    /// 删除活动: 参与记录 -> 中奖记录 -> 活动本体
    /// 顺序对应外键归属, 三步在同一事务内, 要么全删要么全留
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        if draws::Entity::find_by_id(id).one(&txn).await?.is_none() {
            return Err(AppError::NotFound("Draw not found".to_string()));
        }

        participants::Entity::delete_many()
            .filter(participants::Column::DrawId.eq(id))
            .exec(&txn)
            .await?;
        winners::Entity::delete_many()
            .filter(winners::Column::DrawId.eq(id))
            .exec(&txn)
            .await?;
        draws::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        log::info!("Draw deleted: {id}");
        Ok(())
    }

    /// 按 id 取活动
    pub async fn get(&self, id: i64) -> AppResult<draws::Model> {
        draws::Entity::find_by_id(id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Draw not found".to_string()))
    }

    /// 全部活动, 日期倒序（公共首页 / 管理端列表）
    pub async fn list_all(&self, as_of: NaiveDate) -> AppResult<Vec<DrawSummary>> {
        let rows = draws::Entity::find()
            .order_by_desc(draws::Column::DrawDate)
            .all(&self.pool)
            .await?;
        let winner_ids = self.winner_draw_ids().await?;
        self.summarize(rows, as_of, &winner_ids, None).await
    }

    /// 可报名活动: 日期未过且未开奖, 最近的排前; 附带当前用户是否已报名
    pub async fn list_open(&self, as_of: NaiveDate, user_id: i64) -> AppResult<Vec<DrawSummary>> {
        let rows = draws::Entity::find()
            .filter(draws::Column::DrawDate.gte(as_of))
            .order_by_asc(draws::Column::DrawDate)
            .all(&self.pool)
            .await?;
        let winner_ids = self.winner_draw_ids().await?;
        let rows: Vec<draws::Model> = rows
            .into_iter()
            .filter(|d| d.is_open(as_of, winner_ids.contains(&d.id)))
            .collect();
        self.summarize(rows, as_of, &winner_ids, Some(user_id))
            .await
    }

    /// 历史活动: 日期已过或已开奖, 日期倒序
    /// "历史"是超集条件: 未来日期但已开奖的活动也算
    pub async fn list_past(&self, as_of: NaiveDate) -> AppResult<Vec<DrawSummary>> {
        let rows = draws::Entity::find()
            .order_by_desc(draws::Column::DrawDate)
            .all(&self.pool)
            .await?;
        let winner_ids = self.winner_draw_ids().await?;
        let rows: Vec<draws::Model> = rows
            .into_iter()
            .filter(|d| d.is_past(as_of, winner_ids.contains(&d.id)))
            .collect();
        self.summarize(rows, as_of, &winner_ids, None).await
    }

    // -----------------------------
    // 内部辅助方法
    // -----------------------------

    /// 活动行 -> 列表条目; 聚合字段每次查询即时重算, 无缓存计数需要维护
    async fn summarize(
        &self,
        rows: Vec<draws::Model>,
        as_of: NaiveDate,
        winner_ids: &HashSet<i64>,
        for_user: Option<i64>,
    ) -> AppResult<Vec<DrawSummary>> {
        let counts = self.participant_counts().await?;
        let joined = match for_user {
            Some(user_id) => Some(self.joined_draw_ids(user_id).await?),
            None => None,
        };

        Ok(rows
            .into_iter()
            .map(|d| DrawSummary {
                participants_count: counts.get(&d.id).copied().unwrap_or(0),
                winner_selected: winner_ids.contains(&d.id),
                expired: d.is_expired(as_of),
                already_joined: joined.as_ref().map(|set| set.contains(&d.id)),
                id: d.id,
                title: d.title,
                description: d.description,
                draw_date: d.draw_date,
            })
            .collect())
    }

    async fn winner_draw_ids(&self) -> AppResult<HashSet<i64>> {
        let rows = winners::Entity::find()
            .select_only()
            .column(winners::Column::DrawId)
            .into_model::<DrawIdRow>()
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.draw_id).collect())
    }

    async fn participant_counts(&self) -> AppResult<HashMap<i64, i64>> {
        let rows = participants::Entity::find()
            .select_only()
            .column(participants::Column::DrawId)
            .column_as(Expr::val(1).count(), "count")
            .group_by(participants::Column::DrawId)
            .into_model::<ParticipantCountRow>()
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| (r.draw_id, r.count)).collect())
    }

    async fn joined_draw_ids(&self, user_id: i64) -> AppResult<HashSet<i64>> {
        let rows = participants::Entity::find()
            .filter(participants::Column::UserId.eq(user_id))
            .select_only()
            .column(participants::Column::DrawId)
            .into_model::<DrawIdRow>()
            .all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.draw_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ParticipantService, WinnerService};
    use crate::test_support::{create_draw, create_user, join_details, setup_db};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_request(title: &str, draw_date: &str) -> CreateDrawRequest {
        CreateDrawRequest {
            title: title.to_string(),
            description: "desc".to_string(),
            draw_date: draw_date.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_update() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());

        let draw = service
            .create(create_request("New Year", "2027-01-01"))
            .await
            .unwrap();
        assert_eq!(draw.title, "New Year");
        assert_eq!(draw.draw_date, date(2027, 1, 1));

        let updated = service
            .update(
                draw.id,
                UpdateDrawRequest {
                    title: "New Year Gala".to_string(),
                    description: "updated".to_string(),
                    draw_date: "2027-02-01".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "New Year Gala");
        assert_eq!(updated.draw_date, date(2027, 2, 1));
    }

    #[tokio::test]
    async fn test_create_validation() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());

        let err = service
            .create(create_request("  ", "2027-01-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service
            .create(create_request("Raffle", "01/01/2027"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // 过去的日期允许（补录历史活动）
        assert!(service.create(create_request("Old", "2020-01-01")).await.is_ok());

        let err = service
            .update(9999, UpdateDrawRequest {
                title: "X".to_string(),
                description: String::new(),
                draw_date: "2027-01-01".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_participants_and_winner() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());
        let registry = ParticipantService::new(db.clone());
        let selector = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));

        let draw = create_draw(&db, "Doomed", date(2027, 1, 1)).await;
        let other = create_draw(&db, "Kept", date(2027, 1, 2)).await;

        for name in ["u1", "u2", "u3", "u4", "u5"] {
            let user = create_user(&db, name).await;
            registry
                .join_or_update(draw.id, user.id, join_details("10"))
                .await
                .unwrap();
            registry
                .join_or_update(other.id, user.id, join_details("10"))
                .await
                .unwrap();
        }
        selector.select_winner(draw.id).await.unwrap();

        service.delete(draw.id).await.unwrap();

        // 该活动的参与记录/中奖记录/本体全部消失
        assert!(draws::Entity::find_by_id(draw.id).one(&db).await.unwrap().is_none());
        let p = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw.id))
            .all(&db)
            .await
            .unwrap();
        assert!(p.is_empty());
        let w = winners::Entity::find()
            .filter(winners::Column::DrawId.eq(draw.id))
            .all(&db)
            .await
            .unwrap();
        assert!(w.is_empty());

        // 其它活动不受影响
        let p = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(other.id))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(p.len(), 5);

        let err = service.delete(draw.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_open_filters_and_orders() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());
        let registry = ParticipantService::new(db.clone());
        let selector = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        let user = create_user(&db, "ana").await;
        let as_of = date(2026, 8, 6);

        let past = create_draw(&db, "Past", date(2026, 8, 1)).await;
        let soon = create_draw(&db, "Soon", date(2026, 8, 10)).await;
        let later = create_draw(&db, "Later", date(2026, 9, 1)).await;
        let decided = create_draw(&db, "Decided", date(2026, 12, 1)).await;

        registry
            .join_or_update(soon.id, user.id, join_details("10"))
            .await
            .unwrap();
        registry
            .join_or_update(decided.id, user.id, join_details("10"))
            .await
            .unwrap();
        selector.select_winner(decided.id).await.unwrap();

        let open = service.list_open(as_of, user.id).await.unwrap();
        let ids: Vec<i64> = open.iter().map(|d| d.id).collect();
        // 日期已过与已开奖的都不在, 按日期升序
        assert_eq!(ids, vec![soon.id, later.id]);
        assert_eq!(open[0].already_joined, Some(true));
        assert_eq!(open[1].already_joined, Some(false));
        assert_eq!(open[0].participants_count, 1);
        assert!(!open[0].winner_selected);

        let _ = past;
    }

    #[tokio::test]
    async fn test_list_past_is_superset_condition() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());
        let registry = ParticipantService::new(db.clone());
        let selector = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        let user = create_user(&db, "ana").await;
        let as_of = date(2026, 8, 6);

        let past = create_draw(&db, "Past", date(2026, 8, 1)).await;
        let open = create_draw(&db, "Open", date(2026, 9, 1)).await;
        // 未来日期但已开奖 -> 也算历史
        let decided = create_draw(&db, "Decided", date(2026, 12, 1)).await;
        registry
            .join_or_update(decided.id, user.id, join_details("10"))
            .await
            .unwrap();
        selector.select_winner(decided.id).await.unwrap();

        let past_list = service.list_past(as_of).await.unwrap();
        let ids: Vec<i64> = past_list.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![decided.id, past.id]);
        assert!(past_list[0].winner_selected);
        assert!(!past_list[0].expired);
        assert!(past_list[1].expired);

        let _ = open;
    }

    #[tokio::test]
    async fn test_list_all_includes_everything() {
        let db = setup_db().await;
        let service = DrawService::new(db.clone());
        let as_of = date(2026, 8, 6);

        let a = create_draw(&db, "A", date(2026, 8, 1)).await;
        let b = create_draw(&db, "B", date(2026, 9, 1)).await;

        let all = service.list_all(as_of).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);
        // 非个人视图不带 already_joined
        assert!(all[0].already_joined.is_none());
    }
}
