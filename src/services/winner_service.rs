use crate::entities::{
    draw_entity as draws, participant_entity as participants, user_entity as users,
    winner_entity as winners,
};
use crate::error::{AppError, AppResult};
use crate::models::{WinnerRecordResponse, WinnerResponse, WinnerSelectionResponse};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct WinnerService {
    pool: DatabaseConnection,
    rng: Arc<Mutex<StdRng>>,
}

impl WinnerService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self::with_rng(pool, StdRng::from_entropy())
    }

    /// 注入随机源; 固定种子时给定参与者顺序下结果可复现（测试用）。
    /// 通用 PRNG 即可, 不要求密码学强度。
    pub fn with_rng(pool: DatabaseConnection, rng: StdRng) -> Self {
        Self {
            pool,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// 开奖
    ///
    /// 前置检查按序短路, 各自对应独立的错误:
    /// 1. 活动存在, 否则 NotFound
    /// 2. 尚未开奖, 否则 AlreadyDecided
    /// 3. 有参与者, 否则 NoParticipants
    ///
    /// 之后在当前参与者中等概率抽取一名并写入结果。检查与插入在同一事务内,
    /// winners.draw_id 的唯一约束兜底并发: 两个请求同时通过检查 2 时,
    /// 后提交的一方收到唯一键冲突, 同样映射为 AlreadyDecided 且零写入。
    /// 任何失败路径都不产生写入。
    pub async fn select_winner(&self, draw_id: i64) -> AppResult<WinnerSelectionResponse> {
        let txn = self.pool.begin().await?;

        let draw = draws::Entity::find_by_id(draw_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Draw not found".to_string()))?;

        let existing = winners::Entity::find()
            .filter(winners::Column::DrawId.eq(draw_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::AlreadyDecided);
        }

        let participant_list = participants::Entity::find()
            .filter(participants::Column::DrawId.eq(draw_id))
            .order_by_asc(participants::Column::Id)
            .all(&txn)
            .await?;
        if participant_list.is_empty() {
            return Err(AppError::NoParticipants);
        }

        // 每名参与者 1/n 等概率, 单次抽样
        let index = {
            let mut rng = self.rng.lock().expect("rng lock poisoned");
            rng.gen_range(0..participant_list.len())
        };
        let chosen = &participant_list[index];

        let winner = winners::ActiveModel {
            draw_id: Set(draw_id),
            user_id: Set(chosen.user_id),
            selected_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyDecided,
            _ => AppError::from(e),
        })?;

        // 冗余带回展示/通知字段, 调用方不用再查
        let user = users::Entity::find_by_id(chosen.user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        txn.commit().await?;

        log::info!(
            "Winner selected for draw {draw_id}: user {} out of {} participants",
            user.id,
            participant_list.len()
        );

        Ok(WinnerSelectionResponse {
            winner_id: winner.id,
            draw_id,
            user_id: user.id,
            username: user.username,
            email: user.email,
            draw_title: draw.title,
            draw_date: draw.draw_date,
            selected_at: winner.selected_at,
        })
    }

    /// 某活动的中奖信息（活动详情页）
    pub async fn winner_for_draw(&self, draw_id: i64) -> AppResult<Option<WinnerResponse>> {
        let row = winners::Entity::find()
            .filter(winners::Column::DrawId.eq(draw_id))
            .find_also_related(users::Entity)
            .one(&self.pool)
            .await?;
        Ok(row.map(|(w, u)| WinnerResponse::with_user(w, u)))
    }

    /// 全站中奖名单, 最近开奖在前
    pub async fn list_winners(&self) -> AppResult<Vec<WinnerRecordResponse>> {
        let rows = winners::Entity::find()
            .order_by_desc(winners::Column::SelectedAt)
            .all(&self.pool)
            .await?;

        let user_ids: Vec<i64> = rows.iter().map(|w| w.user_id).collect();
        let draw_ids: Vec<i64> = rows.iter().map(|w| w.draw_id).collect();

        let user_map: HashMap<i64, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(user_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let draw_map: HashMap<i64, draws::Model> = draws::Entity::find()
            .filter(draws::Column::Id.is_in(draw_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        Ok(rows
            .into_iter()
            .map(|w| {
                let user = user_map.get(&w.user_id);
                let draw = draw_map.get(&w.draw_id);
                WinnerRecordResponse {
                    id: w.id,
                    draw_id: w.draw_id,
                    draw_title: draw.map(|d| d.title.clone()).unwrap_or_default(),
                    draw_date: draw.map(|d| d.draw_date).unwrap_or_default(),
                    username: user.map(|u| u.username.clone()).unwrap_or_default(),
                    email: user.map(|u| u.email.clone()).unwrap_or_default(),
                    selected_at: w.selected_at,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ParticipantService;
    use crate::test_support::{create_draw, create_user, join_details, setup_db};
    use chrono::NaiveDate;

    async fn winner_rows(db: &DatabaseConnection, draw_id: i64) -> Vec<winners::Model> {
        winners::Entity::find()
            .filter(winners::Column::DrawId.eq(draw_id))
            .all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_select_winner_picks_a_participant() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let bob = create_user(&db, "bob").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let registry = ParticipantService::new(db.clone());
        registry
            .join_or_update(draw.id, ana.id, join_details("10"))
            .await
            .unwrap();
        registry
            .join_or_update(draw.id, bob.id, join_details("10"))
            .await
            .unwrap();

        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        let selection = service.select_winner(draw.id).await.unwrap();

        assert!(selection.user_id == ana.id || selection.user_id == bob.id);
        assert_eq!(selection.draw_title, "Raffle");
        assert!(!selection.username.is_empty());
        assert_eq!(winner_rows(&db, draw.id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_second_selection_is_rejected() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let bob = create_user(&db, "bob").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let registry = ParticipantService::new(db.clone());
        registry
            .join_or_update(draw.id, ana.id, join_details("10"))
            .await
            .unwrap();
        registry
            .join_or_update(draw.id, bob.id, join_details("10"))
            .await
            .unwrap();

        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        let first = service.select_winner(draw.id).await.unwrap();

        // 再次开奖: 数据不变, 返回 AlreadyDecided
        let err = service.select_winner(draw.id).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyDecided));

        let rows = winner_rows(&db, draw.id).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, first.user_id);
    }

    #[tokio::test]
    async fn test_select_winner_without_participants() {
        let db = setup_db().await;
        let draw = create_draw(&db, "Empty", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        let err = service.select_winner(draw.id).await.unwrap_err();

        assert!(matches!(err, AppError::NoParticipants));
        assert!(winner_rows(&db, draw.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_select_winner_unknown_draw() {
        let db = setup_db().await;
        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));

        let err = service.select_winner(9999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_selection_is_deterministic_with_fixed_seed() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let bob = create_user(&db, "bob").await;
        let eve = create_user(&db, "eve").await;
        let registry = ParticipantService::new(db.clone());

        let mut winners_seen = Vec::new();
        for title in ["A", "B"] {
            let draw =
                create_draw(&db, title, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;
            for user in [&ana, &bob, &eve] {
                registry
                    .join_or_update(draw.id, user.id, join_details("10"))
                    .await
                    .unwrap();
            }
            // 每轮用相同种子的新服务, 相同参与者顺序必须选出同一位置
            let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(42));
            winners_seen.push(service.select_winner(draw.id).await.unwrap().user_id);
        }

        assert_eq!(winners_seen[0], winners_seen[1]);
    }

    #[tokio::test]
    async fn test_selection_is_roughly_uniform() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let bob = create_user(&db, "bob").await;
        let eve = create_user(&db, "eve").await;
        let registry = ParticipantService::new(db.clone());
        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(7));

        let mut counts: HashMap<i64, usize> = HashMap::new();
        for i in 0..300 {
            let draw = create_draw(
                &db,
                &format!("Raffle {i}"),
                NaiveDate::from_ymd_opt(2027, 1, 1).unwrap(),
            )
            .await;
            for user in [&ana, &bob, &eve] {
                registry
                    .join_or_update(draw.id, user.id, join_details("10"))
                    .await
                    .unwrap();
            }
            let selection = service.select_winner(draw.id).await.unwrap();
            *counts.entry(selection.user_id).or_default() += 1;
        }

        // 期望每人 ~100 次; 宽松的统计界, 防偶发抖动
        for user in [&ana, &bob, &eve] {
            let n = counts.get(&user.id).copied().unwrap_or(0);
            assert!((50..=175).contains(&n), "user {} won {n} times", user.id);
        }
    }

    #[tokio::test]
    async fn test_list_winners_and_winner_for_draw() {
        let db = setup_db().await;
        let ana = create_user(&db, "ana").await;
        let draw = create_draw(&db, "Raffle", NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()).await;

        let registry = ParticipantService::new(db.clone());
        registry
            .join_or_update(draw.id, ana.id, join_details("10"))
            .await
            .unwrap();

        let service = WinnerService::with_rng(db.clone(), StdRng::seed_from_u64(1));
        assert!(service.winner_for_draw(draw.id).await.unwrap().is_none());

        service.select_winner(draw.id).await.unwrap();

        let winner = service.winner_for_draw(draw.id).await.unwrap().unwrap();
        assert_eq!(winner.username, "ana");

        let records = service.list_winners().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].draw_title, "Raffle");
        assert_eq!(records[0].username, "ana");
    }
}
