//! 服务层测试公用脚手架: 内存 SQLite + 真实迁移, 每个测试独立一库。

use crate::entities::{draw_entity as draws, user_entity as users};
use crate::models::{JoinDrawRequest, UserRole};
use chrono::NaiveDate;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

pub async fn setup_db() -> DatabaseConnection {
    // 单连接: 内存库跟着连接走, 多连接会各自拿到一个空库
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options.max_connections(1);

    let db = Database::connect(options)
        .await
        .expect("connect in-memory sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

pub async fn create_user(db: &DatabaseConnection, username: &str) -> users::Model {
    users::ActiveModel {
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(UserRole::User),
        phone: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert user")
}

pub async fn create_draw(
    db: &DatabaseConnection,
    title: &str,
    draw_date: NaiveDate,
) -> draws::Model {
    draws::ActiveModel {
        title: Set(title.to_string()),
        description: Set(String::new()),
        draw_date: Set(draw_date),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("insert draw")
}

pub fn join_details(amount: &str) -> JoinDrawRequest {
    JoinDrawRequest {
        name: "Ana".to_string(),
        email: "ana@example.com".to_string(),
        phone: "+15551234567".to_string(),
        payment_method: "bank".to_string(),
        bank_name: Some("First National".to_string()),
        amount: Some(amount.to_string()),
    }
}
