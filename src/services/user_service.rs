use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::{UpdateProfileRequest, UserResponse};
use crate::utils::{normalize_email, require_non_empty};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, Set, SqlErr,
};

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 个人资料
    pub async fn get_profile(&self, user_id: i64) -> AppResult<UserResponse> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        Ok(user.into())
    }

    /// 更新资料（用户名 / 邮箱 / 电话, 只改提供的字段）
    pub async fn update_profile(
        &self,
        user_id: i64,
        request: UpdateProfileRequest,
    ) -> AppResult<UserResponse> {
        if request.username.is_none() && request.email.is_none() && request.phone.is_none() {
            return Err(AppError::ValidationError("No fields to update".to_string()));
        }

        let mut model = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?
            .into_active_model();

        if let Some(username) = &request.username {
            require_non_empty(username, "username")?;
            model.username = Set(username.trim().to_string());
        }
        if let Some(email) = &request.email {
            model.email = Set(normalize_email(email)?);
        }
        if let Some(phone) = &request.phone {
            model.phone = Set(Some(phone.clone()));
        }
        model.updated_at = Set(Some(Utc::now()));

        let updated = model.update(&self.pool).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(updated.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_user, setup_db};

    #[tokio::test]
    async fn test_get_and_update_profile() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let service = UserService::new(db.clone());

        let profile = service.get_profile(user.id).await.unwrap();
        assert_eq!(profile.username, "ana");

        let updated = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    username: Some("ana2".to_string()),
                    email: Some("Ana2@Example.com".to_string()),
                    phone: Some("+15550000000".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "ana2");
        assert_eq!(updated.email, "ana2@example.com");
        assert_eq!(updated.phone.as_deref(), Some("+15550000000"));
    }

    #[tokio::test]
    async fn test_update_profile_requires_some_field() {
        let db = setup_db().await;
        let user = create_user(&db, "ana").await;
        let service = UserService::new(db.clone());

        let err = service
            .update_profile(
                user.id,
                UpdateProfileRequest {
                    username: None,
                    email: None,
                    phone: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = service.get_profile(9999).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
