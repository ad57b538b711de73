use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, UserRole};
use crate::utils::{JwtService, hash_password, normalize_email, require_non_empty, validate_password, verify_password};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// 注册
    /// 邮箱小写归一化后存储; 重复注册先查一次给出友好提示,
    /// 并发下由邮箱唯一索引兜底, 冲突映射为 Conflict
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        require_non_empty(&request.username, "username")?;
        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;

        let existing = users::Entity::find()
            .filter(users::Column::Email.eq(email.clone()))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Email already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&request.password)?;

        let user = users::ActiveModel {
            username: Set(request.username.trim().to_string()),
            email: Set(email),
            password_hash: Set(password_hash),
            role: Set(UserRole::User),
            phone: Set(request.phone),
            ..Default::default()
        }
        .insert(&self.pool)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email already registered".to_string())
            }
            _ => AppError::from(e),
        })?;

        log::info!("User registered: {} ({})", user.id, user.email);
        self.issue_tokens(user)
    }

    /// 登录; 不区分"邮箱不存在"与"密码错误"
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let email = request.email.trim().to_lowercase();

        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError(
                "Invalid email or password".to_string(),
            ));
        }

        self.issue_tokens(user)
    }

    /// 刷新令牌; 重新读库拿当前角色, 避免旧令牌固化过期的权限
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::AuthError("User no longer exists".to_string()))?;

        self.issue_tokens(user)
    }

    fn issue_tokens(&self, user: users::Model) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, user.role)?;
        let refresh_token = self.jwt_service.generate_refresh_token(user.id, user.role)?;
        let expires_in = self.jwt_service.get_access_token_expires_in();

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
            expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;

    fn jwt() -> JwtService {
        JwtService::new("test-secret", 3600, 7200)
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: "ana".to_string(),
            email: email.to_string(),
            password: "Password123".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let db = setup_db().await;
        let service = AuthService::new(db.clone(), jwt());

        let auth = service
            .register(register_request("Ana@Example.COM"))
            .await
            .unwrap();
        // 邮箱小写落库
        assert_eq!(auth.user.email, "ana@example.com");
        assert_eq!(auth.user.role, UserRole::User);
        assert!(!auth.access_token.is_empty());

        let auth = service
            .login(LoginRequest {
                email: "ANA@example.com".to_string(),
                password: "Password123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(auth.user.username, "ana");

        let err = service
            .login(LoginRequest {
                email: "ana@example.com".to_string(),
                password: "WrongPassword1".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AuthError(_)));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let db = setup_db().await;
        let service = AuthService::new(db.clone(), jwt());

        service
            .register(register_request("ana@example.com"))
            .await
            .unwrap();
        let err = service
            .register(register_request("ana@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_refresh_round_trip() {
        let db = setup_db().await;
        let service = AuthService::new(db.clone(), jwt());

        let auth = service
            .register(register_request("ana@example.com"))
            .await
            .unwrap();
        let refreshed = service.refresh(&auth.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, auth.user.id);

        // access token 不能当 refresh token 用
        assert!(service.refresh(&auth.access_token).await.is_err());
    }
}
