pub mod auth;
pub mod draw;
pub mod participant;
pub mod user;
pub mod winner;

pub use auth::auth_config;
pub use draw::draw_config;
pub use user::user_config;
pub use winner::winner_config;

use crate::error::AppError;
use crate::middlewares::CurrentUser;
use actix_web::{HttpMessage, HttpRequest};

/// 从请求扩展中取出鉴权身份（中间件注入）
pub(crate) fn current_user(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    req.extensions()
        .get::<CurrentUser>()
        .copied()
        .ok_or_else(|| AppError::AuthError("Missing access token".to_string()))
}

/// 管理端操作的边界检查, 先于任何核心服务调用执行;
/// 服务层收到的调用一律视为已授权
pub(crate) fn require_admin(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    let current = current_user(req)?;
    if !current.is_admin {
        return Err(AppError::PermissionDenied);
    }
    Ok(current)
}
