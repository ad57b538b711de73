use super::current_user;
use crate::models::*;
use crate::services::{DrawService, ParticipantService, UserService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/users/profile",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取个人资料成功", body = UserResponse),
        (status = 401, description = "未授权")
    )
)]
/// 当前用户的个人资料
pub async fn get_profile(
    service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let current = match current_user(&req) {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };
    match service.get_profile(current.id).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/users/profile",
    tag = "users",
    request_body = UpdateProfileRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = UserResponse),
        (status = 400, description = "参数校验失败"),
        (status = 401, description = "未授权")
    )
)]
/// 更新个人资料（用户名 / 邮箱 / 电话）
pub async fn update_profile(
    service: web::Data<UserService>,
    request: web::Json<UpdateProfileRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let current = match current_user(&req) {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };
    match service.update_profile(current.id, request.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/dashboard",
    tag = "users",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取个人面板成功", body = DashboardResponse),
        (status = 401, description = "未授权")
    )
)]
/// 个人面板: 已参加活动总数 + 当前可报名的活动（带是否已报名标记）
pub async fn dashboard(
    participant_service: web::Data<ParticipantService>,
    draw_service: web::Data<DrawService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let current = match current_user(&req) {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };

    let as_of = Utc::now().date_naive();
    let total_joined = match participant_service.total_joined(current.id).await {
        Ok(n) => n,
        Err(e) => return Ok(e.error_response()),
    };
    let draws = match draw_service.list_open(as_of, current.id).await {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };

    let data = DashboardResponse {
        total_joined,
        draws,
    };
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

/// 路由配置
pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(
                web::resource("/profile")
                    .route(web::get().to(get_profile))
                    .route(web::put().to(update_profile)),
            )
            .route("/dashboard", web::get().to(dashboard)),
    );
}
