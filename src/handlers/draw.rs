use super::{current_user, require_admin};
use crate::models::*;
use crate::services::{DrawService, ParticipantService, WinnerService};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use serde_json::json;

#[utoipa::path(
    get,
    path = "/draws",
    tag = "draws",
    responses(
        (status = 200, description = "获取活动列表成功", body = [DrawSummary])
    )
)]
/// 全部活动列表（公开首页）, 带报名人数/是否已开奖/是否过期
pub async fn list_draws(service: web::Data<DrawService>) -> Result<HttpResponse> {
    let as_of = Utc::now().date_naive();
    match service.list_all(as_of).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/past",
    tag = "draws",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取历史活动成功", body = [DrawSummary]),
        (status = 403, description = "需要管理员权限")
    )
)]
/// 历史活动（日期已过或已开奖）, 管理端视图
pub async fn past_draws(service: web::Data<DrawService>, req: HttpRequest) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    let as_of = Utc::now().date_naive();
    match service.list_past(as_of).await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{id}",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取活动详情成功", body = DrawDetailResponse),
        (status = 404, description = "活动不存在")
    )
)]
/// 活动详情: 活动 + 报名列表 + 中奖信息（参与者页 / 管理端报表数据）
pub async fn get_draw(
    draw_service: web::Data<DrawService>,
    participant_service: web::Data<ParticipantService>,
    winner_service: web::Data<WinnerService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = current_user(&req) {
        return Ok(e.error_response());
    }
    let draw_id = path.into_inner();

    let draw = match draw_service.get(draw_id).await {
        Ok(d) => d,
        Err(e) => return Ok(e.error_response()),
    };
    let participants = match participant_service.list_for_draw(draw_id).await {
        Ok(p) => p,
        Err(e) => return Ok(e.error_response()),
    };
    let winner = match winner_service.winner_for_draw(draw_id).await {
        Ok(w) => w,
        Err(e) => return Ok(e.error_response()),
    };

    let data = DrawDetailResponse {
        draw: draw.into(),
        participants,
        winner,
    };
    Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
}

#[utoipa::path(
    post,
    path = "/draws",
    tag = "draws",
    request_body = CreateDrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "创建成功", body = DrawResponse),
        (status = 400, description = "参数校验失败"),
        (status = 403, description = "需要管理员权限")
    )
)]
/// 创建活动（管理员）
pub async fn create_draw(
    service: web::Data<DrawService>,
    request: web::Json<CreateDrawRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.create(request.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/draws/{id}",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    request_body = UpdateDrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "更新成功", body = DrawResponse),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "活动不存在")
    )
)]
/// 编辑活动（管理员）
pub async fn update_draw(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
    request: web::Json<UpdateDrawRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.update(path.into_inner(), request.into_inner()).await {
        Ok(data) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/draws/{id}",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "删除成功"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "活动不存在")
    )
)]
/// 删除活动（管理员）; 级联删除报名与中奖记录, 整体一个事务
pub async fn delete_draw(
    service: web::Data<DrawService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }
    match service.delete(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok()
            .json(json!({ "success": true, "message": "Draw deleted" }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置（/draws 下的全部路由, 含报名与开奖）
pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/draws")
            .service(
                web::resource("")
                    .route(web::get().to(list_draws))
                    .route(web::post().to(create_draw)),
            )
            .route("/past", web::get().to(past_draws))
            .service(
                web::resource("/{id}")
                    .route(web::get().to(get_draw))
                    .route(web::put().to(update_draw))
                    .route(web::delete().to(delete_draw)),
            )
            .route(
                "/{id}/join",
                web::post().to(super::participant::join_draw),
            )
            .route(
                "/{id}/participation",
                web::get().to(super::participant::my_participation),
            )
            .route(
                "/{id}/winner",
                web::post().to(super::winner::select_winner),
            ),
    );
}
