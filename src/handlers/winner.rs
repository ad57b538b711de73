use super::{current_user, require_admin};
use crate::external::MailerService;
use crate::models::*;
use crate::services::WinnerService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/draws/{id}/winner",
    tag = "winners",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "开奖成功", body = WinnerSelectionResponse),
        (status = 400, description = "没有参与者"),
        (status = 403, description = "需要管理员权限"),
        (status = 404, description = "活动不存在"),
        (status = 409, description = "该活动已开过奖")
    )
)]
/// 开奖（管理员）: 在当前参与者中等概率抽取一名并记录
/// 结果提交后异步发送中奖邮件; 邮件失败只记日志, 不影响开奖结果
pub async fn select_winner(
    winner_service: web::Data<WinnerService>,
    mailer: web::Data<MailerService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = require_admin(&req) {
        return Ok(e.error_response());
    }

    match winner_service.select_winner(path.into_inner()).await {
        Ok(selection) => {
            let mailer = mailer.get_ref().clone();
            let notify = selection.clone();
            tokio::spawn(async move {
                if let Err(e) = mailer
                    .send_winner_notification(
                        &notify.email,
                        &notify.username,
                        &notify.draw_title,
                        notify.draw_date,
                    )
                    .await
                {
                    log::error!(
                        "Failed to send winner notification for draw {}: {e:?}",
                        notify.draw_id
                    );
                }
            });
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": selection })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/winners",
    tag = "winners",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取中奖名单成功", body = [WinnerRecordResponse]),
        (status = 401, description = "未授权")
    )
)]
/// 全站中奖名单, 最近开奖在前
pub async fn list_winners(
    service: web::Data<WinnerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = current_user(&req) {
        return Ok(e.error_response());
    }
    match service.list_winners().await {
        Ok(list) => Ok(HttpResponse::Ok().json(json!({ "success": true, "data": list }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 路由配置
pub fn winner_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/winners").route("", web::get().to(list_winners)));
}
