use super::current_user;
use crate::models::*;
use crate::services::ParticipantService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/draws/{id}/join",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    request_body = JoinDrawRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "报名成功", body = ParticipantResponse),
        (status = 400, description = "参数校验失败"),
        (status = 404, description = "活动不存在")
    )
)]
/// 报名参加活动; 已报名时整行更新报名信息并刷新报名时间
pub async fn join_draw(
    service: web::Data<ParticipantService>,
    path: web::Path<i64>,
    request: web::Json<JoinDrawRequest>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let current = match current_user(&req) {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .join_or_update(path.into_inner(), current.id, request.into_inner())
        .await
    {
        Ok(data) => Ok(HttpResponse::Ok().json(
            json!({ "success": true, "data": data, "message": "Joined successfully" }),
        )),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/draws/{id}/participation",
    tag = "draws",
    params(
        ("id" = i64, Path, description = "活动ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "当前用户在该活动的报名记录（未报名为 null）", body = ParticipantResponse),
        (status = 401, description = "未授权")
    )
)]
/// 报名页回显: 当前用户在该活动的报名记录
pub async fn my_participation(
    service: web::Data<ParticipantService>,
    path: web::Path<i64>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let current = match current_user(&req) {
        Ok(c) => c,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .current_participant(path.into_inner(), current.id)
        .await
    {
        Ok(participant) => {
            let data = participant.map(ParticipantResponse::from);
            Ok(HttpResponse::Ok().json(json!({ "success": true, "data": data })))
        }
        Err(e) => Ok(e.error_response()),
    }
}
