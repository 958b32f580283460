use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::groups::requests::UpdateGroupRequest;
use crate::services::{AttendanceService, GroupService};
use crate::utils::{SafeIDI64, SafeStudentIdI64};

static GROUP_SERVICE: Lazy<GroupService> = Lazy::new(GroupService::new_lazy);
static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn update_group(
    req: HttpRequest,
    group_id: SafeIDI64,
    data: web::Json<UpdateGroupRequest>,
) -> ActixResult<HttpResponse> {
    GROUP_SERVICE
        .update_group(&req, group_id.0, data.into_inner())
        .await
}

pub async fn delete_group(req: HttpRequest, group_id: SafeIDI64) -> ActixResult<HttpResponse> {
    GROUP_SERVICE.delete_group(&req, group_id.0).await
}

pub async fn group_roster(req: HttpRequest, group_id: SafeIDI64) -> ActixResult<HttpResponse> {
    GROUP_SERVICE.group_roster(&req, group_id.0).await
}

pub async fn import_group_students(
    req: HttpRequest,
    group_id: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    GROUP_SERVICE
        .import_group_students(&req, group_id.0, payload)
        .await
}

pub async fn add_member(
    req: HttpRequest,
    group_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    GROUP_SERVICE.add_member(&req, group_id.0, student_id.0).await
}

pub async fn remove_member(
    req: HttpRequest,
    group_id: SafeIDI64,
    student_id: SafeStudentIdI64,
) -> ActixResult<HttpResponse> {
    GROUP_SERVICE
        .remove_member(&req, group_id.0, student_id.0)
        .await
}

pub async fn roster_attendance(
    req: HttpRequest,
    group_id: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .roster_attendance(&req, group_id.0, payload)
        .await
}

// 配置路由
pub fn configure_group_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/groups")
            .wrap(middlewares::RequireJWT)
            .route("/{id}", web::put().to(update_group))
            .route("/{id}", web::delete().to(delete_group))
            .route("/{id}/students", web::get().to(group_roster))
            // 须在 /{student_id} 之前注册
            .route("/{id}/students/import", web::post().to(import_group_students))
            .route("/{id}/students/{student_id}", web::post().to(add_member))
            .route("/{id}/students/{student_id}", web::delete().to(remove_member))
            .route("/{id}/attendance", web::post().to(roster_attendance)),
    );
}
