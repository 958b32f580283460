use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::FaceAttendanceRequest;
use crate::services::AttendanceService;

static ATTENDANCE_SERVICE: Lazy<AttendanceService> = Lazy::new(AttendanceService::new_lazy);

pub async fn face_attendance(
    req: HttpRequest,
    data: web::Json<FaceAttendanceRequest>,
) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE
        .face_attendance(&req, data.into_inner())
        .await
}

pub async fn sync_faces(req: HttpRequest) -> ActixResult<HttpResponse> {
    ATTENDANCE_SERVICE.sync_faces(&req).await
}

// 配置路由
pub fn configure_attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/attendance")
            .wrap(middlewares::RequireJWT)
            .route("/face", web::post().to(face_attendance))
            .route("/face/sync", web::post().to(sync_faces)),
    );
}
