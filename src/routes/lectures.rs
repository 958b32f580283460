use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::attendance::requests::UpdateRecordRequest;
use crate::models::lectures::requests::{ExportParams, LectureQueryParams};
use crate::services::LectureService;
use crate::utils::{SafeIDI64, SafeStudentIdI64};

static LECTURE_SERVICE: Lazy<LectureService> = Lazy::new(LectureService::new_lazy);

pub async fn list_lectures(
    req: HttpRequest,
    query: web::Query<LectureQueryParams>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE.list_lectures(&req, query.into_inner()).await
}

pub async fn get_lecture(req: HttpRequest, lecture_id: SafeIDI64) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE.get_lecture(&req, lecture_id.0).await
}

pub async fn update_record(
    req: HttpRequest,
    lecture_id: SafeIDI64,
    student_id: SafeStudentIdI64,
    data: web::Json<UpdateRecordRequest>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .update_record(&req, lecture_id.0, student_id.0, data.into_inner())
        .await
}

pub async fn export_lecture(
    req: HttpRequest,
    lecture_id: SafeIDI64,
    params: web::Query<ExportParams>,
) -> ActixResult<HttpResponse> {
    LECTURE_SERVICE
        .export_lecture(&req, lecture_id.0, params.into_inner())
        .await
}

// 配置路由
pub fn configure_lecture_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/lectures")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_lectures))
            .route("/{id}", web::get().to(get_lecture))
            .route("/{id}/records/{student_id}", web::put().to(update_record))
            .route("/{id}/export", web::get().to(export_lecture)),
    );
}
