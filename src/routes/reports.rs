use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::reports::requests::StudentSearchParams;
use crate::services::ReportService;
use crate::utils::SafeCourseIdI64;

static REPORT_SERVICE: Lazy<ReportService> = Lazy::new(ReportService::new_lazy);

pub async fn dashboard(req: HttpRequest) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.dashboard(&req).await
}

pub async fn course_report(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE.course_report(&req, course_id.0).await
}

pub async fn search_students(
    req: HttpRequest,
    params: web::Query<StudentSearchParams>,
) -> ActixResult<HttpResponse> {
    REPORT_SERVICE
        .search_students(&req, params.into_inner())
        .await
}

// 配置路由
pub fn configure_report_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/reports")
            .wrap(middlewares::RequireJWT)
            .route("/dashboard", web::get().to(dashboard))
            .route("/courses/{course_id}", web::get().to(course_report))
            .route("/students", web::get().to(search_students)),
    );
}
