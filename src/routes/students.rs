use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::students::requests::{
    CreateStudentRequest, StudentQueryParams, UpdateStudentRequest,
};
use crate::services::StudentService;
use crate::utils::{SafeIDI64, SafeUniversityId};

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentQueryParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(&req, query.into_inner()).await
}

pub async fn create_student(
    req: HttpRequest,
    data: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(&req, data.into_inner()).await
}

pub async fn get_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(&req, student_id.0).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeIDI64,
    data: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(&req, student_id.0, data.into_inner())
        .await
}

pub async fn delete_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.delete_student(&req, student_id.0).await
}

pub async fn import_students(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.import_students(&req, payload).await
}

pub async fn upload_photo(
    req: HttpRequest,
    student_id: SafeIDI64,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .upload_photo(&req, student_id.0, payload)
        .await
}

pub async fn public_profile(
    req: HttpRequest,
    university_id: SafeUniversityId,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .get_public_profile(&req, &university_id.0)
        .await
}

// 配置路由
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_students))
            .route("", web::post().to(create_student))
            .route("/import", web::post().to(import_students))
            .route("/{id}", web::get().to(get_student))
            .route("/{id}", web::put().to(update_student))
            .route("/{id}", web::delete().to(delete_student))
            .route("/{id}/photo", web::post().to(upload_photo)),
    );
}

// 公开接口，无需登录，按 IP 限流
pub fn configure_public_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/public")
            .wrap(middlewares::RateLimit::public_profile())
            .route(
                "/students/{university_id}/profile",
                web::get().to(public_profile),
            ),
    );
}
