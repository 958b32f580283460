use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::instructors::entities::{InstructorImage, InstructorRole};
use crate::models::instructors::requests::CreateInstructorRequest;
use crate::services::InstructorService;

static INSTRUCTOR_SERVICE: Lazy<InstructorService> = Lazy::new(InstructorService::new_lazy);

pub async fn list_instructors(req: HttpRequest) -> ActixResult<HttpResponse> {
    INSTRUCTOR_SERVICE.list_instructors(&req).await
}

pub async fn create_instructor(
    req: HttpRequest,
    data: web::Json<CreateInstructorRequest>,
) -> ActixResult<HttpResponse> {
    INSTRUCTOR_SERVICE
        .create_instructor(&req, data.into_inner())
        .await
}

pub async fn upload_avatar(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    INSTRUCTOR_SERVICE
        .upload_image(&req, InstructorImage::Avatar, payload)
        .await
}

pub async fn upload_schedule(req: HttpRequest, payload: Multipart) -> ActixResult<HttpResponse> {
    INSTRUCTOR_SERVICE
        .upload_image(&req, InstructorImage::Schedule, payload)
        .await
}

// 配置路由，列表与创建仅管理员
pub fn configure_instructor_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/instructors")
            .wrap(middlewares::RequireJWT)
            .route("/me/image", web::post().to(upload_avatar))
            .route("/me/schedule", web::post().to(upload_schedule))
            .service(
                web::scope("")
                    .wrap(middlewares::RequireRole::new_any(InstructorRole::admin_roles()))
                    .route("", web::get().to(list_instructors))
                    .route("", web::post().to(create_instructor)),
            ),
    );
}
