use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::courses::requests::{
    CourseQueryParams, CreateCourseRequest, UpdateCourseRequest,
};
use crate::models::groups::requests::CreateGroupRequest;
use crate::services::{CourseService, GroupService};
use crate::utils::{SafeCourseIdI64, SafeIDI64};

static COURSE_SERVICE: Lazy<CourseService> = Lazy::new(CourseService::new_lazy);
static GROUP_SERVICE: Lazy<GroupService> = Lazy::new(GroupService::new_lazy);

pub async fn list_courses(
    req: HttpRequest,
    query: web::Query<CourseQueryParams>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.list_courses(&req, query.into_inner()).await
}

pub async fn create_course(
    req: HttpRequest,
    data: web::Json<CreateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.create_course(&req, data.into_inner()).await
}

pub async fn get_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.get_course(&req, course_id.0).await
}

pub async fn update_course(
    req: HttpRequest,
    course_id: SafeIDI64,
    data: web::Json<UpdateCourseRequest>,
) -> ActixResult<HttpResponse> {
    COURSE_SERVICE
        .update_course(&req, course_id.0, data.into_inner())
        .await
}

pub async fn delete_course(req: HttpRequest, course_id: SafeIDI64) -> ActixResult<HttpResponse> {
    COURSE_SERVICE.delete_course(&req, course_id.0).await
}

pub async fn list_groups(req: HttpRequest, course_id: SafeCourseIdI64) -> ActixResult<HttpResponse> {
    GROUP_SERVICE.list_groups(&req, course_id.0).await
}

pub async fn create_group(
    req: HttpRequest,
    course_id: SafeCourseIdI64,
    data: web::Json<CreateGroupRequest>,
) -> ActixResult<HttpResponse> {
    GROUP_SERVICE
        .create_group(&req, course_id.0, data.into_inner())
        .await
}

// 配置路由
pub fn configure_course_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/courses")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(list_courses))
            .route("", web::post().to(create_course))
            .route("/{id}", web::get().to(get_course))
            .route("/{id}", web::put().to(update_course))
            .route("/{id}", web::delete().to(delete_course))
            .route("/{course_id}/groups", web::get().to(list_groups))
            .route("/{course_id}/groups", web::post().to(create_group)),
    );
}
