pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::courses::requests::{
    CourseQueryParams, CreateCourseRequest, UpdateCourseRequest,
};
use crate::storage::Storage;

pub struct CourseService {
    storage: Option<Arc<dyn Storage>>,
}

impl CourseService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 课程列表，教师只能看到自己的课程
    pub async fn list_courses(
        &self,
        request: &HttpRequest,
        query: CourseQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_courses(self, request, query).await
    }

    pub async fn create_course(
        &self,
        request: &HttpRequest,
        data: CreateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_course(self, request, data).await
    }

    pub async fn get_course(&self, request: &HttpRequest, course_id: i64) -> ActixResult<HttpResponse> {
        get::get_course(self, request, course_id).await
    }

    pub async fn update_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
        data: UpdateCourseRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_course(self, request, course_id, data).await
    }

    // 删除课程，分组与课堂级联删除
    pub async fn delete_course(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_course(self, request, course_id).await
    }
}
