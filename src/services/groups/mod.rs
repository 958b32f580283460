pub mod create;
pub mod delete;
pub mod import;
pub mod list;
pub mod members;
pub mod roster;
pub mod update;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::groups::requests::{CreateGroupRequest, UpdateGroupRequest};
use crate::storage::Storage;

pub struct GroupService {
    storage: Option<Arc<dyn Storage>>,
}

impl GroupService {
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

    pub async fn list_groups(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        list::list_groups(self, request, course_id).await
    }

    pub async fn create_group(
        &self,
        request: &HttpRequest,
        course_id: i64,
        data: CreateGroupRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_group(self, request, course_id, data).await
    }

    pub async fn update_group(
        &self,
        request: &HttpRequest,
        group_id: i64,
        data: UpdateGroupRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_group(self, request, group_id, data).await
    }

    // 删除分组，成员关系与课堂级联删除
    pub async fn delete_group(
        &self,
        request: &HttpRequest,
        group_id: i64,
    ) -> ActixResult<HttpResponse> {
        delete::delete_group(self, request, group_id).await
    }

    // 分组名单及各成员在本课程的缺勤次数
    pub async fn group_roster(
        &self,
        request: &HttpRequest,
        group_id: i64,
    ) -> ActixResult<HttpResponse> {
        roster::group_roster(self, request, group_id).await
    }

    pub async fn add_member(
        &self,
        request: &HttpRequest,
        group_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        members::add_member(self, request, group_id, student_id).await
    }

    pub async fn remove_member(
        &self,
        request: &HttpRequest,
        group_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        members::remove_member(self, request, group_id, student_id).await
    }

    pub async fn import_group_students(
        &self,
        request: &HttpRequest,
        group_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        import::import_group_students(self, request, group_id, payload).await
    }
}
