pub mod export;
pub mod get;
pub mod list;
pub mod records;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::attendance::requests::UpdateRecordRequest;
use crate::models::lectures::requests::{ExportParams, LectureQueryParams};
use crate::storage::Storage;

pub struct LectureService {
    storage: Option<Arc<dyn Storage>>,
}

impl LectureService {
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

    pub async fn list_lectures(
        &self,
        request: &HttpRequest,
        query: LectureQueryParams,
    ) -> ActixResult<HttpResponse> {
        list::list_lectures(self, request, query).await
    }

    // 课堂详情及完整考勤名单
    pub async fn get_lecture(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
    ) -> ActixResult<HttpResponse> {
        get::get_lecture(self, request, lecture_id).await
    }

    pub async fn update_record(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        student_id: i64,
        data: UpdateRecordRequest,
    ) -> ActixResult<HttpResponse> {
        records::update_record(self, request, lecture_id, student_id, data).await
    }

    pub async fn export_lecture(
        &self,
        request: &HttpRequest,
        lecture_id: i64,
        params: ExportParams,
    ) -> ActixResult<HttpResponse> {
        export::export_lecture(self, request, lecture_id, params).await
    }
}
