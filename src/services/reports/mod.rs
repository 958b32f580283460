pub mod aggregate;
pub mod course;
pub mod dashboard;
pub mod search;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::reports::requests::StudentSearchParams;
use crate::storage::Storage;

pub struct ReportService {
    storage: Option<Arc<dyn Storage>>,
}

impl ReportService {
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

    // 教师概览：课程数、最近课堂、预警学生
    pub async fn dashboard(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        dashboard::dashboard(self, request).await
    }

    pub async fn course_report(
        &self,
        request: &HttpRequest,
        course_id: i64,
    ) -> ActixResult<HttpResponse> {
        course::course_report(self, request, course_id).await
    }

    pub async fn search_students(
        &self,
        request: &HttpRequest,
        params: StudentSearchParams,
    ) -> ActixResult<HttpResponse> {
        search::search_students(self, request, params).await
    }
}
