pub mod face;
pub mod roster;
pub mod sync;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::face_match::FaceMatcher;
use crate::models::attendance::requests::FaceAttendanceRequest;
use crate::storage::Storage;

pub struct AttendanceService {
    storage: Option<Arc<dyn Storage>>,
    matcher: Option<Arc<dyn FaceMatcher>>,
}

impl AttendanceService {
    pub fn new_lazy() -> Self {
        Self {
            storage: None,
            matcher: None,
        }
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

    pub(crate) fn get_matcher(&self, request: &HttpRequest) -> Arc<dyn FaceMatcher> {
        if let Some(matcher) = &self.matcher {
            matcher.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn FaceMatcher>>>()
                .expect("FaceMatcher not found in app data")
                .get_ref()
                .clone()
        }
    }

    // 名单文件考勤：每次上传新建一节课堂
    pub async fn roster_attendance(
        &self,
        request: &HttpRequest,
        group_id: i64,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        roster::roster_attendance(self, request, group_id, payload).await
    }

    pub async fn face_attendance(
        &self,
        request: &HttpRequest,
        data: FaceAttendanceRequest,
    ) -> ActixResult<HttpResponse> {
        face::face_attendance(self, request, data).await
    }

    // 将已上传照片登记到人脸库
    pub async fn sync_faces(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        sync::sync_faces(self, request).await
    }
}
