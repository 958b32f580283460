pub mod create;
pub mod images;
pub mod list;

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::instructors::entities::InstructorImage;
use crate::models::instructors::requests::CreateInstructorRequest;
use crate::storage::Storage;

pub struct InstructorService {
    storage: Option<Arc<dyn Storage>>,
}

impl InstructorService {
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

    pub async fn list_instructors(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        list::list_instructors(self, request).await
    }

    pub async fn create_instructor(
        &self,
        request: &HttpRequest,
        data: CreateInstructorRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_instructor(self, request, data).await
    }

    pub async fn upload_image(
        &self,
        request: &HttpRequest,
        kind: InstructorImage,
        payload: Multipart,
    ) -> ActixResult<HttpResponse> {
        images::upload_image(self, request, kind, payload).await
    }
}
