use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{error, info};

use super::InstructorService;
use crate::config::AppConfig;
use crate::middlewares::RequireJWT;
use crate::models::instructors::entities::InstructorImage;
use crate::models::instructors::responses::InstructorImageResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error};
use crate::utils::image_store::{check_image, discard_replaced, discard_stored, store_image};
use crate::utils::multipart::read_upload_form;

/// 上传当前教师的头像或课表图片，替换旧文件
pub async fn upload_image(
    service: &InstructorService,
    request: &HttpRequest,
    kind: InstructorImage,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let config = AppConfig::get();
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };

    let form = match read_upload_form(&mut payload, config.upload.max_size).await {
        Ok(form) => form,
        Err(e) => {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(e.error_code(), e.message())));
        }
    };

    let extension = form.extension();
    if let Err(msg) = check_image(&form.file_bytes, &extension, &config.upload.allowed_types) {
        return Ok(HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::FileTypeNotAllowed, msg)));
    }

    let stored_path =
        match store_image(&config.upload.dir, kind.dir_name(), &extension, &form.file_bytes) {
            Ok(path) => path,
            Err(e) => {
                error!("{}", e);
                return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                    ErrorCode::FileUploadFailed,
                    "Failed to store image",
                )));
            }
        };

    let storage = service.get_storage(request);
    match storage
        .set_instructor_image(instructor.id, kind, &stored_path)
        .await
    {
        Ok(previous) => {
            discard_replaced(previous, &stored_path);
            RequireJWT::forget_cached(request).await;
            info!(
                "Stored {:?} image for instructor {} at {}",
                kind, instructor.id, stored_path
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                InstructorImageResponse {
                    kind,
                    stored_as: stored_path,
                },
                "Image uploaded successfully",
            )))
        }
        Err(e) => {
            discard_stored(&stored_path);
            if e.is_not_found() {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::InstructorNotFound,
                    "Instructor not found",
                )));
            }
            Ok(internal_error("Failed to record image", &e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instructors::entities::Instructor;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use std::path::Path;
    use std::sync::Arc;

    const BOUNDARY: &str = "attendance-boundary";
    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    fn form_body(file_name: &str, bytes: &[u8]) -> Vec<u8> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(
        service: &InstructorService,
        owner: &Instructor,
        kind: InstructorImage,
        file_name: &str,
        bytes: &[u8],
    ) -> (StatusCode, serde_json::Value) {
        let (req, mut payload) = TestRequest::post()
            .insert_header((
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(form_body(file_name, bytes))
            .to_http_parts();
        req.extensions_mut().insert(owner.clone());
        let multipart = Multipart::new(req.headers(), payload.take());

        let resp = upload_image(service, &req, kind, multipart).await.unwrap();
        let status = resp.status();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn setup() -> (InstructorService, Arc<dyn Storage>, Instructor) {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let id = test_support::instructor(&storage, "dr.salma").await;
        let owner = storage.get_instructor_by_id_impl(id).await.unwrap().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let service = InstructorService {
            storage: Some(storage.clone()),
        };
        (service, storage, owner)
    }

    #[actix_web::test]
    async fn test_rejected_type_leaves_profile_untouched() {
        let (service, storage, owner) = setup().await;

        let (status, json) =
            upload(&service, &owner, InstructorImage::Avatar, "me.gif", PNG_HEADER).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], ErrorCode::FileTypeNotAllowed as i64);

        let (status, _) =
            upload(&service, &owner, InstructorImage::Avatar, "me.png", b"not an image").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let saved = storage.get_instructor_by_id(owner.id).await.unwrap().unwrap();
        assert_eq!(saved.image_path, None);
    }

    #[actix_web::test]
    async fn test_new_avatar_replaces_previous_file() {
        let (service, storage, owner) = setup().await;

        let (status, json) =
            upload(&service, &owner, InstructorImage::Avatar, "me.png", PNG_HEADER).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["kind"], "avatar");
        let first = json["data"]["stored_as"].as_str().unwrap().to_string();
        assert!(Path::new(&first).exists());

        let (_, json) =
            upload(&service, &owner, InstructorImage::Avatar, "me.png", PNG_HEADER).await;
        let second = json["data"]["stored_as"].as_str().unwrap().to_string();
        assert!(!Path::new(&first).exists());
        assert!(Path::new(&second).exists());

        let (status, json) =
            upload(&service, &owner, InstructorImage::Schedule, "week.png", PNG_HEADER).await;
        assert_eq!(status, StatusCode::CREATED);
        let schedule = json["data"]["stored_as"].as_str().unwrap().to_string();
        assert!(schedule.contains("schedules"));

        let saved = storage.get_instructor_by_id(owner.id).await.unwrap().unwrap();
        assert_eq!(saved.image_path.as_deref(), Some(second.as_str()));
        assert_eq!(saved.schedule_path.as_deref(), Some(schedule.as_str()));

        let _ = std::fs::remove_file(&second);
        let _ = std::fs::remove_file(&schedule);
    }
}
