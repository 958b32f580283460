use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::AttendanceService;
use crate::models::attendance::responses::FaceSyncResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::internal_error;

pub async fn sync_faces(
    service: &AttendanceService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);
    let matcher = service.get_matcher(request);

    if let Err(e) = matcher.ensure_collection().await {
        warn!("Face collection unavailable: {}", e);
        return Ok(HttpResponse::BadGateway().json(ApiResponse::error_empty(
            ErrorCode::FaceServiceUnavailable,
            format!("Face recognition service unavailable: {}", e.message()),
        )));
    }

    let photos = match storage.list_students_with_photos().await {
        Ok(photos) => photos,
        Err(e) => return Ok(internal_error("Failed to load student photos", &e)),
    };

    let mut response = FaceSyncResponse {
        enrolled: 0,
        failed: 0,
    };

    // 单个学生失败不影响其余登记
    for photo in photos {
        let image = match std::fs::read(&photo.image_path) {
            Ok(image) => image,
            Err(e) => {
                warn!("Cannot read photo {} for {}: {}", photo.image_path, photo.university_id, e);
                response.failed += 1;
                continue;
            }
        };

        let face_id = match matcher.enroll(&image, &photo.university_id).await {
            Ok(face_id) => face_id,
            Err(e) => {
                warn!("Enrollment failed for {}: {}", photo.university_id, e);
                response.failed += 1;
                continue;
            }
        };

        match storage.set_student_face_id(photo.student_id, &face_id).await {
            Ok(_) => response.enrolled += 1,
            Err(e) => {
                warn!("Failed to store face id for {}: {}", photo.university_id, e);
                response.failed += 1;
            }
        }
    }

    info!(
        "Face sync finished: {} enrolled, {} failed",
        response.enrolled, response.failed
    );
    Ok(HttpResponse::Ok().json(ApiResponse::success(response, "Face sync completed")))
}
