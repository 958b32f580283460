use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::Utc;
use tracing::{info, warn};

use super::AttendanceService;
use crate::config::AppConfig;
use crate::face_match::{FaceMatch, decode_image};
use crate::models::attendance::requests::FaceAttendanceRequest;
use crate::models::attendance::responses::FaceAttendanceResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::access::{current_instructor, internal_error, load_group};

/// 相似度达到阈值（含等于）才视为识别成功
pub(crate) fn recognized_face(found: Option<FaceMatch>, threshold: f64) -> Option<FaceMatch> {
    found.filter(|m| m.similarity >= threshold)
}

/// 人脸考勤：识别失败或相似度不足时不写入任何数据
pub async fn face_attendance(
    service: &AttendanceService,
    request: &HttpRequest,
    data: FaceAttendanceRequest,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);
    let matcher = service.get_matcher(request);
    let config = AppConfig::get();

    let (group, _) = match load_group(&storage, &instructor, data.group_id).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let image = match decode_image(&data.image) {
        Ok(image) => image,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::FaceImageInvalid,
                e.message(),
            )));
        }
    };

    let found = match matcher.search(&image).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Face search failed: {}", e);
            return Ok(HttpResponse::BadGateway().json(ApiResponse::error_empty(
                ErrorCode::FaceServiceUnavailable,
                format!("Face recognition service unavailable: {}", e.message()),
            )));
        }
    };

    let Some(face) = recognized_face(found, config.face_match.similarity_threshold) else {
        return Ok(HttpResponse::UnprocessableEntity().json(ApiResponse::error_empty(
            ErrorCode::FaceNotRecognized,
            "Unknown face",
        )));
    };

    let topic = data
        .topic
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(config.attendance.default_topic.as_str())
        .to_string();

    match storage
        .record_face_attendance(group.id, &face.external_id, &topic, Utc::now())
        .await
    {
        Ok(result) => {
            info!(
                "Face attendance: {} present in lecture {} ({:.1}%)",
                result.university_id, result.lecture_id, face.similarity
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                FaceAttendanceResponse {
                    result,
                    similarity: face.similarity,
                },
                "Attendance recorded",
            )))
        }
        Err(e) if e.is_not_found() => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            format!("No student with university id {}", face.external_id),
        ))),
        Err(e) => Ok(internal_error("Failed to record face attendance", &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{AttendanceError, Result};
    use crate::face_match::FaceMatcher;
    use crate::face_match::image::encode_image;
    use crate::storage::Storage;
    use crate::storage::sea_orm_storage::{SeaOrmStorage, test_support};
    use actix_web::HttpMessage;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use async_trait::async_trait;
    use std::sync::Arc;

    const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn face(external_id: &str, similarity: f64) -> FaceMatch {
        FaceMatch {
            external_id: external_id.to_string(),
            similarity,
        }
    }

    /// 固定返回结果的比对服务，`None` 表示服务故障
    struct FixedMatcher(Option<Option<FaceMatch>>);

    #[async_trait]
    impl FaceMatcher for FixedMatcher {
        async fn ensure_collection(&self) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _image: &[u8]) -> Result<Option<FaceMatch>> {
            self.0
                .clone()
                .ok_or_else(|| AttendanceError::external_service("connection refused"))
        }

        async fn enroll(&self, _image: &[u8], external_id: &str) -> Result<String> {
            Ok(format!("face-{external_id}"))
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        assert_eq!(recognized_face(Some(face("123", 85.0)), 85.0), Some(face("123", 85.0)));
        assert_eq!(recognized_face(Some(face("123", 84.99)), 85.0), None);
        assert_eq!(recognized_face(Some(face("123", 99.0)), 85.0), Some(face("123", 99.0)));
        assert_eq!(recognized_face(None, 85.0), None);
    }

    /// 依次用不同的比对结果调用接口，返回状态码、业务码和该课程的课堂数
    async fn run(outcome: Option<Option<FaceMatch>>) -> (StatusCode, i64, i64) {
        let storage = SeaOrmStorage::new_in_memory().await.unwrap();
        let fx = test_support::group_with_students(&storage, &["123", "456"]).await;
        let owner = storage.get_instructor_by_id_impl(fx.owner_id).await.unwrap().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let service = AttendanceService {
            storage: Some(storage.clone()),
            matcher: Some(Arc::new(FixedMatcher(outcome))),
        };
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(owner);

        let data = FaceAttendanceRequest {
            image: format!("data:image/png;base64,{}", encode_image(&PNG_HEADER)),
            group_id: fx.group.id,
            topic: Some("Week 1".to_string()),
        };
        let resp = face_attendance(&service, &req, data).await.unwrap();
        let status = resp.status();
        let body = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        let lectures = storage
            .count_lectures_by_course(&[fx.course.id])
            .await
            .unwrap()
            .get(&fx.course.id)
            .copied()
            .unwrap_or(0);
        (status, json["code"].as_i64().unwrap(), lectures)
    }

    #[actix_web::test]
    async fn test_service_failure_mutates_nothing() {
        let (status, code, lectures) = run(None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(code, ErrorCode::FaceServiceUnavailable as i64);
        assert_eq!(lectures, 0);
    }

    #[actix_web::test]
    async fn test_unknown_or_weak_match_mutates_nothing() {
        for outcome in [None, Some(face("123", 84.9))] {
            let (status, code, lectures) = run(Some(outcome)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            assert_eq!(code, ErrorCode::FaceNotRecognized as i64);
            assert_eq!(lectures, 0);
        }
    }

    #[actix_web::test]
    async fn test_match_at_threshold_records_attendance() {
        let (status, code, lectures) = run(Some(Some(face("123", 85.0)))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(code, ErrorCode::Success as i64);
        assert_eq!(lectures, 1);
    }
}
