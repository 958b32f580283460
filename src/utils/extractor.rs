//! 路径参数提取器
//!
//! 在进入业务逻辑前校验路径中的 ID，非法值直接返回 400。

use actix_web::{HttpRequest, HttpResponse, error::InternalError};

use crate::models::{ApiResponse, ErrorCode};
use crate::utils::validate::validate_university_id;

fn bad_path_param(message: String) -> actix_web::Error {
    let response =
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, &message));
    InternalError::from_response(message, response).into()
}

/// 读取并校验正整数路径参数
pub fn parse_i64_param(req: &HttpRequest, name: &str) -> Result<i64, actix_web::Error> {
    let raw = req
        .match_info()
        .get(name)
        .ok_or_else(|| bad_path_param(format!("Missing path parameter: {name}")))?;

    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| bad_path_param(format!("Invalid {name}: {raw}")))
}

/// 定义一个按名称读取 i64 路径参数的提取器
#[macro_export]
macro_rules! define_safe_i64_extractor {
    ($name:ident, $param:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl actix_web::FromRequest for $name {
            type Error = actix_web::Error;
            type Future = std::future::Ready<Result<Self, Self::Error>>;

            fn from_request(
                req: &actix_web::HttpRequest,
                _: &mut actix_web::dev::Payload,
            ) -> Self::Future {
                std::future::ready($crate::utils::extractor::parse_i64_param(req, $param).map($name))
            }
        }
    };
}

define_safe_i64_extractor!(SafeIDI64, "id");
define_safe_i64_extractor!(SafeCourseIdI64, "course_id");
define_safe_i64_extractor!(SafeStudentIdI64, "student_id");

/// 学号路径参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeUniversityId(pub String);

impl actix_web::FromRequest for SafeUniversityId {
    type Error = actix_web::Error;
    type Future = std::future::Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        let result = match req.match_info().get("university_id") {
            Some(raw) => validate_university_id(raw)
                .map(|_| SafeUniversityId(raw.to_string()))
                .map_err(|e| bad_path_param(e.to_string())),
            None => Err(bad_path_param(
                "Missing path parameter: university_id".to_string(),
            )),
        };
        std::future::ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{FromRequest, test::TestRequest};

    #[actix_web::test]
    async fn test_valid_id_is_extracted() {
        let req = TestRequest::default()
            .param("course_id", "17")
            .to_http_request();
        let id = SafeCourseIdI64::extract(&req).await.unwrap();
        assert_eq!(id.0, 17);
    }

    #[actix_web::test]
    async fn test_invalid_ids_are_rejected() {
        for raw in ["0", "-3", "abc", "9999999999999999999999"] {
            let req = TestRequest::default().param("id", raw).to_http_request();
            assert!(SafeIDI64::extract(&req).await.is_err(), "{raw} accepted");
        }

        let missing = TestRequest::default().to_http_request();
        assert!(SafeStudentIdI64::extract(&missing).await.is_err());
    }

    #[actix_web::test]
    async fn test_university_id_extractor() {
        let ok = TestRequest::default()
            .param("university_id", "2021-001")
            .to_http_request();
        assert_eq!(SafeUniversityId::extract(&ok).await.unwrap().0, "2021-001");

        let bad = TestRequest::default()
            .param("university_id", "a b")
            .to_http_request();
        assert!(SafeUniversityId::extract(&bad).await.is_err());
    }
}
