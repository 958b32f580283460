//! JSON 与查询参数解析失败时返回统一的错误响应

use actix_web::{
    HttpRequest, HttpResponse,
    error::{InternalError, JsonPayloadError, QueryPayloadError},
};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("JSON payload rejected on {}: {}", req.path(), err);
    let message = format!("Invalid JSON payload: {err}");
    let response = match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            HttpResponse::PayloadTooLarge()
                .json(ApiResponse::error_empty(ErrorCode::BadRequest, &message))
        }
        _ => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::BadRequest, &message)),
    };
    InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("Query string rejected on {}: {}", req.path(), err);
    let response = HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::BadRequest,
        format!("Invalid query parameters: {err}"),
    ));
    InternalError::from_response(err, response).into()
}
