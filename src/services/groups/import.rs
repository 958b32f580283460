use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::GroupService;
use crate::models::ApiResponse;
use crate::services::access::{current_instructor, internal_error, load_group};
use crate::services::students::import::{RowLayout, read_import_rows};

/// 导入学生并全部加入该分组
pub async fn import_group_students(
    service: &GroupService,
    request: &HttpRequest,
    group_id: i64,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let instructor = match current_instructor(request) {
        Ok(instructor) => instructor,
        Err(resp) => return Ok(resp),
    };
    let storage = service.get_storage(request);

    let (group, course) = match load_group(&storage, &instructor, group_id).await {
        Ok(loaded) => loaded,
        Err(resp) => return Ok(resp),
    };

    let rows = match read_import_rows(&mut payload, RowLayout::Group).await {
        Ok(rows) => rows,
        Err(resp) => return Ok(resp),
    };

    match storage.reconcile_group_students(group.id, rows).await {
        Ok(report) => {
            info!(
                "Group import into {} / {}: {} rows, {} created, {} links",
                course.code, group.name, report.rows_processed, report.students_created, report.links_created
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(report, "Import completed")))
        }
        Err(e) => Ok(internal_error("Group import failed", &e)),
    }
}
