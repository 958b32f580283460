use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "report.ts")]
pub struct StudentSearchParams {
    /// 学号精确匹配，或姓名/学号模糊匹配
    pub query: Option<String>,
}
