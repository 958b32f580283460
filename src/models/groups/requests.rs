use serde::Deserialize;
use ts_rs::TS;

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export, export_to = "group.ts")]
pub struct UpdateGroupRequest {
    pub name: String,
}
