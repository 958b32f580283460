use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 分页查询参数
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationQuery {
    #[serde(
        default = "default_page",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub page: i64,
    #[serde(
        default = "default_size",
        deserialize_with = "deserialize_string_to_i64"
    )]
    pub size: i64,
}

// 分页响应信息
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "pagination.ts")]
pub struct PaginationInfo {
    pub page: i64,
    pub page_size: i64,
    pub total: i64,
    pub total_pages: i64,
}

// 自定义反序列化函数，支持字符串到i64的转换
fn deserialize_string_to_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{Error, Unexpected, Visitor};
    use std::fmt;

    struct I64Visitor;

    impl<'de> Visitor<'de> for I64Visitor {
        type Value = i64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an integer or a string containing an integer")
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            Ok(value)
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: Error,
        {
            if value <= i64::MAX as u64 {
                Ok(value as i64)
            } else {
                Err(Error::invalid_value(Unexpected::Unsigned(value), &self))
            }
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: Error,
        {
            value
                .parse()
                .map_err(|_| Error::invalid_value(Unexpected::Str(value), &self))
        }
    }

    deserializer.deserialize_any(I64Visitor)
}

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    20
}

/// 单页条数上限
pub const MAX_PAGE_SIZE: i64 = 100;

impl Default for PaginationQuery {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

impl PaginationQuery {
    /// 规范化页码与页大小，返回 (page, size)
    pub fn normalized(&self) -> (u64, u64) {
        let page = self.page.max(1) as u64;
        let size = self.size.clamp(1, MAX_PAGE_SIZE) as u64;
        (page, size)
    }
}

impl PaginationInfo {
    pub fn new(page: u64, size: u64, total: u64) -> Self {
        let total_pages = if size == 0 { 0 } else { total.div_ceil(size) };
        Self {
            page: page as i64,
            page_size: size as i64,
            total: total as i64,
            total_pages: total_pages as i64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_from_strings() {
        let q: PaginationQuery = serde_json::from_str(r#"{"page":"3","size":"5"}"#).unwrap();
        assert_eq!(q.page, 3);
        assert_eq!(q.size, 5);
    }

    #[test]
    fn test_normalized_clamps() {
        let q = PaginationQuery { page: 0, size: 1000 };
        assert_eq!(q.normalized(), (1, MAX_PAGE_SIZE as u64));
    }

    #[test]
    fn test_info_total_pages() {
        let info = PaginationInfo::new(1, 20, 41);
        assert_eq!(info.total_pages, 3);
        assert_eq!(PaginationInfo::new(1, 20, 0).total_pages, 0);
    }
}
