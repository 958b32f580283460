use once_cell::sync::Lazy;
use regex::Regex;

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("Invalid username regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

static UNIVERSITY_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,32}$").expect("Invalid university id regex"));

static COURSE_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9 ._-]{1,32}$").expect("Invalid course code regex"));

/// GPA 取值范围
pub const GPA_MIN: f64 = 0.0;
pub const GPA_MAX: f64 = 5.0;

/// 与数据库列宽一致的名称长度上限（按字符计）
pub const STUDENT_NAME_MAX_LEN: usize = 150;
pub const GROUP_NAME_MAX_LEN: usize = 50;

pub fn validate_username(username: &str) -> Result<(), &'static str> {
    // 用户名长度校验：3 <= x <= 32
    if username.len() < 3 || username.len() > 32 {
        return Err("Username length must be between 3 and 32 characters");
    }
    if !USERNAME_RE.is_match(username) {
        return Err("Username must contain only letters, numbers, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if !EMAIL_RE.is_match(email) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 密码至少 8 位，且同时包含字母和数字
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_alphabetic())
        || !password.chars().any(|c| c.is_ascii_digit())
    {
        return Err("Password must contain both letters and digits");
    }
    Ok(())
}

pub fn validate_university_id(university_id: &str) -> Result<(), &'static str> {
    if !UNIVERSITY_ID_RE.is_match(university_id) {
        return Err("University id must be 1-32 letters, digits, dots, underscores or hyphens");
    }
    Ok(())
}

pub fn validate_student_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Student name must not be empty");
    }
    if name.chars().count() > STUDENT_NAME_MAX_LEN {
        return Err("Student name must be at most 150 characters");
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Group name must not be empty");
    }
    if name.chars().count() > GROUP_NAME_MAX_LEN {
        return Err("Group name must be at most 50 characters");
    }
    Ok(())
}

pub fn validate_course_code(code: &str) -> Result<(), &'static str> {
    if code.trim().is_empty() || !COURSE_CODE_RE.is_match(code) {
        return Err("Course code must be 1-32 letters, digits, spaces, dots or hyphens");
    }
    Ok(())
}

pub fn validate_gpa(gpa: f64) -> Result<(), &'static str> {
    if !gpa.is_finite() || !(GPA_MIN..=GPA_MAX).contains(&gpa) {
        return Err("GPA must be a number between 0.0 and 5.0");
    }
    Ok(())
}

/// 表格单元格是否视为空（空白或表格软件导出的 "nan"）
pub fn is_blank_cell(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("nan")
}

/// 解析 GPA 单元格：空白返回 `Ok(None)`，非法数值返回错误
pub fn parse_gpa_cell(raw: Option<&str>) -> Result<Option<f64>, String> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if is_blank_cell(raw) {
        return Ok(None);
    }

    let gpa: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("GPA '{}' is not a number", raw.trim()))?;
    validate_gpa(gpa).map_err(|e| format!("GPA '{}': {e}", raw.trim()))?;
    Ok(Some(gpa))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_and_email() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("a").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_email("lee@uni.edu").is_ok());
        assert!(validate_email("lee@uni").is_err());
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("abc12345").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("onlyletters").is_err());
    }

    #[test]
    fn test_university_id() {
        assert!(validate_university_id("2021-00123").is_ok());
        assert!(validate_university_id("").is_err());
        assert!(validate_university_id("12 34").is_err());
    }

    #[test]
    fn test_name_lengths() {
        assert!(validate_student_name("Ali").is_ok());
        assert!(validate_student_name("  ").is_err());
        assert!(validate_student_name(&"é".repeat(150)).is_ok());
        assert!(validate_student_name(&"x".repeat(151)).is_err());
        assert!(validate_group_name("Lab A").is_ok());
        assert!(validate_group_name(&"g".repeat(51)).is_err());
    }

    #[test]
    fn test_course_code() {
        assert!(validate_course_code("CS101").is_ok());
        assert!(validate_course_code("CS 101").is_ok());
        assert!(validate_course_code("   ").is_err());
        assert!(validate_course_code("CS,101").is_err());
    }

    #[test]
    fn test_parse_gpa_cell() {
        assert_eq!(parse_gpa_cell(None), Ok(None));
        assert_eq!(parse_gpa_cell(Some("  ")), Ok(None));
        assert_eq!(parse_gpa_cell(Some("NaN")), Ok(None));
        assert_eq!(parse_gpa_cell(Some("3.75")), Ok(Some(3.75)));
        assert_eq!(parse_gpa_cell(Some("5")), Ok(Some(5.0)));
        assert!(parse_gpa_cell(Some("5.1")).is_err());
        assert!(parse_gpa_cell(Some("-0.5")).is_err());
        assert!(parse_gpa_cell(Some("A+")).is_err());
    }

    #[test]
    fn test_blank_cell() {
        assert!(is_blank_cell("nan"));
        assert!(is_blank_cell(" "));
        assert!(!is_blank_cell("0"));
    }
}
