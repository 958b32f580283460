use crate::config::AppConfig;
use crate::errors::{AttendanceError, Result};
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

pub const REFRESH_COOKIE_NAME: &str = "refresh_token";

/// Token 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // 教师ID
    pub role: String, // 教师角色
    pub kind: TokenKind,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn instructor_id(&self) -> Result<i64> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AttendanceError::authentication("token subject is not an id"))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// 使用指定密钥签发 token
pub fn encode_token(
    secret: &str,
    instructor_id: i64,
    role: &str,
    kind: TokenKind,
    ttl: chrono::Duration,
) -> Result<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: instructor_id.to_string(),
        role: role.to_string(),
        kind,
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AttendanceError::authentication(format!("签发 token 失败: {e}")))
}

/// 使用指定密钥校验 token 及其类型
pub fn decode_token(secret: &str, token: &str, expected: TokenKind) -> Result<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| AttendanceError::authentication(format!("token 无效: {e}")))?;

    if claims.kind != expected {
        return Err(AttendanceError::authentication("token 类型不匹配"));
    }
    Ok(claims)
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    pub fn generate_access_token(instructor_id: i64, role: &str) -> Result<String> {
        let config = AppConfig::get();
        encode_token(
            Self::secret(),
            instructor_id,
            role,
            TokenKind::Access,
            chrono::Duration::minutes(config.jwt.access_token_expiry),
        )
    }

    /// 生成 access + refresh token，`refresh_token_expiry` 为空时使用默认有效期
    pub fn generate_token_pair(
        instructor_id: i64,
        role: &str,
        refresh_token_expiry: Option<chrono::Duration>,
    ) -> Result<TokenPair> {
        let config = AppConfig::get();
        let refresh_ttl = refresh_token_expiry
            .unwrap_or_else(|| chrono::Duration::days(config.jwt.refresh_token_expiry));

        Ok(TokenPair {
            access_token: Self::generate_access_token(instructor_id, role)?,
            refresh_token: encode_token(
                Self::secret(),
                instructor_id,
                role,
                TokenKind::Refresh,
                refresh_ttl,
            )?,
        })
    }

    pub fn verify_access_token(token: &str) -> Result<Claims> {
        decode_token(Self::secret(), token, TokenKind::Access)
    }

    pub fn verify_refresh_token(token: &str) -> Result<Claims> {
        decode_token(Self::secret(), token, TokenKind::Refresh)
    }

    /// 创建 Refresh Token Cookie
    pub fn create_refresh_token_cookie(refresh_token: &str, max_age_days: i64) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(REFRESH_COOKIE_NAME, refresh_token.to_string())
            .path("/api/v1/auth")
            .max_age(actix_web::cookie::time::Duration::days(max_age_days))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production()) // 生产环境下使用 HTTPS
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_token_round_trip() {
        let token = encode_token(SECRET, 42, "admin", TokenKind::Access, chrono::Duration::minutes(5))
            .unwrap();
        let claims = decode_token(SECRET, &token, TokenKind::Access).unwrap();
        assert_eq!(claims.instructor_id().unwrap(), 42);
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn test_token_kind_is_checked() {
        let refresh =
            encode_token(SECRET, 7, "instructor", TokenKind::Refresh, chrono::Duration::days(1))
                .unwrap();
        assert!(decode_token(SECRET, &refresh, TokenKind::Access).is_err());
        assert!(decode_token("other-secret", &refresh, TokenKind::Refresh).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let token =
            encode_token(SECRET, 1, "instructor", TokenKind::Access, chrono::Duration::hours(-2))
                .unwrap();
        let err = decode_token(SECRET, &token, TokenKind::Access).unwrap_err();
        assert_eq!(err.code(), "E008");
    }
}
