use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::face_match::{FaceMatcher, create_face_matcher};
use crate::models::instructors::entities::InstructorRole;
use crate::models::instructors::requests::CreateInstructorRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub face_matcher: Arc<dyn FaceMatcher>,
}

async fn try_cache_backend(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin(name)?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    if get_object_cache_plugin(cache_type).is_none() {
        warn!("Cache backend '{}' not found in registry", cache_type);
    } else if let Some(cache) = try_cache_backend(cache_type).await {
        return Ok(cache);
    }

    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = try_cache_backend("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 生成随机密码（保证同时含字母与数字）
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    let mut password: String = (0..length.saturating_sub(2))
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect();
    password.push(rng.random_range(b'a'..=b'z') as char);
    password.push(rng.random_range(b'0'..=b'9') as char);
    password
}

/// 初始化默认管理员账号
/// 如果数据库中没有任何教师账号，则创建一个 admin
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_instructors().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} instructor(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No instructors found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count instructors: {}, skipping admin seed", e);
            return;
        }
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_random_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateInstructorRequest {
        username: "admin".to_string(),
        email: "admin@localhost".to_string(),
        password: password_hash,
        role: InstructorRole::Admin,
        display_name: Some("Administrator".to_string()),
    };

    match storage.create_instructor(admin_request).await {
        Ok(admin) => {
            info!(
                "Default admin account created successfully (ID: {}, username: {})",
                admin.id, admin.username
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存和人脸比对客户端
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    seed_admin(&storage).await;

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    let face_matcher = create_face_matcher(&AppConfig::get().face_match)
        .expect("Failed to create face matcher");
    warn!("Face matcher initialized");

    StartupContext {
        storage,
        cache,
        face_matcher,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::validate::validate_password;

    #[test]
    fn test_generated_password_passes_policy() {
        for _ in 0..20 {
            let pwd = generate_random_password(16);
            assert_eq!(pwd.chars().count(), 16);
            assert!(validate_password(&pwd).is_ok());
        }
    }
}
