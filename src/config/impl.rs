use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .separator("__")
                    .try_parsing(true),
            );

        // 支持从环境变量加载
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option(
                "cache.redis.key_prefix",
                std::env::var("REDIS_KEY_PREFIX").ok(),
            )?
            .set_override_option("face_match.base_url", std::env::var("FACE_MATCH_URL").ok())?
            .set_override_option(
                "face_match.api_key",
                std::env::var("FACE_MATCH_API_KEY").ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        app_config.validate()?;
        Ok(app_config)
    }

    /// 校验考勤相关配置的取值范围
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.attendance.warning_threshold < 1 {
            return Err(ConfigError::Message(
                "attendance.warning_threshold must be at least 1".to_string(),
            ));
        }

        let threshold = self.face_match.similarity_threshold;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::Message(format!(
                "face_match.similarity_threshold must be within [0, 100], got {threshold}"
            )));
        }

        if self.face_match.enabled && self.face_match.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "face_match.base_url is required when face matching is enabled".to_string(),
            ));
        }

        if self.import.max_rows == 0 {
            return Err(ConfigError::Message("import.max_rows must be positive".to_string()));
        }

        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> AppConfig {
        Config::builder()
            .add_source(File::from_str(
                include_str!("../../config.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut cfg = base();
        cfg.attendance.warning_threshold = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.face_match.similarity_threshold = 150.0;
        assert!(cfg.validate().is_err());

        let mut cfg = base();
        cfg.face_match.enabled = true;
        cfg.face_match.base_url = "  ".to_string();
        assert!(cfg.validate().is_err());
    }
}
