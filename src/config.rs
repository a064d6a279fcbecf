use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// 导入时自动创建的供应商所用币种
    pub default_currency: String,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/tariff".to_string(),
                max_connections: 20,
            },
            ingest: IngestConfig {
                default_currency: "Ksh".to_string(),
                max_upload_bytes: 20 * 1024 * 1024,
            },
        }
    }
}

impl AppConfig {
    /// 加载顺序: 默认值 -> config/tariff.* (可选) -> TARIFF__* 环境变量 -> DATABASE_URL
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(File::with_name("config/tariff").required(false))?
            .add_source(Environment::with_prefix("TARIFF").separator("__"))
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?
            .try_deserialize()
    }

    fn builder(
        file: File<config::FileSourceFile, config::FileFormat>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let defaults = Self::default();
        Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("database.url", defaults.database.url)?
            .set_default(
                "database.max_connections",
                i64::from(defaults.database.max_connections),
            )?
            .set_default("ingest.default_currency", defaults.ingest.default_currency)?
            .set_default("ingest.max_upload_bytes", defaults.ingest.max_upload_bytes as i64)
            .map(|builder| builder.add_source(file))
    }
}
