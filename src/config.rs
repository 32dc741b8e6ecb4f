use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 监听地址
    pub host: String,
    /// 监听端口
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3940,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "hiface_backend=info,tower_http=info".to_string(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API 路由前缀
    pub prefix: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: "/api/v1".to_string(),
        }
    }
}

/// 文档数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite 文件路径
    #[serde(default = "DatabaseConfig::default_sqlite_path")]
    pub sqlite_path: String,
    /// 是否启用 WAL
    #[serde(default = "DatabaseConfig::default_wal")]
    pub wal: bool,
}

impl DatabaseConfig {
    fn default_sqlite_path() -> String {
        "./resources/hiface.db".to_string()
    }
    fn default_wal() -> bool {
        true
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: Self::default_sqlite_path(),
            wal: Self::default_wal(),
        }
    }
}

/// 临时链接签发方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SignerKind {
    /// 调用云存储 batchdownloadfile 接口
    #[default]
    Http,
    /// 按固定域名替换前缀（本地/离线部署）
    Static,
}

/// 云存储签发配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    #[serde(default)]
    pub kind: SignerKind,
    /// batchdownloadfile 接口地址
    #[serde(default = "SignerConfig::default_endpoint")]
    pub endpoint: String,
    /// 云环境 ID
    #[serde(default)]
    pub env: String,
    /// 接口调用凭证（建议通过 APP_SIGNER__ACCESS_TOKEN 注入）
    #[serde(default)]
    pub access_token: Option<String>,
    /// 临时链接有效期（秒）
    #[serde(default = "SignerConfig::default_max_age")]
    pub max_age_secs: u64,
    /// 签发请求超时（秒）
    #[serde(default = "SignerConfig::default_timeout")]
    pub timeout_secs: u64,
    /// static 模式下的访问域名，例如 https://7869-demo.tcb.qcloud.la
    #[serde(default)]
    pub static_base_url: Option<String>,
}

impl SignerConfig {
    fn default_endpoint() -> String {
        "https://api.weixin.qq.com/tcb/batchdownloadfile".to_string()
    }
    fn default_max_age() -> u64 {
        7200
    }
    fn default_timeout() -> u64 {
        10
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            kind: SignerKind::default(),
            endpoint: Self::default_endpoint(),
            env: String::new(),
            access_token: None,
            max_age_secs: Self::default_max_age(),
            timeout_secs: Self::default_timeout(),
            static_base_url: None,
        }
    }
}

/// 主题接口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// 未传 themeId 时读取的配置项名称
    #[serde(default = "ThemeConfig::default_config_name")]
    pub default_config_name: String,
    /// 默认每页条数
    #[serde(default = "ThemeConfig::default_page_size")]
    pub default_page_size: u64,
    /// 每页条数上限
    #[serde(default = "ThemeConfig::default_max_page_size")]
    pub max_page_size: u64,
    /// total 是否按查询条件统计（历史行为为整表计数）
    #[serde(default)]
    pub count_respects_condition: bool,
}

impl ThemeConfig {
    fn default_config_name() -> String {
        "avatar-edit".to_string()
    }
    fn default_page_size() -> u64 {
        10
    }
    fn default_max_page_size() -> u64 {
        100
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            default_config_name: Self::default_config_name(),
            default_page_size: Self::default_page_size(),
            max_page_size: Self::default_max_page_size(),
            count_respects_condition: false,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// 云存储临时链接签发
    #[serde(default)]
    pub signer: SignerConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从默认配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// 从指定路径加载；文件可缺省，全部字段都有默认值
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_API__PREFIX、APP_SIGNER__ACCESS_TOKEN
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 获取全局配置单例
    pub fn global() -> &'static AppConfig {
        CONFIG.get().expect("配置未初始化，请先调用 init_global()")
    }

    /// 初始化全局配置
    pub fn init_global() -> Result<(), ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        Ok(())
    }

    /// 配置文件路径
    pub fn config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
