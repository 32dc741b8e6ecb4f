/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 文档数据库抽象与 SQLite 实现
pub mod store;

/// 功能聚合模块
pub mod features;

/// 应用状态聚合模块
pub mod state;

/// 请求追踪 ID
pub mod request_id;

/// OpenAPI 文档
pub mod openapi;

/// 优雅退出管理模块
pub mod shutdown;

/// 路由组装
pub mod app;

// 导出常用类型供外部使用
pub use config::AppConfig;
pub use error::AppError;
pub use shutdown::{ShutdownManager, ShutdownReason};
