use std::sync::Arc;

use crate::features::theme::ThemeService;
use crate::store::DocumentStore;

/// 聚合的应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 文档库（健康检查直接使用）
    pub store: Arc<dyn DocumentStore>,
    pub themes: Arc<ThemeService>,
}
