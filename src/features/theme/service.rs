use std::sync::Arc;

use crate::config::ThemeConfig;
use crate::features::remote_config::ConfigSource;
use crate::features::storage::FileUrlResolver;
use crate::store::DocumentStore;

pub(crate) const TARGET: &str = "hiface_backend::theme";

/// 主题读接口的业务编排：查询文档库、签发并改写文件链接。
///
/// 所有协作方都以 trait object 注入；服务本身无可变状态，可在请求间共享。
#[derive(Clone)]
pub struct ThemeService {
    pub(crate) store: Arc<dyn DocumentStore>,
    pub(crate) resolver: FileUrlResolver,
    pub(crate) config_source: Arc<dyn ConfigSource>,
    pub(crate) settings: ThemeConfig,
}

impl ThemeService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        resolver: FileUrlResolver,
        config_source: Arc<dyn ConfigSource>,
        settings: ThemeConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            config_source,
            settings,
        }
    }
}
