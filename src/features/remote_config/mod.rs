//! 运行期配置查询（`configName` → `data`）。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CollaboratorError;
use crate::store::{DocumentStore, Filter, FindQuery};

/// 配置文档所在集合
pub const CONFIG_COLLECTION: &str = "hiface-configs";

/// 配置查询协作方
#[async_trait]
pub trait ConfigSource: Send + Sync {
    /// 未找到该配置时返回 `None`
    async fn get(&self, config_name: &str) -> Result<Option<Value>, CollaboratorError>;
}

/// 从文档库读取配置：`{ configName, data }`
#[derive(Clone)]
pub struct StoreConfigSource {
    store: Arc<dyn DocumentStore>,
}

impl StoreConfigSource {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConfigSource for StoreConfigSource {
    async fn get(&self, config_name: &str) -> Result<Option<Value>, CollaboratorError> {
        let filter = Filter::new()
            .eq("configName", config_name)
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))?;
        let query = FindQuery {
            filter,
            limit: 1,
            ..FindQuery::default()
        };
        let reply = self.store.find(CONFIG_COLLECTION, &query).await?;
        Ok(reply
            .data
            .into_iter()
            .next()
            .and_then(|mut doc| doc.remove("data")))
    }
}
