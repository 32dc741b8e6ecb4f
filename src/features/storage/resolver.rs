use std::sync::Arc;

use crate::error::CollaboratorError;

use super::rewrite::PrefixMapping;
use super::signer::FileSigner;

const TARGET: &str = "hiface_backend::storage";

/// 文件 ID → 临时访问链接
#[derive(Clone)]
pub struct FileUrlResolver {
    signer: Arc<dyn FileSigner>,
}

impl FileUrlResolver {
    pub fn new(signer: Arc<dyn FileSigner>) -> Self {
        Self { signer }
    }

    /// 空 ID 直接返回空串，不发起签发请求；签发失败原样向上传播。
    pub async fn resolve(&self, file_id: &str) -> Result<String, CollaboratorError> {
        if file_id.is_empty() {
            return Ok(String::new());
        }
        let urls = self.signer.temp_file_urls(&[file_id.to_string()]).await?;
        urls.into_iter()
            .next()
            .map(|u| u.temp_file_url)
            .ok_or_else(|| CollaboratorError::InvalidResponse(format!("签发结果为空: {file_id}")))
    }

    /// 用一次签发推导整批 ID 的前缀映射；没有代表 ID 时返回恒等映射。
    pub async fn mapping_for(
        &self,
        representative: Option<&str>,
    ) -> Result<PrefixMapping, CollaboratorError> {
        let Some(sample) = representative else {
            return Ok(PrefixMapping::identity());
        };
        let url = self.resolve(sample).await?;
        let mapping = PrefixMapping::derive(sample, &url);
        tracing::debug!(
            target: TARGET,
            "prefix mapping: {} -> {}",
            mapping.old_prefix(),
            mapping.new_prefix()
        );
        Ok(mapping)
    }
}
