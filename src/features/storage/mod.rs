//! 云存储文件 ID 的链接签发与前缀改写。

pub mod resolver;
pub mod rewrite;
pub mod signer;

use std::sync::Arc;

use crate::config::{SignerConfig, SignerKind};
use crate::error::CollaboratorError;

pub use resolver::FileUrlResolver;
pub use rewrite::{PrefixMapping, UPLOADS_MARKER, representative};
pub use signer::{FileSigner, HttpFileSigner, StaticFileSigner, TempFileUrl};

/// 按配置构建签发协作方
pub fn build_signer(cfg: &SignerConfig) -> Result<Arc<dyn FileSigner>, CollaboratorError> {
    match cfg.kind {
        SignerKind::Http => Ok(Arc::new(HttpFileSigner::new(cfg)?)),
        SignerKind::Static => {
            let base = cfg.static_base_url.as_deref().unwrap_or_default();
            if base.is_empty() {
                return Err(CollaboratorError::InvalidResponse(
                    "signer.kind = static 时必须配置 signer.static_base_url".into(),
                ));
            }
            Ok(Arc::new(StaticFileSigner::new(base)))
        }
    }
}
