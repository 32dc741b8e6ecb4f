use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SignerConfig;
use crate::error::CollaboratorError;

use super::rewrite::UPLOADS_MARKER;

/// 一条签发结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempFileUrl {
    pub file_id: String,
    pub temp_file_url: String,
}

/// 云存储签发协作方：用文件 ID 换取带时效的访问链接。
#[async_trait]
pub trait FileSigner: Send + Sync {
    /// 返回顺序与入参一致
    async fn temp_file_urls(
        &self,
        file_ids: &[String],
    ) -> Result<Vec<TempFileUrl>, CollaboratorError>;
}

#[derive(Serialize)]
struct BatchDownloadRequest<'a> {
    env: &'a str,
    file_list: Vec<BatchDownloadFile<'a>>,
}

#[derive(Serialize)]
struct BatchDownloadFile<'a> {
    fileid: &'a str,
    max_age: u64,
}

#[derive(Deserialize)]
struct BatchDownloadResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    #[serde(default)]
    file_list: Vec<BatchDownloadItem>,
}

#[derive(Deserialize)]
struct BatchDownloadItem {
    #[serde(default)]
    fileid: String,
    #[serde(default)]
    download_url: String,
    #[serde(default)]
    status: i64,
    #[serde(default)]
    errmsg: String,
}

/// 通过云开发 HTTP API（batchdownloadfile）签发临时链接。
#[derive(Clone)]
pub struct HttpFileSigner {
    client: reqwest::Client,
    endpoint: String,
    env: String,
    access_token: Option<String>,
    max_age_secs: u64,
}

impl HttpFileSigner {
    pub fn new(cfg: &SignerConfig) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout_duration())
            .build()
            .map_err(|e| CollaboratorError::Network(format!("初始化 HTTP Client 失败: {e}")))?;
        if cfg.access_token.is_none() {
            tracing::warn!(target: "hiface_backend::storage", "signer.access_token 未配置，签发请求可能被拒绝");
        }
        Ok(Self {
            client,
            endpoint: cfg.endpoint.clone(),
            env: cfg.env.clone(),
            access_token: cfg.access_token.clone(),
            max_age_secs: cfg.max_age_secs,
        })
    }
}

#[async_trait]
impl FileSigner for HttpFileSigner {
    async fn temp_file_urls(
        &self,
        file_ids: &[String],
    ) -> Result<Vec<TempFileUrl>, CollaboratorError> {
        let body = BatchDownloadRequest {
            env: &self.env,
            file_list: file_ids
                .iter()
                .map(|id| BatchDownloadFile {
                    fileid: id,
                    max_age: self.max_age_secs,
                })
                .collect(),
        };

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.access_token {
            req = req.query(&[("access_token", token)]);
        }
        let resp = req.send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorError::Network(format!(
                "batchdownloadfile 返回 HTTP {status}"
            )));
        }

        let parsed: BatchDownloadResponse = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::Json(format!("解析签发响应失败: {e}")))?;
        if parsed.errcode != 0 {
            return Err(CollaboratorError::Structured {
                err_code: parsed.errcode,
                err_msg: parsed.errmsg,
            });
        }

        parsed
            .file_list
            .into_iter()
            .map(|item| {
                if item.status != 0 {
                    return Err(CollaboratorError::Structured {
                        err_code: item.status,
                        err_msg: item.errmsg,
                    });
                }
                Ok(TempFileUrl {
                    file_id: item.fileid,
                    temp_file_url: item.download_url,
                })
            })
            .collect()
    }
}

/// 离线签发：把 `<prefix>/uploads/<rest>` 改写为 `<base_url>/uploads/<rest>`。
///
/// 不含 `/uploads/` 的 ID 原样返回。
#[derive(Debug, Clone)]
pub struct StaticFileSigner {
    base_url: String,
}

impl StaticFileSigner {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn sign(&self, file_id: &str) -> String {
        match file_id.split_once(UPLOADS_MARKER) {
            Some((_, rest)) => format!("{}{UPLOADS_MARKER}{rest}", self.base_url),
            None => file_id.to_string(),
        }
    }
}

#[async_trait]
impl FileSigner for StaticFileSigner {
    async fn temp_file_urls(
        &self,
        file_ids: &[String],
    ) -> Result<Vec<TempFileUrl>, CollaboratorError> {
        Ok(file_ids
            .iter()
            .map(|id| TempFileUrl {
                file_id: id.clone(),
                temp_file_url: self.sign(id),
            })
            .collect())
    }
}
