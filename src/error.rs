use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// 对外暴露的业务错误码
pub mod codes {
    /// 未传 themeId 且配置中也没有默认主题
    pub const THEME_ID_UNSET: i64 = -20001;
    /// 主题详情：非结构化错误的兜底码
    pub const THEME_GET_FAILED: i64 = -20000;
    /// 主题不存在
    pub const THEME_NOT_FOUND: i64 = -20002;
    /// 列表：当前页没有数据
    pub const LIST_EMPTY: i64 = -10000;
    /// 列表：查询失败或参数无效
    pub const LIST_FAILED: i64 = -10001;
}

/// 外部协作方（文档库 / 云存储 / 配置）返回的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// 协作方返回的结构化错误（自带 errCode / errMsg）
    #[error("{err_msg} (errCode={err_code})")]
    Structured { err_code: i64, err_msg: String },

    /// 数据库错误
    #[error("数据库错误: {0}")]
    Database(String),

    /// 网络请求错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 上游请求超时
    #[error("请求超时: {0}")]
    Timeout(String),

    /// 上游响应不符合约定
    #[error("无效的响应: {0}")]
    InvalidResponse(String),

    /// JSON 解析错误
    #[error("JSON 解析错误: {0}")]
    Json(String),
}

/// 应用统一错误类型
///
/// 按错误性质分为三类，传播策略在请求边界（handler）上显式决定：
/// - `Precondition`：参数/前置条件不满足，使用固定错误码
/// - `Collaborator`：外部依赖失败，由 [`CollaboratorPolicy`] 决定对外的错误码
/// - `Empty`：查询结果为空，属于业务层面的失败
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Precondition { code: i64, message: String },

    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("{message}")]
    Empty { code: i64, message: String },
}

impl AppError {
    pub fn precondition(code: i64, message: impl Into<String>) -> Self {
        AppError::Precondition {
            code,
            message: message.into(),
        }
    }

    pub fn empty(code: i64, message: impl Into<String>) -> Self {
        AppError::Empty {
            code,
            message: message.into(),
        }
    }

    /// 在请求边界把错误折算为对外的失败响应。
    pub fn into_failure(self, policy: &CollaboratorPolicy) -> Failure {
        match self {
            AppError::Precondition { code, message } => {
                Failure::new(StatusCode::UNPROCESSABLE_ENTITY, code, message)
            }
            AppError::Empty { code, message } => Failure::new(StatusCode::NOT_FOUND, code, message),
            AppError::Collaborator(err) => {
                let status = match err {
                    CollaboratorError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                let (code, message) = policy.translate(&err);
                Failure::new(status, code, message)
            }
        }
    }
}

/// 外部依赖错误的对外折算策略（按接口区分）
#[derive(Debug, Clone)]
pub enum CollaboratorPolicy {
    /// 结构化错误透传自身 errCode/errMsg；其余错误使用兜底码，消息为错误文本
    Forward { fallback_code: i64 },
    /// 一律折算为固定错误码与消息
    Mask { code: i64, message: &'static str },
}

impl CollaboratorPolicy {
    fn translate(&self, err: &CollaboratorError) -> (i64, String) {
        match self {
            CollaboratorPolicy::Forward { fallback_code } => match err {
                CollaboratorError::Structured { err_code, err_msg } => (*err_code, err_msg.clone()),
                other => (*fallback_code, other.to_string()),
            },
            CollaboratorPolicy::Mask { code, message } => (*code, (*message).to_string()),
        }
    }
}

/// 失败响应体：`{ code, message, requestId }`
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({"code": -20001, "message": "未成功设置themeID", "requestId": "req_1f0c"}))]
pub struct FailureBody {
    /// 业务错误码（负数）
    pub code: i64,
    /// 人类可读的错误信息
    pub message: String,
    /// 请求追踪 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// 已折算好的失败响应
#[derive(Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub code: i64,
    pub message: String,
}

impl Failure {
    pub fn new(status: StatusCode, code: i64, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let body = FailureBody {
            code: self.code,
            message: self.message,
            request_id: crate::request_id::current_request_id(),
        };
        let mut res = Json(body).into_response();
        *res.status_mut() = self.status;
        res
    }
}

// =============== Error conversions for common external errors ===============

impl From<sqlx::Error> for CollaboratorError {
    fn from(err: sqlx::Error) -> Self {
        CollaboratorError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CollaboratorError::Timeout(err.to_string())
        } else {
            CollaboratorError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        CollaboratorError::Json(err.to_string())
    }
}
