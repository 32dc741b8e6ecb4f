use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;

use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// 服务状态：healthy / degraded
    #[schema(example = "healthy")]
    pub status: String,
    /// 服务名称
    #[schema(example = "hiface-backend")]
    pub service: String,
    /// 当前版本（Cargo package version）
    #[schema(example = "0.1.0")]
    pub version: String,
    /// 文档库连通性：ok / unavailable
    #[schema(example = "ok")]
    pub database: String,
}

#[utoipa::path(
    get,
    path = "/health",
    summary = "健康检查",
    description = "用于探活的健康检查端点，返回服务状态、版本与文档库连通性。",
    responses(
        (status = 200, description = "服务健康", body = HealthResponse),
        (status = 503, description = "文档库不可用", body = HealthResponse)
    ),
    tag = "Health"
)]
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status, database) = match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "healthy", "ok"),
        Err(e) => {
            tracing::warn!("health check: document store unavailable: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            service: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: database.to_string(),
        }),
    )
}
