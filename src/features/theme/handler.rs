use axum::{
    Router,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::Json,
    routing::{get, post},
};

use crate::error::{AppError, CollaboratorPolicy, Failure, codes};
use crate::state::AppState;

use super::models::{ApiResponse, GetThemeRequest, ListThemesRequest, ThemePage, ThemeView};
use super::service::TARGET;

/// 详情接口：结构化错误透传，其余错误使用 -20000
const GET_POLICY: CollaboratorPolicy = CollaboratorPolicy::Forward {
    fallback_code: codes::THEME_GET_FAILED,
};

/// 列表接口：协作方错误一律折算为 -10001
const LIST_POLICY: CollaboratorPolicy = CollaboratorPolicy::Mask {
    code: codes::LIST_FAILED,
    message: "数据不存在",
};

/// 在请求边界记录原始错误并折算为对外响应
fn fail(op: &str, err: AppError, policy: &CollaboratorPolicy) -> Failure {
    match &err {
        AppError::Collaborator(e) => tracing::error!(target: TARGET, "{op} failed: {e}"),
        other => tracing::info!(target: TARGET, "{op} rejected: {other}"),
    }
    err.into_failure(policy)
}

async fn run_get(state: &AppState, req: GetThemeRequest) -> Result<Json<ApiResponse<ThemeView>>, Failure> {
    state
        .themes
        .get(req)
        .await
        .map(|theme| Json(ApiResponse::ok(theme)))
        .map_err(|e| fail("theme.get", e, &GET_POLICY))
}

#[utoipa::path(
    post,
    path = "/theme/get",
    summary = "主题详情",
    description = "返回主题文档及封面/分享图的临时访问链接。未传 themeId 时读取默认配置；`needShapes` 为真时附带形状分类与形状（含改写后的图片链接）。",
    request_body = GetThemeRequest,
    responses(
        (status = 200, description = "成功：{ code: 0, message: \"ok\", data: Theme }", body = serde_json::Value),
        (status = 404, description = "主题不存在（-20002）", body = crate::error::FailureBody),
        (status = 422, description = "未设置 themeID（-20001）或请求体无效", body = crate::error::FailureBody),
        (status = 502, description = "上游失败：结构化错误透传 errCode，其余为 -20000", body = crate::error::FailureBody),
        (status = 504, description = "上游超时（-20000）", body = crate::error::FailureBody)
    ),
    tag = "Theme"
)]
pub async fn post_theme_get(
    State(state): State<AppState>,
    payload: Result<Json<GetThemeRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ThemeView>>, Failure> {
    let Json(req) = payload.map_err(|rej| {
        fail(
            "theme.get",
            AppError::precondition(codes::THEME_GET_FAILED, rej.body_text()),
            &GET_POLICY,
        )
    })?;
    run_get(&state, req).await
}

#[utoipa::path(
    get,
    path = "/theme",
    summary = "主题详情（query 形式）",
    description = "与 `POST /theme/get` 语义一致，参数通过 query string 传入。",
    params(GetThemeRequest),
    responses(
        (status = 200, description = "成功：{ code: 0, message: \"ok\", data: Theme }", body = serde_json::Value),
        (status = 404, description = "主题不存在（-20002）", body = crate::error::FailureBody),
        (status = 422, description = "未设置 themeID（-20001）或参数无效", body = crate::error::FailureBody),
        (status = 502, description = "上游失败", body = crate::error::FailureBody)
    ),
    tag = "Theme"
)]
pub async fn get_theme(
    State(state): State<AppState>,
    params: Result<Query<GetThemeRequest>, QueryRejection>,
) -> Result<Json<ApiResponse<ThemeView>>, Failure> {
    let Query(req) = params.map_err(|rej| {
        fail(
            "theme.get",
            AppError::precondition(codes::THEME_GET_FAILED, rej.body_text()),
            &GET_POLICY,
        )
    })?;
    run_get(&state, req).await
}

#[utoipa::path(
    post,
    path = "/theme/list",
    summary = "公开主题分页列表",
    description = "按 `isPublic = true` 与调用方条件分页查询主题，封面/分享图链接按页统一签发改写。页码超出总页数时返回空页（成功）；当前页无数据返回 -10000。",
    request_body = ListThemesRequest,
    responses(
        (status = 200, description = "成功：{ code: 0, message: \"ok\", data: { items, nextPage, pageNo, total } }", body = serde_json::Value),
        (status = 404, description = "当前页没有数据（-10000）", body = crate::error::FailureBody),
        (status = 422, description = "条件或排序参数无效（-10001）", body = crate::error::FailureBody),
        (status = 502, description = "查询失败（-10001）", body = crate::error::FailureBody)
    ),
    tag = "Theme"
)]
pub async fn post_theme_list(
    State(state): State<AppState>,
    payload: Result<Json<ListThemesRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ThemePage>>, Failure> {
    let Json(req) = payload.map_err(|rej| {
        fail(
            "theme.list",
            AppError::precondition(codes::LIST_FAILED, rej.body_text()),
            &LIST_POLICY,
        )
    })?;
    state
        .themes
        .list(req)
        .await
        .map(|page| Json(ApiResponse::ok(page)))
        .map_err(|e| fail("theme.list", e, &LIST_POLICY))
}

pub fn create_theme_router() -> Router<AppState> {
    Router::new()
        .route("/theme", get(get_theme))
        .route("/theme/get", post(post_theme_get))
        .route("/theme/list", post(post_theme_list))
}
