use axum::{Router, routing::get};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::features::{health::health_check, theme::create_theme_router};
use crate::openapi::ApiDoc;
use crate::request_id::request_id_middleware;
use crate::state::AppState;

/// 组装完整路由：业务接口挂在 `api_prefix` 下，`/health` 与文档页不带前缀。
pub fn build_router(state: AppState, api_prefix: &str) -> Router {
    let api_router = Router::<AppState>::new().merge(create_theme_router());

    let prefix = api_prefix.trim_end_matches('/');
    let root = Router::<AppState>::new().route("/health", get(health_check));
    let root = if prefix.is_empty() {
        root.merge(api_router)
    } else {
        root.nest(prefix, api_router)
    };

    root.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        // 最外层：让 TraceLayer 与 handler 都处在同一个 request_id 上下文中
        .layer(axum::middleware::from_fn(request_id_middleware))
}
