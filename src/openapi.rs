use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// Swagger UI 的 Servers：业务接口挂在 `config.api.prefix` 下，`/health` 不带前缀。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认 /api/v1）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("/api/v1")
                    .description(Some("对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）")),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::theme::handler::post_theme_get,
        crate::features::theme::handler::get_theme,
        crate::features::theme::handler::post_theme_list,
    ),
    components(schemas(
        crate::error::FailureBody,
        crate::features::health::handler::HealthResponse,
        crate::features::theme::models::GetThemeRequest,
        crate::features::theme::models::ListThemesRequest,
        crate::features::theme::models::OrderByParam,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "Theme",
            description = "主题内容：详情（含形状分类）与公开列表，文件 ID 统一签发为临时访问链接。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "HiFace Backend API",
        version = env!("CARGO_PKG_VERSION"),
        description = "主题内容读接口（Axum + utoipa）。除 /health 外，业务接口挂载在 `config.api.prefix`（默认 /api/v1）下，OpenAPI 的 paths 不包含该前缀。成功响应统一为 `{code: 0, message: \"ok\", data}`，失败为 `{code, message, requestId}`。"
    )
)]
pub struct ApiDoc;
