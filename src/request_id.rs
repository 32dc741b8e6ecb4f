use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// 请求头名称
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

tokio::task_local! {
    /// 当前请求的追踪 ID，失败响应体中的 requestId 取自这里。
    static CURRENT_REQUEST_ID: String;
}

/// 读取当前请求的追踪 ID（不在请求上下文中时返回 None）。
pub fn current_request_id() -> Option<String> {
    CURRENT_REQUEST_ID.try_with(Clone::clone).ok()
}

fn accept_client_id(v: &str) -> bool {
    (1..=MAX_REQUEST_ID_LEN).contains(&v.len())
        && v.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn request_id_for(req: &Request) -> String {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| accept_client_id(v))
        .map(str::to_string)
        .unwrap_or_else(|| format!("req_{}", Uuid::new_v4().simple()))
}

/// request_id 中间件：透传合法的客户端 `X-Request-Id`，否则生成新的；
/// 在请求上下文中可见，并回写到响应头。
pub async fn request_id_middleware(req: Request, next: Next) -> Response {
    let request_id = request_id_for(&req);

    let mut res = CURRENT_REQUEST_ID
        .scope(request_id.clone(), next.run(req))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}
