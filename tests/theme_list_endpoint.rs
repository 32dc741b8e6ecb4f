mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{
    FaultyStore, PrefixSwapSigner, build_app, file_id, memory_store, post_json, seed, signed_url,
};
use hiface_backend::{config::ThemeConfig, error::CollaboratorError, store::SqliteDocumentStore};

const THEMES: &str = "hiface-themes";
const LIST: &str = "/api/v1/theme/list";

fn theme(n: u32, public: bool) -> Value {
    let tag = if n % 2 == 0 { "even" } else { "odd" };
    json!({
        "_id": format!("t-{n:02}"),
        "order": n,
        "isPublic": public,
        "tag": tag,
        "coverImage": file_id(&format!("covers/{n}.png")),
        "shareImage": file_id(&format!("share/{n}.png"))
    })
}

async fn store_with_public_themes(count: u32) -> SqliteDocumentStore {
    let store = memory_store().await;
    seed(&store, THEMES, (1..=count).map(|n| theme(n, true)).collect()).await;
    store
}

fn ids(body: &Value) -> Vec<&str> {
    body["data"]["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["_id"].as_str()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn page_beyond_total_returns_empty_page() {
    let store = store_with_public_themes(25).await;
    let signer = Arc::new(PrefixSwapSigner::default());
    let app = build_app(Arc::new(store), signer.clone(), ThemeConfig::default());

    let (status, body) = post_json(app, LIST, json!({"pageNo": 4, "pageSize": 10})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["data"],
        json!({"items": [], "nextPage": false, "pageNo": 4, "total": 25})
    );
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn first_page_is_ordered_and_reports_next_page() {
    let store = store_with_public_themes(25).await;
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    let (status, body) = post_json(app, LIST, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextPage"], true);
    assert_eq!(body["data"]["pageNo"], 1);
    assert_eq!(body["data"]["total"], 25);
    let got = ids(&body);
    assert_eq!(got.len(), 10);
    assert_eq!(got[0], "t-01");
    assert_eq!(got[9], "t-10");
}

#[tokio::test]
async fn last_page_has_no_next_page() {
    let store = store_with_public_themes(25).await;
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    let (status, body) = post_json(app, LIST, json!({"pageNo": 3, "pageSize": 10})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nextPage"], false);
    assert_eq!(ids(&body), vec!["t-21", "t-22", "t-23", "t-24", "t-25"]);
}

#[tokio::test]
async fn page_urls_share_one_signing_call_and_keep_suffix() {
    let store = store_with_public_themes(2).await;
    let signer = Arc::new(PrefixSwapSigner::default());
    let app = build_app(Arc::new(store), signer.clone(), ThemeConfig::default());

    let (status, body) = post_json(app, LIST, json!({"pageNo": 1, "pageSize": 10})).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"]["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    for (item, n) in items.iter().zip(1..) {
        assert_eq!(item["coverImageUrl"], signed_url(&format!("covers/{n}.png")));
        assert_eq!(item["shareImageUrl"], signed_url(&format!("share/{n}.png")));
    }
    assert_eq!(signer.calls(), 1);
}

#[tokio::test]
async fn explicit_order_defaults_to_descending() {
    let store = store_with_public_themes(5).await;
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    let (status, body) = post_json(
        app,
        LIST,
        json!({"pageSize": 3, "orderBy": {"field": "order"}}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["t-05", "t-04", "t-03"]);
}

#[tokio::test]
async fn condition_cannot_override_public_flag() {
    let store = memory_store().await;
    seed(&store, THEMES, vec![theme(1, true), theme(2, false), theme(3, false)]).await;
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    let (status, body) = post_json(app, LIST, json!({"condition": {"isPublic": false}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec!["t-01"]);
    // 历史行为：total 为整表计数
    assert_eq!(body["data"]["total"], 3);
}

#[tokio::test]
async fn count_can_follow_the_filter() {
    let store = memory_store().await;
    seed(
        &store,
        THEMES,
        vec![theme(1, true), theme(2, true), theme(3, true), theme(4, false)],
    )
    .await;
    let settings = ThemeConfig {
        count_respects_condition: true,
        ..ThemeConfig::default()
    };
    let app = build_app(Arc::new(store), Arc::new(PrefixSwapSigner::default()), settings);

    let (status, body) = post_json(app, LIST, json!({"condition": {"tag": "odd"}})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(ids(&body), vec!["t-01", "t-03"]);
}

#[tokio::test]
async fn filtered_empty_page_reports_no_data() {
    let store = store_with_public_themes(3).await;
    let signer = Arc::new(PrefixSwapSigner::default());
    let app = build_app(Arc::new(store), signer.clone(), ThemeConfig::default());

    let (status, body) = post_json(app, LIST, json!({"condition": {"tag": "none"}})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], -10000);
    assert_eq!(signer.calls(), 0);
}

#[tokio::test]
async fn store_failure_is_masked() {
    let inner = store_with_public_themes(3).await;
    let mut store = FaultyStore::wrap(Arc::new(inner));
    store.find_error = Some(CollaboratorError::Structured {
        err_code: -502001,
        err_msg: "database request fail".into(),
    });
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    let (status, body) = post_json(app, LIST, json!({})).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], -10001);
    assert_eq!(body["message"], "数据不存在");
}

#[tokio::test]
async fn invalid_parameters_are_rejected() {
    let store = store_with_public_themes(3).await;
    let app = build_app(
        Arc::new(store),
        Arc::new(PrefixSwapSigner::default()),
        ThemeConfig::default(),
    );

    for payload in [
        json!({"orderBy": {"field": "order", "orderType": "sideways"}}),
        json!({"orderBy": {"field": "order; DROP TABLE documents"}}),
        json!({"condition": {"tag": ["odd"]}}),
        json!({"condition": {"bad key": 1}}),
    ] {
        let (status, body) = post_json(app.clone(), LIST, payload.clone()).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{payload}");
        assert_eq!(body["code"], -10001, "{payload}");
    }
}
