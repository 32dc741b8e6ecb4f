#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use serde_json::Value;
use tower::ServiceExt;

use hiface_backend::{
    app::build_router,
    config::ThemeConfig,
    error::CollaboratorError,
    features::{
        remote_config::StoreConfigSource,
        storage::{FileSigner, FileUrlResolver, TempFileUrl},
        theme::ThemeService,
    },
    state::AppState,
    store::{
        Document, DocumentStore, Filter, FindQuery, LookupJoin, SqliteDocumentStore, StoreReply,
    },
};

/// 存储 ID 中的旧前缀
pub const OLD_PREFIX: &str = "cloud://prod-1.7072-prod-1-1300";
/// 签发后链接的新前缀
pub const NEW_PREFIX: &str = "https://7072-prod-1-1300.tcb.qcloud.la";

pub fn file_id(rest: &str) -> String {
    format!("{OLD_PREFIX}/uploads/{rest}")
}

pub fn signed_url(rest: &str) -> String {
    format!("{NEW_PREFIX}/uploads/{rest}")
}

/// 把旧前缀换成新前缀的签发桩，记录调用次数
#[derive(Default)]
pub struct PrefixSwapSigner {
    calls: AtomicUsize,
    error: Option<CollaboratorError>,
}

impl PrefixSwapSigner {
    pub fn failing(error: CollaboratorError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            error: Some(error),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileSigner for PrefixSwapSigner {
    async fn temp_file_urls(
        &self,
        file_ids: &[String],
    ) -> Result<Vec<TempFileUrl>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(file_ids
            .iter()
            .map(|id| TempFileUrl {
                file_id: id.clone(),
                temp_file_url: id.replacen(OLD_PREFIX, NEW_PREFIX, 1),
            })
            .collect())
    }
}

/// 可按操作注入错误或失败标记的文档库包装
pub struct FaultyStore {
    pub inner: Arc<dyn DocumentStore>,
    pub get_error: Option<CollaboratorError>,
    pub count_error: Option<CollaboratorError>,
    pub find_error: Option<CollaboratorError>,
    pub lookup_error: Option<CollaboratorError>,
    /// get 正常返回数据，但 ok = false
    pub get_not_ok: bool,
    /// lookup 正常返回数据，但 ok = false
    pub lookup_not_ok: bool,
    lookup_calls: AtomicUsize,
}

impl FaultyStore {
    pub fn wrap(inner: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner,
            get_error: None,
            count_error: None,
            find_error: None,
            lookup_error: None,
            get_not_ok: false,
            lookup_not_ok: false,
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn ping(&self) -> Result<(), CollaboratorError> {
        self.inner.ping().await
    }

    async fn get(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<StoreReply<Option<Document>>, CollaboratorError> {
        if let Some(err) = &self.get_error {
            return Err(err.clone());
        }
        let mut reply = self.inner.get(collection, id).await?;
        if self.get_not_ok {
            reply.ok = false;
        }
        Ok(reply)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, CollaboratorError> {
        match &self.count_error {
            Some(err) => Err(err.clone()),
            None => self.inner.count(collection, filter).await,
        }
    }

    async fn find(
        &self,
        collection: &str,
        query: &FindQuery,
    ) -> Result<StoreReply<Vec<Document>>, CollaboratorError> {
        match &self.find_error {
            Some(err) => Err(err.clone()),
            None => self.inner.find(collection, query).await,
        }
    }

    async fn lookup(&self, join: &LookupJoin) -> Result<StoreReply<Vec<Document>>, CollaboratorError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.lookup_error {
            return Err(err.clone());
        }
        let mut reply = self.inner.lookup(join).await?;
        if self.lookup_not_ok {
            reply.ok = false;
        }
        Ok(reply)
    }
}

pub async fn memory_store() -> SqliteDocumentStore {
    let store = SqliteDocumentStore::connect_in_memory()
        .await
        .expect("open in-memory sqlite");
    store.init_schema().await.expect("init schema");
    store
}

pub async fn seed(store: &SqliteDocumentStore, collection: &str, docs: Vec<Value>) {
    for doc in docs {
        store.insert(collection, doc).await.expect("seed document");
    }
}

pub fn build_app(
    store: Arc<dyn DocumentStore>,
    signer: Arc<PrefixSwapSigner>,
    settings: ThemeConfig,
) -> Router {
    let themes = ThemeService::new(
        store.clone(),
        FileUrlResolver::new(signer),
        Arc::new(StoreConfigSource::new(store.clone())),
        settings,
    );
    build_router(
        AppState {
            store,
            themes: Arc::new(themes),
        },
        "/api/v1",
    )
}

pub async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.expect("send request");
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request");
    send(app, req).await
}

pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    send(app, req).await
}
