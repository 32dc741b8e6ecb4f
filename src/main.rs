use std::sync::Arc;

use hiface_backend::app::build_router;
use hiface_backend::features::remote_config::StoreConfigSource;
use hiface_backend::features::storage::{FileUrlResolver, build_signer};
use hiface_backend::features::theme::ThemeService;
use hiface_backend::state::AppState;
use hiface_backend::store::{DocumentStore, SqliteDocumentStore};
use hiface_backend::{AppConfig, ShutdownManager};

#[tokio::main]
async fn main() {
    // 配置先于日志初始化（日志级别默认取自配置，RUST_LOG 优先），加载本身不打日志
    let config_result = AppConfig::init_global();
    let default_level = match &config_result {
        Ok(()) => AppConfig::global().logging.level.clone(),
        Err(_) => "hiface_backend=info,tower_http=info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .init();

    if let Err(e) = config_result {
        tracing::error!("Config init failed: {}", e);
        std::process::exit(1);
    }
    let config = AppConfig::global();
    tracing::info!("配置文件: {:?}", AppConfig::config_path());
    tracing::debug!(
        "配置加载完成: signer.kind = {:?}, access_token = {}",
        config.signer.kind,
        if config.signer.access_token.is_some() {
            "set"
        } else {
            "unset"
        }
    );

    let shutdown_manager = ShutdownManager::new();
    if let Err(e) = shutdown_manager.start_signal_handler() {
        tracing::error!("信号处理器启动失败: {}", e);
        std::process::exit(1);
    }

    // 文档库
    let sqlite =
        match SqliteDocumentStore::connect_sqlite(&config.database.sqlite_path, config.database.wal)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("打开文档库失败 {}: {}", config.database.sqlite_path, e);
                std::process::exit(1);
            }
        };
    if let Err(e) = sqlite.init_schema().await {
        tracing::error!("初始化文档库表结构失败: {}", e);
        std::process::exit(1);
    }
    let store: Arc<dyn DocumentStore> = Arc::new(sqlite);

    // 云存储签发
    let signer = match build_signer(&config.signer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("签发客户端初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let themes = ThemeService::new(
        store.clone(),
        FileUrlResolver::new(signer),
        Arc::new(StoreConfigSource::new(store.clone())),
        config.theme.clone(),
    );
    let app_state = AppState {
        store,
        themes: Arc::new(themes),
    };
    let app = build_router(app_state, &config.api.prefix);

    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Theme API: http://{}{}/theme", addr, config.api.prefix);
    tracing::info!(
        "Signer: {:?}, database: {}",
        config.signer.kind,
        config.database.sqlite_path
    );

    let shutdown_timeout = config.shutdown.timeout_duration();
    let shutdown_signal = {
        let manager = shutdown_manager.clone();
        async move {
            let reason = manager.wait_for_shutdown().await;
            tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
        }
    };

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);
    let mut server = tokio::spawn(async move { server.await });

    let early_exit = tokio::select! {
        res = &mut server => Some(res),
        _ = shutdown_manager.wait_for_shutdown() => None,
    };
    // 收到退出信号后，最多再等待 shutdown.timeout_secs 让在途请求完成
    let finished = match early_exit {
        Some(res) => Ok(res),
        None => tokio::time::timeout(shutdown_timeout, server).await,
    };
    match finished {
        Ok(Ok(Ok(()))) => tracing::info!("服务器已优雅关闭"),
        Ok(Ok(Err(e))) => {
            tracing::error!("服务器运行错误: {}", e);
            std::process::exit(1);
        }
        Ok(Err(e)) => {
            tracing::error!("服务器任务异常退出: {}", e);
            std::process::exit(1);
        }
        Err(_) => {
            tracing::warn!(
                "优雅退出超时（{}秒），强制退出",
                config.shutdown.timeout_secs
            );
        }
    }
}
