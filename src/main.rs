use std::sync::Arc;
use tariff_consolidator::{
    api::{self, AppState},
    create_pool, run_migrations, AppConfig, ConsolidationEngine, IngestService, PgRateStore,
};
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    // 创建数据库连接池并建表
    let pool = create_pool(&config.database.url, config.database.max_connections).await?;
    info!("Database pool created");
    run_migrations(&pool).await?;
    info!("Database migrations applied");

    // 同一个存储实例按职责分别交给各服务
    let store = Arc::new(PgRateStore::new(pool));
    let state = AppState {
        ingest: Arc::new(IngestService::new(
            store.clone(),
            config.ingest.default_currency.clone(),
        )),
        engine: Arc::new(ConsolidationEngine::new(store.clone())),
        rates: store.clone(),
        consolidated: store,
        max_upload_bytes: config.ingest.max_upload_bytes,
    };

    let app = api::router(state).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/supplier-rates/import          - upload supplier rate sheet");
    info!("  POST /api/consolidated-rates/generate    - rebuild consolidated routes");
    info!("  GET  /api/consolidated-rates/export      - consolidate + CSV export");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
