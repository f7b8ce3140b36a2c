use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use menuq_backend::{
    AppState,
    clock::SystemClock,
    config::Config,
    database::{MemoryStore, PgStore, Repositories},
    router::create_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env();

    #[cfg(debug_assertions)]
    tracing::info!("Running in debug mode with CORS enabled");

    #[cfg(not(debug_assertions))]
    tracing::info!("Running in production mode with CORS disabled");

    let repos = match &config.database_url {
        Some(url) => {
            // 设置数据库连接池
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .after_connect(|conn, _meta| {
                    Box::pin(async move {
                        conn.execute("SET application_name = 'menuq_backend';")
                            .await?;
                        Ok(())
                    })
                })
                .connect(url)
                .await?;
            tracing::info!("Connected to Postgres");
            Repositories::from_store(Arc::new(PgStore::new(Arc::new(pool))))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            Repositories::from_store(Arc::new(MemoryStore::new()))
        }
    };

    let state = AppState::new(config, repos, Arc::new(SystemClock));
    let addr = SocketAddr::new(
        state.config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        state.config.server_port,
    );
    let app = create_router(state);

    // 启动服务器
    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
