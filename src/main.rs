//! TokenCore 主入口
//! 代币 schema 映射与 CRUD 编排服务

use std::sync::Arc;

use anyhow::{Context, Result};
use tokencore::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{db, logging},
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的文件存在时优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // 3. 初始化日志
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        strict_validation = config.crud.strict_validation,
        "Starting TokenCore"
    );

    // 4. 连接数据库（允许降级启动时改为懒连接）
    let pool = match db::init_pool(&config.database, false).await {
        Ok(pool) => {
            tracing::info!("Database connected");
            pool
        }
        Err(e) if config.server.allow_degraded_start => {
            tracing::warn!(error = %e, "Database unavailable, starting in degraded mode");
            db::init_pool(&config.database, true).await?
        }
        Err(e) => return Err(e).context("Failed to connect to database"),
    };

    // 5. 应用状态与路由
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(pool, config.clone()));
    let app = api::create_router(state);

    // 6. 启动服务器
    let bind_addr = config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
