use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pinboard_bridge::{
    config::Config,
    routes,
    services::{HttpTransport, RateLimiter},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    dotenv::dotenv().ok();
    let config = Config::from_env()?;

    // 初始化日志
    init_tracing(&config);

    info!(
        "Starting pinboard-bridge service ({} environment)...",
        config.environment
    );
    if !config.is_production() {
        debug!("Loaded configuration: {:?}", config);
    }

    let transport = Arc::new(HttpTransport::new(
        &config.pinboard_api_url,
        &config.pinboard_token,
        config.request_timeout(),
    )?);
    let limiter = Arc::new(RateLimiter::new(config.min_interval()));
    let app_state = Arc::new(AppState::new(config.clone(), transport, limiter)?);

    // 启动时检查凭据和连通性
    match app_state.client.last_update().await {
        Ok(last_update) => info!("Connected to Pinboard, last update at {}", last_update),
        Err(e) => {
            error!("Failed to connect to Pinboard: {}", e);
            return Err(anyhow::anyhow!("Pinboard connection check failed"));
        }
    }

    // 启动后台任务
    if app_state.cache.is_enabled() {
        app_state
            .cache
            .spawn_cleanup(config.cache_ttl().max(Duration::from_secs(60)));
    }

    let app = routes::app(app_state);

    // 启动主服务器
    let addr = format!("{}:{}", config.server_host, config.server_port);
    info!("Starting server on http://{}", addr);

    axum::Server::bind(&addr.parse()?)
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(&config.log_level));

    if config.json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
