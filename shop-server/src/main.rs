use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socketioxide::SocketIo;
use sqlx::postgres::PgPoolOptions;

use shop_server::auth::rate_limit::RateLimiterCleanup;
use shop_server::cache::CachePurge;
use shop_server::notifications::sweep::NotificationSweep;
use shop_server::realtime::{self, RealtimeHub};
use shop_server::scheduler::{IntervalScheduler, MIN_PERIOD, Scheduler};
use shop_server::tasks::BackgroundTasks;
use shop_server::{AppState, Config, api, init_logger_with_file};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const RATE_LIMIT_CLEANUP_EVERY: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_logger_with_file(&config.log_level, config.log_json, config.log_dir.as_deref())?;

    tracing::info!("Starting shop-server (env: {})", config.environment);

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let (socket_layer, io) = SocketIo::new_layer();
    let hub = RealtimeHub::new(io.clone());
    let sweep_every = Duration::from_secs(config.notification_sweep_secs.max(1));
    let http_port = config.http_port;

    let state = AppState::new(pool, config, hub);
    realtime::register(&io, state.clone());

    let mut tasks = BackgroundTasks::new();
    {
        let mut scheduler = IntervalScheduler::new(&mut tasks);
        scheduler.schedule(
            Arc::new(NotificationSweep::new(state.pool.clone(), state.realtime.clone())),
            sweep_every,
        );
        scheduler.schedule(
            Arc::new(CachePurge(state.cache.clone())),
            state.cache.default_ttl().max(MIN_PERIOD),
        );
        scheduler.schedule(
            Arc::new(RateLimiterCleanup(state.rate_limiter.clone())),
            RATE_LIMIT_CLEANUP_EVERY,
        );
    }
    tasks.log_summary();

    let app = api::build_app(state).layer(socket_layer);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("shop-server listening on {addr}");

    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await;

    tasks.shutdown().await;

    if let Err(e) = served {
        tracing::error!("HTTP server error: {e}");
        return Err(e.into());
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C signal, shutting down gracefully..."),
        _ = terminate => tracing::info!("Received SIGTERM signal, shutting down gracefully..."),
    }
}
