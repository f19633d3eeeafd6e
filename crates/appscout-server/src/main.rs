mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use appscout_judge::JudgeClient;
use appscout_pipeline::Orchestrator;
use appscout_store::StoreClient;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = appscout_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = appscout_db::PoolConfig::from_app_config(&config);
    let pool = appscout_db::connect_pool(&config.database_url, pool_config).await?;
    appscout_db::run_migrations(&pool).await?;

    let store = StoreClient::new(
        config.store_request_timeout_secs,
        &config.store_user_agent,
        config.store_max_retries,
        config.store_retry_backoff_base_secs,
    )?;

    let judge_api_key = config.judge_api_key.clone().unwrap_or_default();
    if judge_api_key.is_empty() {
        tracing::warn!("APPSCOUT_JUDGE_API_KEY not set; gate evaluations will be rejected");
    }
    let judge = JudgeClient::with_base_url(
        &judge_api_key,
        &config.judge_model,
        config.judge_max_attempts,
        config.judge_backoff_base_secs,
        config.judge_cooldown_secs,
        &config.judge_base_url,
    )?;

    let is_development = matches!(config.env, appscout_core::Environment::Development);
    let bind_addr = config.bind_addr;
    let run_cron = config.run_cron.clone();

    let orchestrator = Arc::new(Orchestrator::new(pool.clone(), store, judge, config));

    let _scheduler = scheduler::build_scheduler(Arc::clone(&orchestrator), run_cron.as_deref())
        .await?;

    let auth = AuthState::from_env(is_development)?;
    let app = build_app(AppState { pool, orchestrator }, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
