//! Command handlers for the CLI.
//!
//! Each handler loads config, connects the pool, and drives the same
//! orchestrator the server uses, so CLI runs and API runs behave
//! identically (including the mutual-exclusion run guard).

use appscout_core::AppConfig;
use appscout_judge::JudgeClient;
use appscout_pipeline::Orchestrator;
use appscout_store::StoreClient;
use sqlx::PgPool;

async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let pool_config = appscout_db::PoolConfig::from_app_config(config);
    let pool = appscout_db::connect_pool(&config.database_url, pool_config).await?;
    appscout_db::run_migrations(&pool).await?;
    Ok(pool)
}

fn build_orchestrator(pool: PgPool, config: AppConfig) -> anyhow::Result<Orchestrator> {
    let store = StoreClient::new(
        config.store_request_timeout_secs,
        &config.store_user_agent,
        config.store_max_retries,
        config.store_retry_backoff_base_secs,
    )?;

    let api_key = config
        .judge_api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("APPSCOUT_JUDGE_API_KEY is required for this command"))?;
    let judge = JudgeClient::with_base_url(
        &api_key,
        &config.judge_model,
        config.judge_max_attempts,
        config.judge_backoff_base_secs,
        config.judge_cooldown_secs,
        &config.judge_base_url,
    )?;

    Ok(Orchestrator::new(pool, store, judge, config))
}

/// Runs a discovery collection and waits for it to finish.
pub(crate) async fn run_collect(
    keywords: Vec<String>,
    countries: Vec<String>,
) -> anyhow::Result<()> {
    let config = appscout_core::load_app_config()?;
    let pool = connect(&config).await?;
    let orchestrator = build_orchestrator(pool, config)?;

    let keywords = (!keywords.is_empty()).then_some(keywords);
    let countries = (!countries.is_empty()).then_some(countries);

    let run = orchestrator
        .run_blocking("cli", keywords, countries)
        .await?;

    println!(
        "run {} finished with status '{}': {} candidates",
        run.public_id, run.status, run.candidates_found
    );
    if let Some(message) = run.error_message {
        println!("  error: {message}");
    }
    Ok(())
}

/// Collects (or prints the cached) deep analysis for one candidate.
pub(crate) async fn run_enrich(
    candidate_id: i64,
    country: Option<String>,
    refresh: bool,
) -> anyhow::Result<()> {
    let config = appscout_core::load_app_config()?;
    let pool = connect(&config).await?;
    let orchestrator = build_orchestrator(pool, config)?;

    let report = orchestrator
        .collect_detail(candidate_id, country, refresh)
        .await?;

    let analysis = report.analysis;
    if report.already_collected {
        println!(
            "analysis for candidate {candidate_id} in '{}' already collected at {}",
            analysis.country, analysis.collected_at
        );
    } else {
        println!(
            "collected analysis for candidate {candidate_id} in '{}'",
            analysis.country
        );
    }
    println!("pain points:\n  {}", analysis.pain_points);
    println!("requested features:\n  {}", analysis.requested_features);
    Ok(())
}

/// Prints recent runs, newest first.
pub(crate) async fn list_runs(limit: i64) -> anyhow::Result<()> {
    let config = appscout_core::load_app_config()?;
    let pool = connect(&config).await?;

    let runs = appscout_db::runs::list_runs(&pool, limit).await?;
    if runs.is_empty() {
        println!("no runs recorded");
        return Ok(());
    }

    for run in runs {
        println!(
            "{}  {:<9}  {:>3} candidates  keywords [{}]  started {}",
            run.public_id,
            run.status,
            run.candidates_found,
            run.keywords.join(", "),
            run.started_at
        );
    }
    Ok(())
}
