//! Run lifecycle: collection, gating, persistence, and on-demand detail
//! collection.
//!
//! At most one discovery run is active per process (see [`crate::guard`]).
//! The orchestrator is shared behind an `Arc` by the HTTP trigger, the
//! cron scheduler, and the CLI, so mutual exclusion covers every entry
//! point.

use std::fmt::Write as _;
use std::sync::Arc;

use sqlx::PgPool;
use tracing::{error, info};

use appscout_core::{load_keyword_pool, sample_keywords, AppConfig, Candidate};
use appscout_db::candidates::{
    get_candidate, update_candidate_country_data, upsert_candidate,
};
use appscout_db::deep_analyses::{get_deep_analysis, upsert_deep_analysis, DeepAnalysisRow};
use appscout_db::runs::{abort_run, complete_run, create_run, fail_run, RunRow};
use appscout_judge::{analyze_reviews, JudgeClient};
use appscout_store::StoreClient;

use crate::collector::collect_candidates;
use crate::enrichment::enrich_country;
use crate::error::PipelineError;
use crate::gate::{gate_candidate, GateOutcome};
use crate::guard::RunGuard;
use crate::harvester::harvest_negative_reviews;

/// Accumulates human-readable run log lines, mirrored to tracing.
#[derive(Debug, Default)]
struct RunLog {
    buffer: String,
}

impl RunLog {
    fn push(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!("{line}");
        let _ = writeln!(self.buffer, "{line}");
    }

    fn as_str(&self) -> &str {
        &self.buffer
    }
}

/// Outcome of a detail collection request.
#[derive(Debug)]
pub struct DetailReport {
    pub analysis: DeepAnalysisRow,
    /// True when an existing analysis was returned without re-collecting.
    pub already_collected: bool,
}

/// Coordinates discovery runs and detail collection.
pub struct Orchestrator {
    pool: PgPool,
    store: StoreClient,
    judge: JudgeClient,
    guard: RunGuard,
    config: AppConfig,
}

impl Orchestrator {
    #[must_use]
    pub fn new(pool: PgPool, store: StoreClient, judge: JudgeClient, config: AppConfig) -> Self {
        Self {
            pool,
            store,
            judge,
            guard: RunGuard::new(),
            config,
        }
    }

    /// True while a discovery run is active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    /// Starts a discovery run in a background task and returns its row
    /// immediately.
    ///
    /// `keywords: None` samples from the curated pool; `countries: None`
    /// uses the configured default country.
    ///
    /// # Errors
    ///
    /// [`PipelineError::AlreadyRunning`] when a run is active; config or
    /// database errors from run setup.
    pub async fn start_run(
        self: &Arc<Self>,
        trigger_source: &str,
        keywords: Option<Vec<String>>,
        countries: Option<Vec<String>>,
    ) -> Result<RunRow, PipelineError> {
        let permit = self.guard.try_acquire()?;
        let keywords = self.resolve_keywords(keywords)?;
        let countries = resolve_countries(countries, &self.config.default_country);

        let run = create_run(&self.pool, trigger_source, &keywords, &countries).await?;
        info!(run_id = %run.public_id, trigger_source, "discovery run started");

        let this = Arc::clone(self);
        let run_id = run.id;
        let public_id = run.public_id;
        tokio::spawn(async move {
            let _permit = permit;
            let mut log = RunLog::default();
            if let Err(err) = this.execute_run(run_id, &keywords, &countries, &mut log).await {
                error!(run_id = %public_id, error = %err, "discovery run failed");
                let message = err.to_string();
                log.push(format!("run failed: {message}"));
                if let Err(db_err) = fail_run(&this.pool, run_id, log.as_str(), &message).await {
                    error!(run_id = %public_id, error = %db_err, "failed to record run failure");
                }
            }
        });

        Ok(run)
    }

    /// Runs a discovery synchronously (CLI path). Holds the permit for the
    /// whole run.
    ///
    /// # Errors
    ///
    /// Same as [`Orchestrator::start_run`], plus any error from the run
    /// body itself.
    pub async fn run_blocking(
        &self,
        trigger_source: &str,
        keywords: Option<Vec<String>>,
        countries: Option<Vec<String>>,
    ) -> Result<RunRow, PipelineError> {
        let permit = self.guard.try_acquire()?;
        let keywords = self.resolve_keywords(keywords)?;
        let countries = resolve_countries(countries, &self.config.default_country);

        let run = create_run(&self.pool, trigger_source, &keywords, &countries).await?;
        let mut log = RunLog::default();
        let result = {
            let _permit = permit;
            self.execute_run(run.id, &keywords, &countries, &mut log).await
        };

        if let Err(err) = result {
            let message = err.to_string();
            log.push(format!("run failed: {message}"));
            fail_run(&self.pool, run.id, log.as_str(), &message).await?;
            return Err(err);
        }

        Ok(appscout_db::runs::get_run(&self.pool, run.id).await?)
    }

    async fn execute_run(
        &self,
        run_id: i64,
        keywords: &[String],
        countries: &[String],
        log: &mut RunLog,
    ) -> Result<(), PipelineError> {
        log.push(format!(
            "collecting candidates for keywords [{}] in countries [{}]",
            keywords.join(", "),
            countries.join(", ")
        ));

        let candidates = collect_candidates(
            &self.store,
            keywords,
            countries,
            self.config.collector_search_limit,
            self.config.collector_pool_cap,
        )
        .await;
        log.push(format!("collected {} candidates", candidates.len()));

        let mut evaluated = 0i32;
        let mut approved = 0i32;

        for mut candidate in candidates {
            let outcome = gate_candidate(&self.judge, &candidate).await;
            match outcome {
                GateOutcome::Verdict(verdict) => {
                    let title = candidate.title().unwrap_or(&candidate.store_id).to_owned();
                    log.push(format!(
                        "{} {} ({})",
                        if verdict.approved { "approved" } else { "rejected" },
                        title,
                        candidate.store_id
                    ));
                    if verdict.approved {
                        approved += 1;
                    }
                    candidate.verdict = Some(verdict);
                    upsert_candidate(&self.pool, run_id, &candidate).await?;
                    evaluated += 1;
                }
                GateOutcome::QuotaExhausted => {
                    log.push(format!(
                        "judgment quota exhausted after {evaluated} candidates, aborting run"
                    ));
                    abort_run(
                        &self.pool,
                        run_id,
                        evaluated,
                        log.as_str(),
                        "judgment service quota exhausted",
                    )
                    .await?;
                    return Ok(());
                }
            }
        }

        log.push(format!(
            "run finished: {evaluated} candidates evaluated, {approved} approved"
        ));
        complete_run(&self.pool, run_id, evaluated, log.as_str()).await?;
        Ok(())
    }

    /// Collects (or returns the cached) deep analysis for one candidate
    /// and country.
    ///
    /// Idempotent: an existing analysis is returned as-is unless `refresh`
    /// is set. Re-collection touches only the targeted country.
    ///
    /// # Errors
    ///
    /// Database errors from candidate lookup and persistence.
    pub async fn collect_detail(
        &self,
        candidate_id: i64,
        country: Option<String>,
        refresh: bool,
    ) -> Result<DetailReport, PipelineError> {
        let country = country
            .unwrap_or_else(|| self.config.default_country.clone())
            .to_lowercase();

        if !refresh {
            if let Some(existing) = get_deep_analysis(&self.pool, candidate_id, &country).await? {
                return Ok(DetailReport {
                    analysis: existing,
                    already_collected: true,
                });
            }
        }

        let row = get_candidate(&self.pool, candidate_id).await?;
        let mut candidate: Candidate = row.to_domain()?;

        if enrich_country(&self.store, &mut candidate, &country).await {
            update_candidate_country_data(&self.pool, candidate_id, &candidate.country_data)
                .await?;
        }

        let reviews = harvest_negative_reviews(
            &self.store,
            candidate.platform,
            &candidate.store_id,
            &country,
            self.config.harvester_max_pages,
            self.config.harvester_review_cap,
        )
        .await;
        info!(
            candidate_id,
            country,
            reviews = reviews.len(),
            "negative reviews collected"
        );

        let title = candidate.title().unwrap_or(&candidate.store_id).to_owned();
        let analysis = analyze_reviews(&self.judge, &title, &reviews).await;

        let stored = upsert_deep_analysis(
            &self.pool,
            candidate_id,
            &country,
            &reviews,
            &analysis.pain_points,
            &analysis.requested_features,
        )
        .await?;

        Ok(DetailReport {
            analysis: stored,
            already_collected: false,
        })
    }

    fn resolve_keywords(
        &self,
        keywords: Option<Vec<String>>,
    ) -> Result<Vec<String>, PipelineError> {
        match keywords {
            Some(list) if !list.is_empty() => Ok(list),
            _ => {
                let pool = load_keyword_pool(&self.config.keywords_path)?;
                Ok(sample_keywords(
                    &pool,
                    self.config.collector_keyword_sample,
                ))
            }
        }
    }
}

fn resolve_countries(countries: Option<Vec<String>>, default_country: &str) -> Vec<String> {
    match countries {
        Some(list) if !list.is_empty() => {
            list.into_iter().map(|c| c.to_lowercase()).collect()
        }
        _ => vec![default_country.to_lowercase()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countries_default_to_configured_country() {
        assert_eq!(resolve_countries(None, "us"), vec!["us".to_string()]);
        assert_eq!(
            resolve_countries(Some(Vec::new()), "de"),
            vec!["de".to_string()]
        );
    }

    #[test]
    fn explicit_countries_are_lowercased() {
        assert_eq!(
            resolve_countries(Some(vec!["US".to_string(), "De".to_string()]), "us"),
            vec!["us".to_string(), "de".to_string()]
        );
    }

    #[test]
    fn run_log_accumulates_lines() {
        let mut log = RunLog::default();
        log.push("first");
        log.push("second");
        assert_eq!(log.as_str(), "first\nsecond\n");
    }
}
