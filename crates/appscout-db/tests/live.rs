//! Live integration tests for appscout-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/appscout-db/`), so `"../../migrations"` resolves to the
//! workspace migration directory.

use appscout_core::{
    Candidate, CountryEntry, CountryMetadata, Criterion, GateVerdict, Platform, ReviewRecord,
};
use appscout_db::{
    abort_run, complete_run, create_run, fail_run, get_candidate, get_deep_analysis, get_run,
    upsert_candidate, upsert_deep_analysis,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_metadata(title: &str, description: &str) -> CountryMetadata {
    CountryMetadata {
        title: title.to_string(),
        description: description.to_string(),
        price: "Free".to_string(),
        url: format!("https://apps.example.com/app/{title}"),
        rating_average: None,
        rating_count: None,
        release_date: None,
        size_bytes: None,
        genre: Some("Productivity".to_string()),
    }
}

fn make_candidate(store_id: &str, keyword: &str) -> Candidate {
    let mut candidate = Candidate::new(Platform::Ios, store_id, keyword);
    candidate.country_data.insert(
        "us".to_string(),
        CountryEntry::Available {
            metadata: make_metadata("Visual Timer", "A timer for focus"),
        },
    );
    candidate
}

fn make_verdict(approved: bool) -> GateVerdict {
    let criterion = |pass| Criterion {
        pass,
        reason: "test".to_string(),
    };
    GateVerdict::from_criteria(
        Some(approved),
        criterion(approved),
        criterion(true),
        criterion(true),
    )
}

fn make_review(rating: u8, body: &str) -> ReviewRecord {
    ReviewRecord {
        rating,
        title: "Review".to_string(),
        body: body.to_string(),
        author: None,
        updated_at: None,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Run Lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn run_lifecycle_running_to_succeeded(pool: sqlx::PgPool) {
    let keywords = vec!["Visual Timer".to_string()];
    let countries = vec!["us".to_string()];
    let run = create_run(&pool, "cli", &keywords, &countries)
        .await
        .expect("create_run failed");

    assert_eq!(run.status, "running");
    assert!(run.completed_at.is_none());
    assert_eq!(run.candidates_found, 0);
    assert_eq!(run.keywords, keywords);
    assert_eq!(run.countries, countries);

    complete_run(&pool, run.id, 7, "collected 7 candidates\n")
        .await
        .expect("complete_run failed");

    let fetched = get_run(&pool, run.id).await.expect("get_run failed");
    assert_eq!(fetched.status, "succeeded");
    assert_eq!(fetched.candidates_found, 7);
    assert_eq!(fetched.log_output, "collected 7 candidates\n");
    assert!(fetched.completed_at.is_some(), "completed_at should be set");
    assert!(fetched.error_message.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn abort_run_keeps_partial_count_and_log(pool: sqlx::PgPool) {
    let run = create_run(&pool, "api", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");

    abort_run(
        &pool,
        run.id,
        3,
        "evaluated 3 of 8\n",
        "judgment service quota exhausted",
    )
    .await
    .expect("abort_run failed");

    let fetched = get_run(&pool, run.id).await.expect("get_run failed");
    assert_eq!(fetched.status, "aborted");
    assert_eq!(
        fetched.candidates_found, 3,
        "partial count must survive the abort"
    );
    assert_eq!(fetched.log_output, "evaluated 3 of 8\n");
    assert_eq!(
        fetched.error_message.as_deref(),
        Some("judgment service quota exhausted")
    );
    assert!(fetched.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn fail_run_records_error_and_log(pool: sqlx::PgPool) {
    let run = create_run(&pool, "scheduled", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");

    fail_run(&pool, run.id, "collecting candidates\n", "connection reset")
        .await
        .expect("fail_run failed");

    let fetched = get_run(&pool, run.id).await.expect("get_run failed");
    assert_eq!(fetched.status, "failed");
    assert_eq!(fetched.log_output, "collecting candidates\n");
    assert_eq!(fetched.error_message.as_deref(), Some("connection reset"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn finished_run_cannot_be_finished_again(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");
    complete_run(&pool, run.id, 1, "")
        .await
        .expect("complete_run failed");

    let err = fail_run(&pool, run.id, "", "late failure")
        .await
        .expect_err("finishing a succeeded run should fail");

    assert!(
        matches!(
            err,
            appscout_db::DbError::InvalidRunTransition {
                expected_status: "running",
                ..
            }
        ),
        "expected InvalidRunTransition, got {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Section 2: Candidate Upsert Idempotency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn candidate_upsert_is_idempotent(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");
    let candidate = make_candidate("111", "visual timer");

    let first = upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("first upsert_candidate failed");
    let second = upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("second upsert_candidate failed");

    assert_eq!(
        first.id, second.id,
        "upsert must return the same row both times"
    );

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM candidates \
         WHERE run_id = $1 AND platform = 'ios' AND store_id = '111'",
    )
    .bind(run.id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(
        count, 1,
        "exactly one candidate row should exist after two upserts"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn candidate_upsert_overwrites_country_data(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");

    let mut candidate = make_candidate("222", "timer");
    upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("first upsert failed");

    candidate
        .country_data
        .insert("de".to_string(), CountryEntry::NotFound);
    let updated = upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("second upsert failed");

    let stored = updated.to_domain().expect("row should decode");
    assert_eq!(stored.country_data.len(), 2);
    assert!(matches!(
        stored.country_data.get("de"),
        Some(CountryEntry::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn candidate_upsert_preserves_verdict_when_absent(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");

    let mut candidate = make_candidate("333", "timer");
    candidate.verdict = Some(make_verdict(true));
    let first = upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("first upsert failed");

    candidate.verdict = None;
    upsert_candidate(&pool, run.id, &candidate)
        .await
        .expect("second upsert failed");

    let stored = get_candidate(&pool, first.id)
        .await
        .expect("get_candidate failed")
        .to_domain()
        .expect("row should decode");
    let verdict = stored.verdict.expect("stored verdict must survive");
    assert!(verdict.approved, "verdict-less upsert must not clear it");
}

#[sqlx::test(migrations = "../../migrations")]
async fn candidate_upsert_keeps_first_seen_keyword(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");

    upsert_candidate(&pool, run.id, &make_candidate("444", "first keyword"))
        .await
        .expect("first upsert failed");
    let second = upsert_candidate(&pool, run.id, &make_candidate("444", "second keyword"))
        .await
        .expect("second upsert failed");

    assert_eq!(
        second.source_keyword, "first keyword",
        "source_keyword keeps its first-seen value"
    );
}

// ---------------------------------------------------------------------------
// Section 3: Deep Analysis Upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn deep_analysis_upsert_overwrites_only_targeted_country(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");
    let candidate = upsert_candidate(&pool, run.id, &make_candidate("555", "timer"))
        .await
        .expect("upsert_candidate failed");

    upsert_deep_analysis(
        &pool,
        candidate.id,
        "us",
        &[make_review(1, "Crashes on open")],
        "1. Crashes",
        "1. Stability",
    )
    .await
    .expect("us upsert failed");
    upsert_deep_analysis(
        &pool,
        candidate.id,
        "kr",
        &[make_review(2, "Too slow")],
        "1. Slow",
        "1. Speed",
    )
    .await
    .expect("kr upsert failed");

    // Re-collect only the us analysis.
    upsert_deep_analysis(
        &pool,
        candidate.id,
        "us",
        &[make_review(1, "Crashes on open"), make_review(3, "Meh")],
        "1. Crashes 2. Meh",
        "1. Stability",
    )
    .await
    .expect("us re-upsert failed");

    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM deep_analyses WHERE candidate_id = $1")
            .bind(candidate.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(count, 2, "re-collection must not add a third row");

    let us = get_deep_analysis(&pool, candidate.id, "us")
        .await
        .expect("get us failed")
        .expect("us analysis should exist");
    assert_eq!(us.pain_points, "1. Crashes 2. Meh");
    assert_eq!(us.reviews().expect("reviews decode").len(), 2);

    let kr = get_deep_analysis(&pool, candidate.id, "kr")
        .await
        .expect("get kr failed")
        .expect("kr analysis should exist");
    assert_eq!(kr.pain_points, "1. Slow", "other country must be untouched");
}

#[sqlx::test(migrations = "../../migrations")]
async fn deep_analysis_absent_until_collected(pool: sqlx::PgPool) {
    let run = create_run(&pool, "cli", &["kw".to_string()], &["us".to_string()])
        .await
        .expect("create_run failed");
    let candidate = upsert_candidate(&pool, run.id, &make_candidate("666", "timer"))
        .await
        .expect("upsert_candidate failed");

    let result = get_deep_analysis(&pool, candidate.id, "us")
        .await
        .expect("get_deep_analysis failed");
    assert!(result.is_none(), "expected None before collection");
}
