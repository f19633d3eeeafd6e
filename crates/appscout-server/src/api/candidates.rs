use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use appscout_db::candidates::CandidateRow;
use appscout_db::deep_analyses::DeepAnalysisRow;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_pipeline_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct CandidatesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct EnrichBody {
    pub country: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// Candidate as stored; JSONB columns pass through untouched so a bad
/// historical verdict never breaks a listing.
#[derive(Debug, Serialize)]
pub(super) struct CandidateItem {
    id: i64,
    run_id: i64,
    platform: String,
    store_id: String,
    source_keyword: String,
    country_data: serde_json::Value,
    verdict: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CandidateRow> for CandidateItem {
    fn from(row: CandidateRow) -> Self {
        Self {
            id: row.id,
            run_id: row.run_id,
            platform: row.platform,
            store_id: row.store_id,
            source_keyword: row.source_keyword,
            country_data: row.country_data,
            verdict: row.verdict,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct AnalysisItem {
    country: String,
    reviews: serde_json::Value,
    pain_points: String,
    requested_features: String,
    collected_at: DateTime<Utc>,
}

impl From<DeepAnalysisRow> for AnalysisItem {
    fn from(row: DeepAnalysisRow) -> Self {
        Self {
            country: row.country,
            reviews: row.reviews,
            pain_points: row.pain_points,
            requested_features: row.requested_features,
            collected_at: row.collected_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CandidateDetail {
    #[serde(flatten)]
    candidate: CandidateItem,
    analysis_status: &'static str,
    analyses: Vec<AnalysisItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct EnrichData {
    already_collected: bool,
    analysis: AnalysisItem,
}

pub(super) async fn list_candidates(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CandidatesQuery>,
) -> Result<Json<ApiResponse<Vec<CandidateItem>>>, ApiError> {
    let rows =
        appscout_db::candidates::list_all_candidates(&state.pool, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CandidateItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_candidate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CandidateDetail>>, ApiError> {
    let row = appscout_db::candidates::get_candidate(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let analyses = appscout_db::deep_analyses::list_deep_analyses(&state.pool, id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let analysis_status = if analyses.is_empty() {
        "not_collected"
    } else {
        "collected"
    };

    Ok(Json(ApiResponse {
        data: CandidateDetail {
            candidate: CandidateItem::from(row),
            analysis_status,
            analyses: analyses.into_iter().map(AnalysisItem::from).collect(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Runs detail collection (country enrichment + review harvest + analysis)
/// inline and returns the resulting analysis.
pub(super) async fn enrich_candidate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<i64>,
    body: Option<Json<EnrichBody>>,
) -> Result<Json<ApiResponse<EnrichData>>, ApiError> {
    let Json(body) = body.unwrap_or_default();

    let report = state
        .orchestrator
        .collect_detail(id, body.country, body.refresh)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: EnrichData {
            already_collected: report.already_collected,
            analysis: AnalysisItem::from(report.analysis),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
