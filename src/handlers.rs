use crate::cache_store::{CacheStore, MokaCacheStore, Namespace};
use crate::company_store::CompanyStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::registry_client::{DocumentSource, RegistryGatewayClient};
use crate::risk::select_statements;
use crate::risk_cache::RiskIndicatorService;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use regex::Regex;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Retention for cached search and suggestion responses.
const DB_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the registry document gateway.
    pub registry_client: RegistryGatewayClient,
    /// Injected cache client, shared by all namespaces.
    pub cache: MokaCacheStore,
    /// Risk computation service wrapping the indicator cache contract.
    pub risk_service: RiskIndicatorService<MokaCacheStore>,
}

/// Validate and normalize a Firmenbuchnummer: 1-6 digits followed by a
/// check letter, e.g. "123456a". Input case is accepted, stored form is
/// lowercase.
pub fn normalize_firmenbuchnummer(raw: &str) -> Result<String, AppError> {
    let fnr = raw.trim().to_ascii_lowercase();

    let fnr_regex = Regex::new(r"^[0-9]{1,6}[a-z]$").unwrap();
    if !fnr_regex.is_match(&fnr) {
        return Err(AppError::BadRequest(format!(
            "Invalid Firmenbuchnummer: {}",
            raw
        )));
    }

    Ok(fnr)
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "firmenbuch-risk-api",
            "version": "0.1.0"
        })),
    )
}

/// GET /api/v1/companies?query=
///
/// Searches companies by substring across name, Firmenbuchnummer, seat
/// and business purpose. Responses are cached for an hour; the cache is
/// best-effort and never fails the request.
pub async fn search_companies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<SearchResponse>, AppError> {
    tracing::info!("GET /companies - query: {:?}", params.query);

    let query = params.query.trim().to_string();
    if query.is_empty() {
        return Err(AppError::BadRequest("query must not be empty".to_string()));
    }

    let cache_key = format!("search_companies:{}", query);
    if let Ok(Some(cached)) = state.cache.get(Namespace::Db, &cache_key).await {
        if let Ok(response) = serde_json::from_str::<SearchResponse>(&cached) {
            tracing::debug!("search cache hit for '{}'", query);
            return Ok(Json(response));
        }
    }

    let store = CompanyStore::new(state.db.clone());
    let results = store.search(&query).await?;
    let response = SearchResponse { results };

    if let Ok(serialized) = serde_json::to_string(&response) {
        if let Err(e) = state
            .cache
            .set(Namespace::Db, &cache_key, serialized, DB_CACHE_TTL)
            .await
        {
            tracing::warn!("search cache write failed: {}", e);
        }
    }

    Ok(Json(response))
}

/// GET /api/v1/companies/suggest?query=
///
/// Autocomplete suggestions (Firmenbuchnummer + name). Queries shorter
/// than three characters yield an empty list rather than an error.
pub async fn suggest_companies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Result<Json<Vec<CompanySuggestion>>, AppError> {
    let query = params.query.trim().to_string();

    let cache_key = format!("search_suggestions:{}", query);
    if let Ok(Some(cached)) = state.cache.get(Namespace::Db, &cache_key).await {
        if let Ok(suggestions) = serde_json::from_str::<Vec<CompanySuggestion>>(&cached) {
            return Ok(Json(suggestions));
        }
    }

    let store = CompanyStore::new(state.db.clone());
    let suggestions = store.suggestions(&query).await?;

    if let Ok(serialized) = serde_json::to_string(&suggestions) {
        if let Err(e) = state
            .cache
            .set(Namespace::Db, &cache_key, serialized, DB_CACHE_TTL)
            .await
        {
            tracing::warn!("suggestion cache write failed: {}", e);
        }
    }

    Ok(Json(suggestions))
}

/// GET /api/v1/companies/:fnr
///
/// Company detail with risk data attached when it can be computed. A
/// gateway outage degrades the response to company data without risk
/// rather than failing it.
pub async fn get_company(
    State(state): State<Arc<AppState>>,
    Path(fnr): Path<String>,
) -> Result<Json<CompanyWithRisk>, AppError> {
    let fnr = normalize_firmenbuchnummer(&fnr)?;
    tracing::info!("GET /companies/{}", fnr);

    let store = CompanyStore::new(state.db.clone());
    let company = store
        .find_by_firmenbuchnummer(&fnr)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {} not found", fnr)))?;

    let risk = match assess_company_risk(&state, &store, &company).await {
        Ok(risk) => risk,
        Err(e) => {
            tracing::warn!("Risk computation unavailable for {}: {}", fnr, e);
            None
        }
    };

    Ok(Json(CompanyWithRisk { company, risk }))
}

/// GET /api/v1/companies/:fnr/risk
///
/// Risk indicator set and aggregate score for a company. Unlike the
/// detail endpoint this propagates gateway failures, so consumers can
/// distinguish "no documents filed" (404) from "gateway down" (502).
pub async fn get_company_risk(
    State(state): State<Arc<AppState>>,
    Path(fnr): Path<String>,
) -> Result<Json<RiskResponse>, AppError> {
    let fnr = normalize_firmenbuchnummer(&fnr)?;
    tracing::info!("GET /companies/{}/risk", fnr);

    let store = CompanyStore::new(state.db.clone());
    let company = store
        .find_by_firmenbuchnummer(&fnr)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Company {} not found", fnr)))?;

    let statements = state.registry_client.fetch_statements(&fnr).await?;
    let Some((latest, historical)) = select_statements(statements) else {
        return Err(AppError::NotFound(format!(
            "No financial statements filed for {}",
            fnr
        )));
    };

    let filings = store.filing_entries(company.id).await?;
    let assessment = state
        .risk_service
        .indicators_for(
            &fnr,
            &latest,
            &historical,
            &filings,
            Utc::now().date_naive(),
        )
        .await;

    tracing::info!(
        "Computed risk for {}: score {:?} from {} statement(s)",
        fnr,
        assessment.score,
        historical.len() + 1
    );

    Ok(Json(RiskResponse {
        firmenbuchnummer: fnr,
        risk_score: assessment.score,
        risk_indicators: assessment.indicators,
    }))
}

/// Best-effort risk assessment for the detail endpoint. `Ok(None)` means
/// the company has no filed documents; errors mean a collaborator failed.
async fn assess_company_risk(
    state: &Arc<AppState>,
    store: &CompanyStore,
    company: &Company,
) -> Result<Option<RiskAssessment>, AppError> {
    let statements = state
        .registry_client
        .fetch_statements(&company.firmenbuchnummer)
        .await?;

    let Some((latest, historical)) = select_statements(statements) else {
        return Ok(None);
    };

    let filings = store.filing_entries(company.id).await?;
    let assessment = state
        .risk_service
        .indicators_for(
            &company.firmenbuchnummer,
            &latest,
            &historical,
            &filings,
            Utc::now().date_naive(),
        )
        .await;

    Ok(Some(assessment))
}
