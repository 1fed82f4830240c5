use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, Request, State};
use axum::http::header::{HeaderName, HeaderValue};
use axum::http::{Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cascade_core::scope_provider::InMemoryScopeProvider;
use cascade_core::technology::TechnologyCatalog;
use contracts::{
    ApiError, ErrorCode, Scenario, ScenarioComparison, ScenarioConfig, ScenarioResult,
    SCHEMA_VERSION_V1,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::{
    ManagerError, PersistenceError, ScenarioManager, SqliteScenarioStore,
};

const DEFAULT_SQLITE_PATH: &str = "cascade_scenarios.sqlite";
const SQLITE_PATH_ENV: &str = "CASCADE_SQLITE_PATH";
const DEMO_SCOPE_SEED: u64 = 1337;

#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
    Persistence(PersistenceError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
            Self::Persistence(err) => write!(f, "server storage error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<PersistenceError> for ServerError {
    fn from(value: PersistenceError) -> Self {
        Self::Persistence(value)
    }
}

#[derive(Clone)]
struct AppState {
    manager: Arc<Mutex<ScenarioManager>>,
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn from_manager(err: ManagerError) -> Self {
        match err {
            ManagerError::Persistence(PersistenceError::ScenarioNotFound(id)) => Self {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    ErrorCode::ScenarioNotFound,
                    "scenario does not exist",
                    Some(format!("scenario_id={id}")),
                ),
            },
            ManagerError::Persistence(other) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new(
                    ErrorCode::PersistenceError,
                    "scenario storage failed",
                    Some(other.to_string()),
                ),
            },
            ManagerError::Config(config_err) => {
                let code = match &config_err {
                    contracts::ConfigError::UnknownScope { .. } => ErrorCode::ScopeNotFound,
                    contracts::ConfigError::UnknownTechnology(_) => ErrorCode::UnknownTechnology,
                    _ => ErrorCode::InvalidConfig,
                };
                let status = match code {
                    ErrorCode::ScopeNotFound => StatusCode::NOT_FOUND,
                    _ => StatusCode::BAD_REQUEST,
                };
                Self {
                    status,
                    error: ApiError::new(code, "scenario config rejected", Some(config_err.to_string())),
                }
            }
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

/// Serves the scenario API on `addr`, backed by SQLite at
/// `CASCADE_SQLITE_PATH` (default `cascade_scenarios.sqlite`) and the
/// deterministic demo scope provider.
pub async fn serve(addr: SocketAddr) -> Result<(), ServerError> {
    let sqlite_path =
        std::env::var(SQLITE_PATH_ENV).unwrap_or_else(|_| DEFAULT_SQLITE_PATH.to_string());
    let store = SqliteScenarioStore::open(&sqlite_path)?;
    let manager = ScenarioManager::new(
        Box::new(store),
        Box::new(InMemoryScopeProvider::with_demo_fallback(DEMO_SCOPE_SEED)),
        TechnologyCatalog::builtin(),
    );
    let state = AppState {
        manager: Arc::new(Mutex::new(manager)),
    };
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/simulate", post(simulate))
        .route("/api/v1/scenarios", post(create_scenario).get(list_scenarios))
        .route(
            "/api/v1/scenarios/{scenario_id}",
            get(get_scenario).delete(delete_scenario),
        )
        .route("/api/v1/scenarios/{scenario_id}/run", post(run_scenario))
        .route("/api/v1/compare", post(compare_scenarios))
        .route("/api/v1/technologies", get(list_technologies))
        .route("/api/v1/scopes", get(list_scopes))
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn cors_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = Response::new(axum::body::Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        apply_cors_headers(response.headers_mut());
        return response;
    }

    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

fn apply_cors_headers(headers: &mut axum::http::HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET,POST,OPTIONS,PUT,PATCH,DELETE"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-max-age"),
        HeaderValue::from_static("3600"),
    );
}

#[derive(Debug, Serialize)]
struct SimulateResponse {
    schema_version: String,
    scenario_id: String,
    result: ScenarioResult,
    warnings: Vec<String>,
}

/// Create-and-run in one call. The scenario persists like any other, so the
/// result can be re-fetched or compared later.
async fn simulate(
    State(state): State<AppState>,
    Json(config): Json<ScenarioConfig>,
) -> Result<Json<SimulateResponse>, HttpApiError> {
    let mut manager = state.manager.lock().await;
    let created = manager
        .create_scenario(config)
        .map_err(HttpApiError::from_manager)?;
    let completed = manager
        .run_scenario(&created.id)
        .map_err(HttpApiError::from_manager)?;
    let result = completed.result.ok_or_else(|| HttpApiError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        error: ApiError::new(
            ErrorCode::InternalError,
            "completed scenario is missing its result",
            Some(format!("scenario_id={}", completed.id)),
        ),
    })?;
    Ok(Json(SimulateResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        scenario_id: completed.id,
        result,
        warnings: completed.warnings,
    }))
}

async fn create_scenario(
    State(state): State<AppState>,
    Json(config): Json<ScenarioConfig>,
) -> Result<(StatusCode, Json<Scenario>), HttpApiError> {
    let mut manager = state.manager.lock().await;
    let scenario = manager
        .create_scenario(config)
        .map_err(HttpApiError::from_manager)?;
    Ok((StatusCode::CREATED, Json(scenario)))
}

async fn run_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<String>,
) -> Result<Json<Scenario>, HttpApiError> {
    let mut manager = state.manager.lock().await;
    let scenario = manager
        .run_scenario(&scenario_id)
        .map_err(HttpApiError::from_manager)?;
    Ok(Json(scenario))
}

async fn get_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<String>,
) -> Result<Json<Scenario>, HttpApiError> {
    let manager = state.manager.lock().await;
    let scenario = manager
        .get_scenario(&scenario_id)
        .map_err(HttpApiError::from_manager)?;
    Ok(Json(scenario))
}

#[derive(Debug, Serialize)]
struct ScenarioListResponse {
    schema_version: String,
    scenarios: Vec<Scenario>,
}

async fn list_scenarios(
    State(state): State<AppState>,
) -> Result<Json<ScenarioListResponse>, HttpApiError> {
    let manager = state.manager.lock().await;
    let scenarios = manager
        .list_scenarios()
        .map_err(HttpApiError::from_manager)?;
    Ok(Json(ScenarioListResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        scenarios,
    }))
}

async fn delete_scenario(
    State(state): State<AppState>,
    Path(scenario_id): Path<String>,
) -> Result<StatusCode, HttpApiError> {
    let mut manager = state.manager.lock().await;
    manager
        .delete_scenario(&scenario_id)
        .map_err(HttpApiError::from_manager)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct CompareRequest {
    scenario_ids: Vec<String>,
}

async fn compare_scenarios(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<ScenarioComparison>, HttpApiError> {
    let mut manager = state.manager.lock().await;
    let comparison = manager
        .compare(&request.scenario_ids)
        .map_err(HttpApiError::from_manager)?;
    Ok(Json(comparison))
}

#[derive(Debug, Serialize)]
struct TechnologyListResponse {
    schema_version: String,
    technologies: Vec<contracts::TechnologyProfile>,
}

async fn list_technologies(State(state): State<AppState>) -> Json<TechnologyListResponse> {
    let manager = state.manager.lock().await;
    Json(TechnologyListResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        technologies: manager.catalog().profiles().cloned().collect(),
    })
}

#[derive(Debug, Serialize)]
struct ScopeEntry {
    scope_type: String,
    scope_name: String,
}

#[derive(Debug, Serialize)]
struct ScopeListResponse {
    schema_version: String,
    scopes: Vec<ScopeEntry>,
}

async fn list_scopes(State(state): State<AppState>) -> Json<ScopeListResponse> {
    let manager = state.manager.lock().await;
    let scopes = manager
        .available_scopes()
        .into_iter()
        .map(|(scope_type, scope_name)| ScopeEntry {
            scope_type,
            scope_name,
        })
        .collect();
    Json(ScopeListResponse {
        schema_version: SCHEMA_VERSION_V1.to_string(),
        scopes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ConfigError;

    #[test]
    fn missing_scenario_maps_to_not_found() {
        let err = HttpApiError::from_manager(ManagerError::Persistence(
            PersistenceError::ScenarioNotFound("scn-0042".to_string()),
        ));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error.error_code, ErrorCode::ScenarioNotFound);
    }

    #[test]
    fn unknown_scope_maps_to_not_found() {
        let err = HttpApiError::from_manager(ManagerError::Config(ConfigError::UnknownScope {
            scope_type: "department".to_string(),
            scope_name: "nowhere".to_string(),
        }));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error.error_code, ErrorCode::ScopeNotFound);
    }

    #[test]
    fn config_rejection_maps_to_bad_request() {
        let err = HttpApiError::from_manager(ManagerError::Config(ConfigError::InvalidTimeline(
            999,
        )));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.error.error_code, ErrorCode::InvalidConfig);
    }
}
