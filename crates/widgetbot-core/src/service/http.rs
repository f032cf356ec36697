use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{self, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::WidgetbotError;
use crate::instance::{Instance, InstanceCreate, InstanceUpdate};
use crate::service::instances::InstanceService;
use crate::settings::{
    default_settings, get_section_schema, validate_document, validate_section, Section,
};

/// Shared application state for the HTTP API.
pub struct AppState {
    pub config: Config,
    pub instances: InstanceService,
}

impl AppState {
    pub fn new(config: Config, instances: InstanceService) -> Self {
        Self { config, instances }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct SchemaQuery {
    pub section: Option<String>,
}

/// Failure responses of the API.
#[derive(Debug)]
pub enum ApiError {
    /// Payload rejected by settings validation; nothing was written.
    Validation(Vec<String>),
    Unauthorized(String),
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "message": "Invalid settings", "errors": errors })),
            )
                .into_response(),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::Internal(msg) => {
                error!("Request failed: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<WidgetbotError> for ApiError {
    fn from(e: WidgetbotError) -> Self {
        if e.is_not_found() {
            ApiError::NotFound(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Reject the payload unless it validates cleanly.
fn ensure_valid(errors: Vec<String>) -> ApiResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

fn owner_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins = &config.cors.allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::HeaderName::from_static("x-user-id"),
        ])
}

/// Create the axum Router with all API routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.server.max_body_bytes;

    Router::new()
        // Settings introspection
        .route("/api/v1/settings/schema", get(handle_settings_schema))
        .route("/api/v1/settings/defaults", get(handle_settings_defaults))
        // Instances
        .route(
            "/api/v1/instances",
            get(handle_list_instances).post(handle_create_instance),
        )
        .route(
            "/api/v1/instances/{id}",
            get(handle_get_instance)
                .put(handle_update_instance)
                .delete(handle_delete_instance),
        )
        // Instance settings
        .route(
            "/api/v1/instances/{id}/settings",
            get(handle_get_settings).put(handle_update_settings),
        )
        .route(
            "/api/v1/instances/{id}/settings/reset",
            post(handle_reset_settings),
        )
        .route(
            "/api/v1/instances/{id}/settings/{section}",
            put(handle_update_settings_section),
        )
        // Health
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /api/v1/settings/schema: Settings schema, optionally one section
async fn handle_settings_schema(Query(query): Query<SchemaQuery>) -> Json<Value> {
    Json(get_section_schema(query.section.as_deref()))
}

/// GET /api/v1/settings/defaults: Default settings document
async fn handle_settings_defaults() -> Json<Value> {
    Json(default_settings())
}

/// GET /api/v1/instances: Instances of the calling owner
async fn handle_list_instances(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<Instance>>> {
    let owner = owner_id(&headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing x-user-id header".to_string()))?;
    Ok(Json(state.instances.list_instances(owner)?))
}

/// POST /api/v1/instances: Create an instance
async fn handle_create_instance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<InstanceCreate>,
) -> ApiResult<(StatusCode, Json<Instance>)> {
    if let Some(ref settings) = req.settings {
        ensure_valid(validate_document(settings))?;
    }
    let instance = state
        .instances
        .create_instance(owner_id(&headers), req)
        .await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// GET /api/v1/instances/{id}: Get an instance
async fn handle_get_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Instance>> {
    Ok(Json(state.instances.get_instance(&id)?))
}

/// PUT /api/v1/instances/{id}: Update an instance
async fn handle_update_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<InstanceUpdate>,
) -> ApiResult<Json<Instance>> {
    if let Some(ref settings) = req.settings {
        ensure_valid(validate_document(settings))?;
    }
    Ok(Json(state.instances.update_instance(&id, req).await?))
}

/// DELETE /api/v1/instances/{id}: Delete an instance and its settings
async fn handle_delete_instance(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    state.instances.delete_instance(&id).await?;
    Ok(Json(json!({ "deleted": true })))
}

/// GET /api/v1/instances/{id}/settings: Current settings document
async fn handle_get_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.instances.get_settings(&id)?))
}

/// PUT /api/v1/instances/{id}/settings: Merge a partial document
async fn handle_update_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(partial): Json<Value>,
) -> ApiResult<Json<Value>> {
    ensure_valid(validate_document(&partial))?;
    Ok(Json(state.instances.update_settings(&id, &partial).await?))
}

/// PUT /api/v1/instances/{id}/settings/{section}: Merge a partial section
async fn handle_update_settings_section(
    State(state): State<Arc<AppState>>,
    Path((id, section)): Path<(String, String)>,
    Json(partial): Json<Value>,
) -> ApiResult<Json<Value>> {
    ensure_valid(validate_section(&section, &partial))?;
    let section: Section = section.parse().map_err(|e: String| ApiError::Validation(vec![e]))?;
    Ok(Json(
        state
            .instances
            .update_settings_section(&id, section, &partial)
            .await?,
    ))
}

/// POST /api/v1/instances/{id}/settings/reset: Restore default settings
async fn handle_reset_settings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    Ok(Json(state.instances.reset_settings(&id).await?))
}

/// GET /health: Health check
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Start the HTTP server on the given address.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
