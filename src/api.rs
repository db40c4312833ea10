//! REST API for the load planning service.
//!
//! Exposes packing, streaming, recommendation and single-box tiling over
//! HTTP/JSON. Uses Axum as the web framework and supports CORS.

use std::collections::HashSet;
use std::sync::OnceLock;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::distributor::{
    ContainerLoad, DistributionOptions, DistributionResult, UnplacedGroup, pack_containers,
    pack_containers_with_progress,
};
use crate::model::{Container, ContainerType, Group, Placement, ValidationError, container_presets, validate_dims};
use crate::optimizer::{GroupResult, PackingConfig, PackingResult};
use crate::orientation::OrientationKind;
use crate::recommender::{RecommendationCandidate, TypeCount, recommend_containers};
use crate::stability::{Severity, StabilityIssue, StabilitySummary, WeightDistribution};
use crate::tiler::{PatternRow, SingleBoxLimits, SingleBoxSummary, TileResult, best_tile, summarize_single_box};
use crate::types::Rect;

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>load-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
</html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request body for `/pack` and `/pack_stream`.
///
/// Containers are packed in the given order. `allow_side_laying` and
/// `spread_evenly` override the configured defaults when present.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "groups": [
            { "id": 1, "name": "Cartons", "dims": [600.0, 400.0, 300.0], "weight": 12.5, "quantity": 40 }
        ],
        "containers": [
            { "id": 0, "dims": [5895.0, 2350.0, 2392.0], "max_weight": 28230.0 }
        ],
        "allow_side_laying": true,
        "spread_evenly": false
    })
)]
pub struct PackRequest {
    pub groups: Vec<Group>,
    pub containers: Vec<Container>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_side_laying: Option<bool>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub spread_evenly: Option<bool>,
}

/// Request body for `/recommend`. Uses the presets when no catalog is given.
#[derive(Deserialize, ToSchema)]
pub struct RecommendRequest {
    pub groups: Vec<Group>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub catalog: Option<Vec<ContainerType>>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_side_laying: Option<bool>,
}

/// Request body for `/tile`.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "box_dims": [600.0, 400.0, 300.0],
        "box_weight": 12.5,
        "space_dims": [1200.0, 800.0, 1500.0],
        "limits": { "desired_count": 20, "max_box_weight": 25.0, "max_container_weight": 1000.0 }
    })
)]
pub struct TileRequest {
    #[schema(value_type = [f64; 3])]
    pub box_dims: (f64, f64, f64),
    #[serde(default)]
    pub box_weight: f64,
    #[schema(value_type = [f64; 3])]
    pub space_dims: (f64, f64, f64),
    #[serde(default)]
    #[schema(nullable = true)]
    pub allow_side_laying: Option<bool>,
    #[serde(default)]
    pub limits: SingleBoxLimits,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    groups: Vec<Group>,
    containers: Vec<Container>,
    allow_side_laying: Option<bool>,
    spread_evenly: Option<bool>,
}

#[derive(Debug)]
enum RequestValidationError {
    MissingContainers,
    DuplicateGroupId(usize),
    InvalidContainer(ValidationError),
    InvalidGroup(ValidationError),
}

fn validate_groups(groups: &[Group]) -> Result<(), RequestValidationError> {
    let mut seen = HashSet::new();
    for group in groups {
        group.validate().map_err(RequestValidationError::InvalidGroup)?;
        if !seen.insert(group.id) {
            return Err(RequestValidationError::DuplicateGroupId(group.id));
        }
    }
    Ok(())
}

impl PackRequest {
    fn into_validated(self) -> Result<ValidatedPackRequest, RequestValidationError> {
        if self.containers.is_empty() {
            return Err(RequestValidationError::MissingContainers);
        }
        validate_groups(&self.groups)?;
        for container in &self.containers {
            container
                .validate()
                .map_err(RequestValidationError::InvalidContainer)?;
        }

        Ok(ValidatedPackRequest {
            groups: self.groups,
            containers: self.containers,
            allow_side_laying: self.allow_side_laying,
            spread_evenly: self.spread_evenly,
        })
    }
}

/// Response of `/pack`.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub loads: Vec<ContainerLoad>,
    pub unplaced: Vec<UnplacedGroup>,
    pub total_placed: usize,
    pub total_weight: f64,
    pub average_utilization: f64,
    pub is_complete: bool,
}

impl PackResponse {
    pub fn from_distribution(result: DistributionResult) -> Self {
        let is_complete = result.is_complete();
        let average_utilization = result.average_utilization();
        let DistributionResult {
            loads,
            unplaced,
            total_placed,
            total_weight,
        } = result;

        Self {
            loads,
            unplaced,
            total_placed,
            total_weight,
            average_utilization,
            is_complete,
        }
    }
}

/// Response of `/recommend`, best candidate first.
#[derive(Serialize, ToSchema)]
pub struct RecommendResponse {
    pub total_requested: u64,
    pub candidates: Vec<RecommendationCandidate>,
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(status: StatusCode, error: impl Into<String>, details: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn container_config_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid container configuration",
        details,
    )
}

impl RequestValidationError {
    fn into_response(self) -> Response {
        match self {
            RequestValidationError::MissingContainers => {
                validation_error("At least one container must be specified")
            }
            RequestValidationError::DuplicateGroupId(id) => {
                validation_error(format!("Group id {id} is used more than once"))
            }
            RequestValidationError::InvalidContainer(err) => container_config_error(err.to_string()),
            RequestValidationError::InvalidGroup(err) => validation_error(err.to_string()),
        }
    }
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = payload.map_err(json_deserialize_error)?;
    payload
        .into_validated()
        .map_err(RequestValidationError::into_response)
}

/// Applies a request-level side-laying override to the configured defaults.
fn effective_config(base: PackingConfig, allow_side_laying: Option<bool>) -> PackingConfig {
    match allow_side_laying {
        Some(allowed) => PackingConfig {
            allow_side_laying: allowed,
            ..base
        },
        None => base,
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_recommend, handle_tile, handle_presets),
    components(
        schemas(
            PackRequest,
            PackResponse,
            RecommendRequest,
            RecommendResponse,
            TileRequest,
            ErrorResponse,
            Group,
            Container,
            ContainerType,
            Placement,
            OrientationKind,
            ContainerLoad,
            UnplacedGroup,
            PackingResult,
            GroupResult,
            StabilitySummary,
            StabilityIssue,
            Severity,
            WeightDistribution,
            RecommendationCandidate,
            TypeCount,
            TileResult,
            PatternRow,
            Rect,
            SingleBoxLimits,
            SingleBoxSummary
        )
    ),
    tags(
        (name = "packing", description = "Multi-container load planning"),
        (name = "planning", description = "Container recommendation and single-box tiling")
    )
)]
struct ApiDoc;

/// Builds the router with all endpoints.
fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/recommend", post(handle_recommend))
        .route("/tile", post(handle_tile))
        .route("/presets", get(handle_presets))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(ApiState { optimizer_config })
}

/// Starts the API server and serves until it terminates.
///
/// Fails when the configured address cannot be bound.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) -> std::io::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    log::info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() {
        log::info!("Local access: http://localhost:{}", config.port());
    }
    log::info!("Endpoints: POST /pack, /pack_stream, /recommend, /tile; GET /presets, /docs");

    axum::serve(listener, router(optimizer_config)).await
}

/// Handler for POST /pack.
///
/// Distributes the groups over the given containers and returns one packing
/// result per container.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing result per container", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    log::info!(
        "pack request: {} groups, {} containers",
        request.groups.len(),
        request.containers.len()
    );
    let config = effective_config(
        state.optimizer_config.packing_config(),
        request.allow_side_laying,
    );
    let options = DistributionOptions {
        spread_evenly: request.spread_evenly.unwrap_or(false),
    };

    let result = match tokio::task::spawn_blocking(move || {
        pack_containers(&request.groups, &request.containers, options, &config)
    })
    .await
    {
        Ok(result) => result,
        Err(err) => {
            log::error!("packing task failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Packing failed",
                err.to_string(),
            );
        }
    };

    log::info!(
        "pack result: {} placed in {} containers, {} groups with unplaced units",
        result.total_placed,
        result.container_count(),
        result.unplaced.len()
    );
    (StatusCode::OK, Json(PackResponse::from_distribution(result))).into_response()
}

/// Handler for POST /pack_stream (SSE).
///
/// Streams packing events as Server-Sent Events while the containers are packed.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request or container configuration",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let config = effective_config(
        state.optimizer_config.packing_config(),
        request.allow_side_laying,
    );
    let options = DistributionOptions {
        spread_evenly: request.spread_evenly.unwrap_or(false),
    };
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        pack_containers_with_progress(
            &request.groups,
            &request.containers,
            options,
            &config,
            |event| {
                if let Ok(json) = serde_json::to_string(event) {
                    // a closed receiver only means the client went away
                    let _ = tx.blocking_send(json);
                }
            },
        );
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /recommend.
#[utoipa::path(
    post,
    path = "/recommend",
    request_body = RecommendRequest,
    responses(
        (status = 200, description = "Ranked container combinations", body = RecommendResponse),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid groups or catalog", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_recommend(
    State(state): State<ApiState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    if let Err(err) = validate_groups(&request.groups) {
        return err.into_response();
    }

    let config = effective_config(
        state.optimizer_config.packing_config(),
        request.allow_side_laying,
    );
    let catalog = request.catalog.unwrap_or_else(container_presets);
    let total_requested = request.groups.iter().map(|g| u64::from(g.quantity)).sum();
    log::info!(
        "recommend request: {} groups, {} units, {} catalog types",
        request.groups.len(),
        total_requested,
        catalog.len()
    );

    let groups = request.groups;
    let candidates = match tokio::task::spawn_blocking(move || {
        recommend_containers(&groups, &catalog, &config)
    })
    .await
    {
        Ok(candidates) => candidates,
        Err(err) => {
            log::error!("recommendation task failed: {err}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Recommendation failed",
                err.to_string(),
            );
        }
    };

    log::info!("recommend result: {} candidates", candidates.len());
    (
        StatusCode::OK,
        Json(RecommendResponse {
            total_requested,
            candidates,
        }),
    )
        .into_response()
}

/// Handler for POST /tile.
#[utoipa::path(
    post,
    path = "/tile",
    request_body = TileRequest,
    responses(
        (status = 200, description = "Best single-box layout", body = SingleBoxSummary),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid box or space", body = ErrorResponse)
    ),
    tag = "planning"
)]
async fn handle_tile(
    State(state): State<ApiState>,
    payload: Result<Json<TileRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(err) => return json_deserialize_error(err),
    };
    if let Err(err) = validate_dims(request.box_dims, "Box") {
        return validation_error(err.to_string());
    }
    if let Err(err) = validate_dims(request.space_dims, "Container") {
        return container_config_error(err.to_string());
    }

    let allow_side_laying = request
        .allow_side_laying
        .unwrap_or(state.optimizer_config.packing_config().allow_side_laying);
    let tile = best_tile(request.box_dims, request.space_dims, allow_side_laying);
    let summary = summarize_single_box(tile, request.box_weight, &request.limits);
    log::info!(
        "tile request: {:?} in {:?} -> {} ({} boxes)",
        request.box_dims,
        request.space_dims,
        summary.tile.pattern,
        summary.capacity
    );

    (StatusCode::OK, Json(summary)).into_response()
}

/// Handler for GET /presets.
#[utoipa::path(
    get,
    path = "/presets",
    responses((status = 200, description = "Standard container types", body = [ContainerType])),
    tag = "planning"
)]
async fn handle_presets() -> Json<Vec<ContainerType>> {
    Json(container_presets())
}

async fn serve_openapi_json() -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui() -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ApiState {
        ApiState {
            optimizer_config: OptimizerConfig::default(),
        }
    }

    fn pack_request(json: &str) -> PackRequest {
        serde_json::from_str(json).expect("Should parse valid JSON")
    }

    const MINIMAL_PACK: &str = r#"{
        "groups": [{"id": 1, "dims": [500.0, 500.0, 500.0], "weight": 10.0, "quantity": 10}],
        "containers": [{"id": 0, "dims": [1000.0, 1000.0, 1000.0], "max_weight": 1000.0}]
    }"#;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/pack", "/pack_stream", "/recommend", "/tile", "/presets"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {path} path"
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["PackRequest", "PackResponse", "ErrorResponse", "PackingResult", "TileResult"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from the OpenAPI document",
                name
            );
        }
    }

    #[test]
    fn pack_request_parses_optional_flags() {
        let request = pack_request(MINIMAL_PACK);
        assert_eq!(request.allow_side_laying, None);
        assert_eq!(request.spread_evenly, None);

        let request = pack_request(
            r#"{ "groups": [], "containers": [], "allow_side_laying": false, "spread_evenly": null }"#,
        );
        assert_eq!(request.allow_side_laying, Some(false));
        assert_eq!(request.spread_evenly, None);
    }

    #[test]
    fn validation_rejects_bad_requests() {
        let empty = pack_request(r#"{ "groups": [], "containers": [] }"#);
        assert!(matches!(
            empty.into_validated(),
            Err(RequestValidationError::MissingContainers)
        ));

        let bad_group = pack_request(
            r#"{
                "groups": [{"id": 1, "dims": [0.0, 5.0, 5.0], "weight": 1.0, "quantity": 1}],
                "containers": [{"id": 0, "dims": [10.0, 10.0, 10.0], "max_weight": 100.0}]
            }"#,
        );
        assert!(matches!(
            bad_group.into_validated(),
            Err(RequestValidationError::InvalidGroup(_))
        ));

        let duplicate = pack_request(
            r#"{
                "groups": [
                    {"id": 1, "dims": [5.0, 5.0, 5.0], "weight": 1.0, "quantity": 1},
                    {"id": 1, "dims": [4.0, 4.0, 4.0], "weight": 1.0, "quantity": 1}
                ],
                "containers": [{"id": 0, "dims": [10.0, 10.0, 10.0], "max_weight": 100.0}]
            }"#,
        );
        assert!(matches!(
            duplicate.into_validated(),
            Err(RequestValidationError::DuplicateGroupId(1))
        ));

        let bad_container = pack_request(
            r#"{
                "groups": [],
                "containers": [{"id": 0, "dims": [10.0, 10.0, 10.0], "max_weight": 0.0}]
            }"#,
        );
        assert!(matches!(
            bad_container.into_validated(),
            Err(RequestValidationError::InvalidContainer(_))
        ));
    }

    #[test]
    fn request_override_applies_only_when_present() {
        let base = PackingConfig::builder().allow_side_laying(false).build();
        assert!(effective_config(base, Some(true)).allow_side_laying);
        assert!(!effective_config(base, None).allow_side_laying);

        let base = PackingConfig::default();
        assert!(!effective_config(base, Some(false)).allow_side_laying);
        assert_eq!(effective_config(base, Some(false)).max_iterations, base.max_iterations);
    }

    #[tokio::test]
    async fn pack_endpoint_returns_loads() {
        let response = handle_pack(State(state()), Ok(Json(pack_request(MINIMAL_PACK)))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["total_placed"], 8);
        assert_eq!(body["is_complete"], false);
        assert_eq!(body["unplaced"][0]["quantity"], 2);
        assert_eq!(body["loads"][0]["result"]["total_layers"], 2);
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_missing_containers() {
        let request = pack_request(r#"{ "groups": [], "containers": [] }"#);
        let response = handle_pack(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn tile_endpoint_validates_dimensions() {
        let request: TileRequest = serde_json::from_str(
            r#"{ "box_dims": [600.0, 400.0, 300.0], "box_weight": 10.0, "space_dims": [1200.0, 800.0, 900.0] }"#,
        )
        .unwrap();
        let response = handle_tile(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["capacity"], 12);

        let request: TileRequest = serde_json::from_str(
            r#"{ "box_dims": [600.0, -1.0, 300.0], "space_dims": [1200.0, 800.0, 900.0] }"#,
        )
        .unwrap();
        let response = handle_tile(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn recommend_endpoint_uses_presets_by_default() {
        let request: RecommendRequest = serde_json::from_str(
            r#"{ "groups": [{"id": 1, "dims": [1200.0, 1000.0, 1000.0], "weight": 100.0, "quantity": 2}] }"#,
        )
        .unwrap();
        let response = handle_recommend(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["total_requested"], 2);
        assert_eq!(body["candidates"][0]["type_counts"][0]["type_id"], 0);
    }
}
