//! REST API for the stuffing visualizer.
//!
//! Every request carries a complete plan; a fresh headless
//! [`StuffingVisualizer`] is built per request, so handlers share nothing
//! but configuration. Uses Axum as the web framework and supports CORS.

use std::sync::OnceLock;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::{StatusCode, Uri, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};

use crate::animation::PlaybackState;
use crate::config::{AppConfig, ReportConfig, ViewerConfig};
use crate::model::{
    CalculationData, ContainerData, ItemData, PlacementData, PlanStats, StuffingPlanData,
};
use crate::report::ReportOptions;
use crate::scene::{PickTag, PrimitiveDescription, PrimitiveId, PrimitiveKind, SceneDescription};
use crate::visualizer::{StuffingVisualizer, VisualizerError};

#[derive(Clone)]
struct ApiState {
    viewer_config: ViewerConfig,
    report_config: ReportConfig,
}

impl ApiState {
    fn viewer(&self) -> StuffingVisualizer {
        StuffingVisualizer::new(self.viewer_config.clone(), self.report_config.clone())
    }
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>stuffing-visualizer API Docs</title>
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
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Embedded Web Assets (HTML, CSS, JS)
#[derive(RustEmbed)]
#[folder = "web/"]
struct WebAssets;

/// Plan plus report overrides for `POST /report`.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "plan": {
            "plan_code": "PLN-0001",
            "container": {
                "name": "20ft Standard",
                "length_mm": 5898.0,
                "width_mm": 2352.0,
                "height_mm": 2393.0,
                "max_weight_kg": 28200.0,
                "volume_m3": 33.2
            },
            "items": [{
                "item_id": "box-a",
                "label": "Box A",
                "length_mm": 1200.0,
                "width_mm": 800.0,
                "height_mm": 1000.0,
                "weight_kg": 250.0,
                "quantity": 1,
                "color_hex": "#3399ff"
            }],
            "calculation": {
                "volume_utilization_pct": 2.9,
                "placements": [{
                    "placement_id": "p1",
                    "item_id": "box-a",
                    "pos_x": 0.0, "pos_y": 0.0, "pos_z": 0.0,
                    "rotation": 0,
                    "step_number": 1
                }]
            }
        },
        "options": { "company_name": "ACME Logistics" }
    })
)]
pub struct ReportRequest {
    pub plan: StuffingPlanData,
    #[serde(default)]
    pub options: ReportOptions,
}

/// Plan with an optional step cursor, for `POST /snapshot` and `POST /scene`.
///
/// Without a step the whole plan is shown.
#[derive(Deserialize, ToSchema)]
pub struct PlanRequest {
    pub plan: StuffingPlanData,
    #[serde(default)]
    #[schema(nullable = true)]
    pub step: Option<u32>,
}

/// Plan to animate for `POST /playback_stream`.
#[derive(Deserialize, ToSchema)]
pub struct PlaybackRequest {
    pub plan: StuffingPlanData,
    /// Overrides the configured step duration.
    #[serde(default)]
    #[schema(nullable = true)]
    pub step_duration_ms: Option<u64>,
}

/// Server-sent playback event.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    Started { max_step: u32 },
    Step { step: u32 },
    State { state: PlaybackState },
    Finished { step: u32 },
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

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn visualizer_error(err: VisualizerError) -> Response {
    match err {
        VisualizerError::Validation(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid plan data",
            err.to_string(),
        ),
        other => {
            log::error!("❌ Request failed: {}", other);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Visualization failed",
                other.to_string(),
            )
        }
    }
}

fn parse_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload
        .map(|Json(payload)| payload)
        .map_err(json_deserialize_error)
}

/// Builds a headless visualizer with `plan` loaded and the cursor at `step`.
fn load_viewer(
    state: &ApiState,
    plan: &StuffingPlanData,
    step: Option<u32>,
) -> Result<StuffingVisualizer, Response> {
    let mut viewer = state.viewer();
    viewer.load_data(plan).map_err(visualizer_error)?;
    if let Some(step) = step {
        viewer.set_step(step);
    }
    Ok(viewer)
}

/// Runs CPU-bound rendering on the blocking pool.
async fn run_blocking<T, F>(job: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, Response> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job).await.unwrap_or_else(|err| {
        log::error!("❌ Render task failed: {}", err);
        Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Visualization failed",
            err.to_string(),
        ))
    })
}

fn report_file_name(plan: &StuffingPlanData) -> String {
    let stem: String = plan
        .plan_code
        .as_deref()
        .unwrap_or("plan")
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("stuffing-{}.pdf", stem)
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_report, handle_snapshot, handle_scene, handle_playback_stream),
    components(
        schemas(
            ReportRequest,
            PlanRequest,
            PlaybackRequest,
            PlaybackEvent,
            PlaybackState,
            ReportOptions,
            StuffingPlanData,
            ContainerData,
            ItemData,
            PlacementData,
            CalculationData,
            PlanStats,
            SceneDescription,
            PrimitiveDescription,
            PrimitiveId,
            PrimitiveKind,
            PickTag,
            ErrorResponse
        )
    ),
    tags((name = "visualization", description = "Plan rendering, reports and playback"))
)]
struct ApiDoc;

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        // API endpoints
        .route("/report", post(handle_report))
        .route("/snapshot", post(handle_snapshot))
        .route("/scene", post(handle_scene))
        .route("/playback_stream", post(handle_playback_stream))
        // API documentation
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        // Web-UI (embedded)
        .route("/", get(serve_index))
        .route("/{*path}", get(serve_static))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server and blocks until it terminates.
///
/// Configures CORS for cross-origin requests from the frontend.
pub async fn start_api_server(config: AppConfig) -> std::io::Result<()> {
    let AppConfig {
        api,
        viewer,
        report,
    } = config;
    let app = router(ApiState {
        viewer_config: viewer,
        report_config: report,
    });

    let addr = api.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let display_host = api.display_host().to_string();
    log::info!("🚀 Server running on http://{}:{}", display_host, api.port());
    if api.binds_to_all_interfaces() {
        log::info!("💡 Local access: http://localhost:{}", api.port());
    }
    log::info!("📦 API Endpoints:");
    log::info!("   - POST /report");
    log::info!("   - POST /snapshot");
    log::info!("   - POST /scene");
    log::info!("   - POST /playback_stream");
    log::info!("📑 Documentation:");
    log::info!("   - GET /docs");
    log::info!("   - GET /docs/openapi.json");
    log::info!("🌐 Web-UI: http://{}:{}", display_host, api.port());

    axum::serve(listener, app).await
}

/// Handler for POST /report.
///
/// Renders the summary page and one page per loading step into a PDF.
#[utoipa::path(
    post,
    path = "/report",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf", body = Vec<u8>),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid plan data", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Report generation failed", body = ErrorResponse)
    ),
    tag = "visualization"
)]
async fn handle_report(
    State(state): State<ApiState>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    log::info!(
        "📥 Report request: {} placements",
        request.plan.calculation.placements.len()
    );
    let file_name = report_file_name(&request.plan);
    let rendered = run_blocking(move || {
        let mut viewer = load_viewer(&state, &request.plan, None)?;
        viewer
            .render_report(&request.options)
            .map_err(visualizer_error)
    })
    .await;

    match rendered {
        Ok(bytes) => {
            let disposition = format!("attachment; filename=\"{}\"", file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(response) => response,
    }
}

/// Handler for POST /snapshot.
///
/// Captures the fitted isometric view with items visible up to `step`.
#[utoipa::path(
    post,
    path = "/snapshot",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "PNG image", content_type = "image/png", body = Vec<u8>),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid plan data", body = ErrorResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Capture failed", body = ErrorResponse)
    ),
    tag = "visualization"
)]
async fn handle_snapshot(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let captured = run_blocking(move || {
        let mut viewer = load_viewer(&state, &request.plan, request.step)?;
        let shot = viewer.capture_step_snapshot().map_err(visualizer_error)?;
        Ok((viewer.get_current_step(), shot))
    })
    .await;

    match captured {
        Ok((step, shot)) => {
            log::info!("📷 Snapshot at step {}: {} bytes", step, shot.png.len());
            ([(header::CONTENT_TYPE, "image/png")], shot.png).into_response()
        }
        Err(response) => response,
    }
}

/// Handler for POST /scene.
///
/// Returns the render primitives for remote front-ends.
#[utoipa::path(
    post,
    path = "/scene",
    request_body = PlanRequest,
    responses(
        (status = 200, description = "Scene description", body = SceneDescription),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid plan data", body = ErrorResponse)
    ),
    tag = "visualization"
)]
async fn handle_scene(
    State(state): State<ApiState>,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let described = run_blocking(move || {
        let viewer = load_viewer(&state, &request.plan, request.step)?;
        viewer
            .scene_description()
            .ok_or_else(|| visualizer_error(VisualizerError::NotLoaded))
    })
    .await;

    match described {
        Ok(description) => (StatusCode::OK, Json(description)).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /playback_stream endpoint (SSE).
///
/// Plays the plan from step 0 and streams each step change as it happens.
#[utoipa::path(
    post,
    path = "/playback_stream",
    request_body = PlaybackRequest,
    responses(
        (
            status = 200,
            description = "Streams playback events in real-time",
            content_type = "text/event-stream",
            body = PlaybackEvent
        ),
        (status = UNPROCESSABLE_ENTITY, description = "Invalid plan data", body = ErrorResponse)
    ),
    tag = "visualization"
)]
async fn handle_playback_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PlaybackRequest>, JsonRejection>,
) -> Response {
    let request = match parse_payload(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let mut config = state.viewer_config.clone();
    if let Some(ms) = request.step_duration_ms.filter(|ms| *ms > 0) {
        config.step_duration = Duration::from_millis(ms);
    }
    let state = ApiState {
        viewer_config: config,
        report_config: state.report_config,
    };
    let viewer = match load_viewer(&state, &request.plan, None) {
        Ok(viewer) => viewer,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::unbounded_channel::<PlaybackEvent>();
    tokio::spawn(drive_playback(
        viewer,
        state.viewer_config.step_duration,
        tx,
    ));

    let stream = UnboundedReceiverStream::new(rx).map(|evt| {
        let data = serde_json::to_string(&evt).unwrap_or_default();
        Ok::<_, std::convert::Infallible>(Event::default().data(data))
    });
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Runs playback on the interval timer until the last step is reached or
/// the receiver hangs up.
async fn drive_playback(
    mut viewer: StuffingVisualizer,
    step_duration: Duration,
    tx: mpsc::UnboundedSender<PlaybackEvent>,
) {
    let step_tx = tx.clone();
    let _step_sub = viewer.on_step_change(move |step| {
        // receiver gone; the loop below notices and stops
        let _ = step_tx.send(PlaybackEvent::Step { step: *step });
    });
    let state_tx = tx.clone();
    let _state_sub = viewer.on_play_state_change(move |state| {
        let _ = state_tx.send(PlaybackEvent::State { state: *state });
    });

    if tx
        .send(PlaybackEvent::Started {
            max_step: viewer.get_max_step(),
        })
        .is_err()
    {
        return;
    }

    let mut ticker = tokio::time::interval(step_duration);
    let start = ticker.tick().await;
    viewer.play_at(start.into_std());
    while viewer.is_playing() {
        let now = ticker.tick().await;
        if tx.is_closed() {
            log::debug!("🔌 Playback client disconnected");
            viewer.pause();
            return;
        }
        viewer.tick_at(now.into_std());
    }

    let _ = tx.send(PlaybackEvent::Finished {
        step: viewer.get_current_step(),
    });
}

/// Serves the index.html main page
async fn serve_index() -> Response {
    match WebAssets::get("index.html") {
        Some(content) => Html(content.data).into_response(),
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

/// Serves static assets (JS, CSS, etc.)
async fn serve_static(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');

    match WebAssets::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "404 Not Found").into_response(),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::two_cube_plan_data;

    fn state() -> ApiState {
        ApiState {
            viewer_config: ViewerConfig::builder().capture_size(96, 54).build(),
            report_config: ReportConfig::default(),
        }
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body must be readable")
            .to_vec()
    }

    fn invalid_plan() -> StuffingPlanData {
        let mut plan = two_cube_plan_data();
        plan.container.length_mm = -1.0;
        plan
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/report", "/snapshot", "/scene", "/playback_stream"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {} path",
                path
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
        for name in [
            "ReportRequest",
            "PlanRequest",
            "SceneDescription",
            "PlaybackEvent",
            "ErrorResponse",
        ] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI spec",
                name
            );
        }
    }

    #[test]
    fn report_request_defaults_options_when_absent() {
        let plan = serde_json::to_value(two_cube_plan_data()).expect("fixture serializes");
        let request: ReportRequest =
            serde_json::from_value(json!({ "plan": plan })).expect("Should parse valid JSON");
        assert!(request.options.title.is_none());
        assert!(request.options.include_screenshot.is_none());
    }

    #[test]
    fn report_file_name_is_header_safe() {
        let mut plan = two_cube_plan_data();
        assert_eq!(report_file_name(&plan), "stuffing-PLN-0001.pdf");
        plan.plan_code = Some("a/b \"c\"".into());
        assert_eq!(report_file_name(&plan), "stuffing-a_b__c_.pdf");
        plan.plan_code = None;
        assert_eq!(report_file_name(&plan), "stuffing-plan.pdf");
    }

    #[tokio::test]
    async fn report_endpoint_returns_a_pdf() {
        let request = ReportRequest {
            plan: two_cube_plan_data(),
            options: ReportOptions::default(),
        };
        let response = handle_report(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/pdf"
        );
        assert!(body_bytes(response).await.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn invalid_plan_is_unprocessable() {
        let request = ReportRequest {
            plan: invalid_plan(),
            options: ReportOptions::default(),
        };
        let response = handle_report(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("error body is JSON");
        assert_eq!(body["error"], "Invalid plan data");
    }

    #[tokio::test]
    async fn snapshot_endpoint_returns_a_png() {
        let request = PlanRequest {
            plan: two_cube_plan_data(),
            step: Some(1),
        };
        let response = handle_snapshot(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let png = body_bytes(response).await;
        let image = image::load_from_memory(&png).expect("valid png");
        assert_eq!((image.width(), image.height()), (96, 54));
    }

    #[tokio::test]
    async fn scene_endpoint_honors_the_step() {
        let request = PlanRequest {
            plan: two_cube_plan_data(),
            step: Some(1),
        };
        let response = handle_scene(State(state()), Ok(Json(request))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("scene is JSON");
        assert_eq!(body["max_step"], 2);
        let visible_items = body["primitives"]
            .as_array()
            .expect("primitives array")
            .iter()
            .filter(|p| p["kind"] == "item_solid" && p["visible"] == true)
            .count();
        assert_eq!(visible_items, 1);
    }

    #[tokio::test]
    async fn panicking_render_task_maps_to_server_error() {
        let result: Result<(), Response> = run_blocking(|| panic!("rasterizer crashed")).await;
        let response = result.expect_err("a panicked task must not succeed");
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value =
            serde_json::from_slice(&body_bytes(response).await).expect("error body is JSON");
        assert_eq!(body["error"], "Visualization failed");
    }

    #[tokio::test]
    async fn render_work_leaves_the_runtime_thread() {
        let runtime_thread = std::thread::current().id();
        let worker_thread = run_blocking(|| Ok(std::thread::current().id()))
            .await
            .expect("task completes");
        assert_ne!(worker_thread, runtime_thread);
    }

    #[tokio::test]
    async fn playback_streams_every_step_then_finishes() {
        let mut viewer = state().viewer();
        viewer.load_data(&two_cube_plan_data()).unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        drive_playback(viewer, Duration::from_millis(1), tx).await;

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                PlaybackEvent::Started { max_step: 2 },
                PlaybackEvent::Step { step: 0 },
                PlaybackEvent::State {
                    state: PlaybackState::Playing
                },
                PlaybackEvent::Step { step: 1 },
                PlaybackEvent::Step { step: 2 },
                PlaybackEvent::State {
                    state: PlaybackState::Paused
                },
                PlaybackEvent::Finished { step: 2 },
            ]
        );
    }

    #[tokio::test]
    async fn playback_stops_when_the_client_leaves() {
        let mut viewer = state().viewer();
        viewer.load_data(&two_cube_plan_data()).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        // returns instead of playing forever
        drive_playback(viewer, Duration::from_millis(1), tx).await;
    }
}
