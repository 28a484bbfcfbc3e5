//! HTTP surface for the growth calculator.
//!
//! One JSON endpoint plus a health check, with OpenAPI/Swagger documentation.
//! The router is built here so integration tests can drive it in-process;
//! the binary in `main.rs` only wires configuration and serves it.

use std::time::Duration;

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Serialize;
use tower::{ServiceBuilder, buffer::BufferLayer, limit::RateLimitLayer};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use growthcalc_core::age::CalendarAge;
use growthcalc_core::metrics::{GhDose, HeightVelocity};
use growthcalc_core::models::{
    BmiResult, BoneAgeAssessmentInput, BoneAgeResult, CorrectedMeasurementResult, GrowthResults,
    MeasurementResult, MidParentalHeightResult, PreviousMeasurementInput,
};
use growthcalc_core::types::BsaMethod;
use growthcalc_core::{CalculateRequest, CalculateResponse, GrowthService};

/// Application state shared across REST API handlers
///
/// Holds the calculation service; everything behind it is stateless, so the
/// state is cheap to clone per request.
#[derive(Clone)]
pub struct AppState {
    service: GrowthService,
}

/// Request throttling for the calculate endpoint.
///
/// Disabled by default; deployments exposed to the open internet can cap the
/// request rate without a fronting proxy.
#[derive(Clone, Copy, Debug)]
pub enum RateLimiting {
    Disabled,
    Enabled { max_requests: u64, per: Duration },
}

/// Health check response body.
#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, calculate),
    components(schemas(
        HealthRes,
        CalculateRequest,
        PreviousMeasurementInput,
        BoneAgeAssessmentInput,
        CalculateResponse,
        GrowthResults,
        CalendarAge,
        MeasurementResult,
        BmiResult,
        CorrectedMeasurementResult,
        MidParentalHeightResult,
        BoneAgeResult,
        BsaMethod,
        GhDose,
        HeightVelocity
    ))
)]
struct ApiDoc;

/// Build the application router.
///
/// Panics anywhere in a handler are converted to plain 500s by the outermost
/// layer, so one poisoned request cannot take the process down.
pub fn app(service: GrowthService, rate_limiting: RateLimiting) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/calculate", post(calculate))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(CatchPanicLayer::new())
        .with_state(AppState { service });

    match rate_limiting {
        RateLimiting::Disabled => router,
        RateLimiting::Enabled { max_requests, per } => router.layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|err: BoxError| async move {
                    (
                        StatusCode::TOO_MANY_REQUESTS,
                        format!("Too many requests: {err}"),
                    )
                }))
                .layer(BufferLayer::new(1024))
                .layer(RateLimitLayer::new(max_requests, per)),
        ),
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint
///
/// Used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "growth calculator is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/calculate",
    request_body = CalculateRequest,
    responses(
        (status = 200, description = "Calculation results", body = CalculateResponse),
        (status = 400, description = "Invalid input", body = CalculateResponse)
    )
)]
/// Run the growth calculation for one set of measurements
///
/// Validates the posted demographics and measurements, then computes ages,
/// centiles, SDS and the derived metrics. Validation failures and
/// out-of-range SDS values return a 400 with a structured error and an
/// `ERR_*` code; advisory messages ride along in `validation_messages` on
/// success.
///
/// # Returns
/// * `(StatusCode, Json<CalculateResponse>)` - 200 with results, or 400 with
///   the error envelope
async fn calculate(
    State(state): State<AppState>,
    Json(req): Json<CalculateRequest>,
) -> (StatusCode, Json<CalculateResponse>) {
    match state.service.calculate(&req) {
        Ok(results) => (StatusCode::OK, Json(CalculateResponse::success(results))),
        Err(e) => {
            tracing::info!(code = e.code(), "calculation rejected: {}", e);
            (StatusCode::BAD_REQUEST, Json(CalculateResponse::failure(&e)))
        }
    }
}
