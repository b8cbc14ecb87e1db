//! HTTP routes and their request/response types.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::error;

use kipper_core::{
    model::{ClusterLimits, ProviderId},
    service::{AllocationRequest, AllocationService, RenderOutcome},
};

use crate::data;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Shared state handed to every request handler.
pub struct AppState {
    /// Allocation service facade.
    pub service: AllocationService,
    /// JSON file holding the ordered district registry.
    pub districts_file: PathBuf,
    /// CSV file holding the bin weighing records.
    pub weights_file: PathBuf,
    /// Provider used for geocoding and route rendering.
    pub provider: ProviderId,
    /// Bounds for cluster growth.
    pub limits: ClusterLimits,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/run_allocation", post(run_allocation))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct RunAllocationForm {
    #[serde(default)]
    selected_date: Option<String>,
}

#[derive(Debug, Serialize)]
struct VehicleResponse {
    vehicle_id: String,
    assigned_districts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    map_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(message: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_owned(),
        }),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "An error occurred during allocation.".to_owned(),
        }),
    )
        .into_response()
}

/// Run one allocation for the posted date and answer with the per-vehicle
/// district lists and map artifacts.
async fn run_allocation(
    State(state): State<Arc<AppState>>,
    Form(form): Form<RunAllocationForm>,
) -> Response {
    let Some(selected_date) = form
        .selected_date
        .map(|date| date.trim().to_owned())
        .filter(|date| !date.is_empty())
    else {
        return bad_request("No date provided");
    };

    // The aggregator matches dates as string prefixes; reject anything that
    // is not a real calendar date before it gets that far.
    if NaiveDate::parse_from_str(&selected_date, DATE_FORMAT).is_err() {
        return bad_request("Invalid date, expected YYYY-MM-DD");
    }

    let districts = match data::load_districts(&state.districts_file) {
        Ok(districts) => districts,
        Err(err) => {
            error!(error = %err, "failed to load district registry");
            return internal_error();
        }
    };
    let records = match data::load_weight_records(&state.weights_file) {
        Ok(records) => records,
        Err(err) => {
            error!(error = %err, "failed to load weight records");
            return internal_error();
        }
    };

    let request = AllocationRequest {
        provider: state.provider.clone(),
        selected_date,
        limits: state.limits,
    };

    match state.service.allocate(&request, &districts, &records).await {
        Ok(report) => {
            let vehicles: Vec<VehicleResponse> = report
                .vehicles
                .into_iter()
                .map(|route| {
                    let (map_url, render_error) = match route.outcome {
                        RenderOutcome::Rendered(artifact) => (Some(artifact.0), None),
                        RenderOutcome::Failed(reason) => (None, Some(reason)),
                    };
                    VehicleResponse {
                        vehicle_id: route.vehicle.0,
                        assigned_districts: route
                            .districts
                            .into_iter()
                            .map(|district| district.0)
                            .collect(),
                        map_url,
                        error: render_error,
                    }
                })
                .collect();
            Json(vehicles).into_response()
        }
        Err(err) => {
            error!(error = %err, "allocation failed");
            internal_error()
        }
    }
}
