use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::VisitorPass;
use crate::services::validator::{self, ScanError, ScanState, ValidationOutcome};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scans", post(start_scan).get(scan_state).delete(cancel_scan))
        .route("/scans/frames", post(submit_frame))
}

/// One decoded QR string from the gatekeeper's camera loop.
#[derive(Debug, Deserialize)]
pub struct ScanFrame {
    pub raw_text: String,
}

#[derive(Debug, Serialize)]
pub struct ScanStateResponse {
    /// `idle`, `scanning` or `done`.
    pub state: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OutcomeBody>,
}

#[derive(Debug, Serialize)]
pub struct OutcomeBody {
    /// `valid`, `expired`, `not_found` or `malformed`.
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass: Option<VisitorPass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<String>,
}

impl OutcomeBody {
    fn from_outcome(outcome: ValidationOutcome) -> Self {
        let now = Utc::now().naive_utc();
        match outcome {
            ValidationOutcome::Valid(pass) => Self {
                status: "valid",
                remaining: Some(validator::remaining_time(pass.end_date_time, now).to_string()),
                pass: Some(pass),
            },
            ValidationOutcome::Expired(pass) => Self {
                status: "expired",
                remaining: None,
                pass: Some(pass),
            },
            ValidationOutcome::NotFound => Self {
                status: "not_found",
                pass: None,
                remaining: None,
            },
            ValidationOutcome::Malformed => Self {
                status: "malformed",
                pass: None,
                remaining: None,
            },
        }
    }
}

fn state_response(state: &ScanState) -> ScanStateResponse {
    match state {
        ScanState::Idle => ScanStateResponse {
            state: "idle",
            result: None,
        },
        ScanState::Scanning => ScanStateResponse {
            state: "scanning",
            result: None,
        },
        ScanState::Done(outcome) => ScanStateResponse {
            state: "done",
            result: Some(OutcomeBody::from_outcome(outcome.clone())),
        },
    }
}

/// Begins a scanning session, discarding any previous result.
async fn start_scan(State(state): State<AppState>) -> Result<Json<ScanStateResponse>> {
    let mut scanner = state.scanner.lock().expect("scanner mutex poisoned");
    scanner.start();
    tracing::info!("Scan session started");
    Ok(Json(state_response(scanner.state())))
}

async fn scan_state(State(state): State<AppState>) -> Result<Json<ScanStateResponse>> {
    let scanner = state.scanner.lock().expect("scanner mutex poisoned");
    Ok(Json(state_response(scanner.state())))
}

/// Releases the scanning station without a result.
async fn cancel_scan(State(state): State<AppState>) -> Result<Json<ScanStateResponse>> {
    let mut scanner = state.scanner.lock().expect("scanner mutex poisoned");
    scanner.cancel();
    tracing::info!("Scan session cancelled");
    Ok(Json(state_response(scanner.state())))
}

/// Classifies one decoded frame. Responds with this frame's outcome plus the
/// session state; once a conclusive outcome has been reached, further frames
/// get that outcome back unchanged.
async fn submit_frame(
    State(state): State<AppState>,
    Json(frame): Json<ScanFrame>,
) -> Result<Json<ScanStateResponse>> {
    let now = Utc::now().naive_utc();
    let mut scanner = state.scanner.lock().expect("scanner mutex poisoned");

    let outcome = scanner
        .submit(&state.registry, &frame.raw_text, now)
        .map_err(|e| match e {
            ScanError::NoActiveScan => AppError::Conflict(e.to_string()),
            ScanError::Registry(inner) => AppError::from(inner),
        })?;

    let session_state = match scanner.state() {
        ScanState::Scanning => "scanning",
        ScanState::Done(_) => "done",
        ScanState::Idle => "idle",
    };
    let result = OutcomeBody::from_outcome(outcome);

    tracing::info!(outcome = result.status, "Scan frame classified");

    Ok(Json(ScanStateResponse {
        state: session_state,
        result: Some(result),
    }))
}
