use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Serialize;

use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::models::{IssuePassRequest, VisitorPass};
use crate::services::{codec, qr_generator, validator};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/passes", post(issue_pass).get(list_passes))
        .route("/passes/:id", get(show_pass))
        .route("/passes/:id/qr.svg", get(pass_qr_svg))
        .route("/passes/:id/qr.png", get(pass_qr_png))
}

#[derive(Debug, Serialize)]
pub struct PassResponse {
    #[serde(flatten)]
    pub pass: VisitorPass,
    /// Encoded payload string rendered in the pass's QR code.
    pub payload: String,
    /// Remaining validity relative to the server clock, e.g. `0d 5h 30m`.
    pub remaining: String,
}

impl PassResponse {
    fn from_pass(pass: VisitorPass) -> Self {
        let payload = codec::encode(&pass);
        let remaining =
            validator::remaining_time(pass.end_date_time, Utc::now().naive_utc()).to_string();
        Self {
            pass,
            payload,
            remaining,
        }
    }
}

async fn issue_pass(
    State(state): State<AppState>,
    Json(request): Json<IssuePassRequest>,
) -> Result<(StatusCode, Json<PassResponse>)> {
    let pass = state.registry.create(&request, Utc::now())?;
    Ok((StatusCode::CREATED, Json(PassResponse::from_pass(pass))))
}

async fn list_passes(State(state): State<AppState>) -> Result<Json<Vec<VisitorPass>>> {
    Ok(Json(state.registry.list_all()?))
}

async fn show_pass(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PassResponse>> {
    let pass = find_pass(&state, &id)?;
    Ok(Json(PassResponse::from_pass(pass)))
}

async fn pass_qr_svg(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let pass = find_pass(&state, &id)?;
    let svg = qr_generator::generate_qr_svg(&codec::encode(&pass))?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

async fn pass_qr_png(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let pass = find_pass(&state, &id)?;
    let png = qr_generator::generate_qr_png(&codec::encode(&pass))?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

fn find_pass(state: &AppState, id: &str) -> Result<VisitorPass> {
    state
        .registry
        .lookup_by_id(id)?
        .ok_or_else(|| AppError::NotFound(format!("Pass {id} is not registered")))
}
