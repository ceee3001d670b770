// API module - HTTP endpoints

use std::sync::{Arc, Mutex};

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::services::registry::PassRegistry;
use crate::services::validator::ScanSession;

pub mod health;
pub mod passes;
pub mod scans;

#[derive(Clone)]
pub struct AppState {
    pub registry: PassRegistry,
    /// Single gatekeeper scanning station; held briefly, never across awaits.
    pub scanner: Arc<Mutex<ScanSession>>,
}

impl AppState {
    pub fn new(registry: PassRegistry) -> Self {
        Self {
            registry,
            scanner: Arc::new(Mutex::new(ScanSession::new())),
        }
    }
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .merge(passes::router())
        .merge(scans::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
