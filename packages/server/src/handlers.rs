//! HTTP handler functions for the raid map API.

use actix_web::{HttpResponse, web};
use raid_map_server_models::{ApiHealth, ApiRefresh};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /raids`
///
/// Returns the full cached dataset as a JSON array.
pub async fn raids(state: web::Data<AppState>) -> HttpResponse {
    let run = state.store.get();
    HttpResponse::Ok().json(run.as_ref())
}

/// `POST /api/refresh`
///
/// Re-runs the pipeline and replaces the cached dataset before
/// responding. Also routed as `GET`; see [`crate::configure`].
pub async fn refresh(state: web::Data<AppState>) -> HttpResponse {
    log::info!("Manual refresh requested");
    let summary = state.refresh().await;
    HttpResponse::Ok().json(summary)
}
