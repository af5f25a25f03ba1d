#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the raid map application.
//!
//! Runs the extraction and geocoding pipeline once at startup, caches the
//! result in a [`ReportStore`], and serves it to the map frontend. The
//! cache is rebuilt only when the refresh endpoint is hit.

mod handlers;
pub mod store;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use raid_map_pipeline::{Pipeline, PipelineConfig};
use raid_map_scraper::firecrawl::FirecrawlConfig;
use raid_map_server_models::ApiRefresh;

pub use store::ReportStore;

/// Shared application state.
pub struct AppState {
    /// Latest complete pipeline run.
    pub store: Arc<ReportStore>,
    /// Pipeline used to rebuild the store.
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Creates state with an empty store.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            store: Arc::new(ReportStore::default()),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Runs the pipeline and swaps the result into the store.
    ///
    /// If the board cannot be fetched the previous run stays in place and
    /// the summary describes it with `stale` set. A board that is
    /// reachable but empty does replace the store.
    pub async fn refresh(&self) -> ApiRefresh {
        match self.pipeline.try_run().await {
            Ok(run) => {
                let summary = ApiRefresh::from(&run);
                let previous = self.store.replace(run);
                log::info!(
                    "Report cache replaced: {} records (previously {})",
                    summary.count,
                    previous.len()
                );
                summary
            }
            Err(e) => {
                let current = self.store.get();
                log::warn!(
                    "Board fetch failed, keeping {} cached records: {e}",
                    current.len()
                );
                ApiRefresh {
                    stale: true,
                    ..ApiRefresh::from(current.as_ref())
                }
            }
        }
    }
}

/// Bind settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`, default `127.0.0.1`).
    pub bind_addr: String,
    /// Port to bind (`PORT`, default `8080`).
    pub port: u16,
}

impl ServerConfig {
    /// Reads `BIND_ADDR` and `PORT`, falling back to defaults for missing
    /// or unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { bind_addr, port }
    }
}

/// Registers the API routes.
///
/// `/api/refresh` answers `GET` as well as `POST` so it can be hit from a
/// browser. Combined with the [`cors`] policy this means any web page can
/// trigger a full re-scrape (a paid Firecrawl request plus one geocoding
/// request per entry) with a plain cross-origin `GET`. Put the server
/// behind something that filters that route if this matters.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/raids", web::get().to(handlers::raids)).service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/refresh", web::post().to(handlers::refresh))
            .route("/refresh", web::get().to(handlers::refresh)),
    );
}

/// Cross-origin policy: any origin may read the dataset.
#[must_use]
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET"])
        .allow_any_header()
}

/// Starts the raid map API server.
///
/// Loads `.env`, wires the production pipeline, performs the initial run
/// (blocking until it finishes), and then serves requests. This is a
/// regular async function; the caller provides the runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP client or pipeline
/// cannot be built, or if the HTTP server fails to bind or encounters a
/// runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init_custom_env("RUST_LOG");

    let client = reqwest::Client::builder()
        .user_agent(concat!("raid-map/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(std::io::Error::other)?;

    let pipeline = Pipeline::production(
        &client,
        FirecrawlConfig::from_env(),
        PipelineConfig::from_env(),
    )
    .map_err(std::io::Error::other)?;

    let state = web::Data::new(AppState::new(pipeline));

    log::info!("Running initial pipeline...");
    state.refresh().await;

    let ServerConfig { bind_addr, port } = ServerConfig::from_env();

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(cors())
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use actix_web::http::{StatusCode, header};
    use actix_web::test as actix_test;
    use async_trait::async_trait;
    use raid_map_geocoder::{GeocodeError, GeocodedAddress, Geocoder};
    use raid_map_report_models::{Coordinates, GeoResult, PipelineRun};
    use raid_map_scraper::selector::SelectorExtractor;
    use raid_map_scraper::{ContentSource, ScrapeError, StaticSource};
    use raid_map_server_models::ApiHealth;

    use super::*;

    const BOARD: &str = r#"<html><body>
        <div class="text-body-small line-clamp-1 break-word-anywhere whitespace-break-spaces text-dark-text-100">123 Main St, Springfield, IL, USA</div>
        <div class="text-body-small line-clamp-1 break-word-anywhere whitespace-break-spaces text-dark-text-100">(40.7,-74.0)</div>
        <div class="text-body-small line-clamp-1 break-word-anywhere whitespace-break-spaces text-dark-text-100">Unknown Location</div>
    </body></html>"#;

    struct StubGeocoder;

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<GeocodedAddress>, GeocodeError> {
            Ok(query.contains("Springfield").then(|| GeocodedAddress {
                coordinates: Coordinates::new(39.78, -89.65),
                matched_address: None,
                score: None,
            }))
        }

        async fn reverse_geocode(
            &self,
            _coordinates: Coordinates,
        ) -> Result<Option<String>, GeocodeError> {
            Ok(Some("New York, NY".to_string()))
        }
    }

    struct UnreachableSource;

    #[async_trait]
    impl ContentSource for UnreachableSource {
        async fn fetch_markup(&self, _url: &str) -> Result<String, ScrapeError> {
            Err(ScrapeError::Config("FIRECRAWL_API is not set".to_string()))
        }
    }

    fn run_of_one() -> PipelineRun {
        PipelineRun::new(vec![GeoResult {
            id: 0,
            lat: Some(1.0),
            lon: Some(2.0),
            city: None,
            date: chrono::NaiveDate::from_ymd_opt(2025, 6, 14).unwrap(),
        }])
    }

    fn state(markup: &str) -> web::Data<AppState> {
        web::Data::new(AppState::new(Pipeline::new(
            Arc::new(StaticSource::new(markup)),
            Arc::new(SelectorExtractor::board()),
            Arc::new(StubGeocoder),
            PipelineConfig::default(),
        )))
    }

    #[actix_web::test]
    async fn raids_is_empty_before_first_run() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(BOARD))
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/raids").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn refresh_replaces_served_dataset() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(BOARD))
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/api/refresh").to_request();
        let summary: ApiRefresh = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(summary.count, 3);
        assert_eq!(summary.located, 2);

        let req = actix_test::TestRequest::get().uri("/raids").to_request();
        let run: PipelineRun = actix_test::call_and_read_body_json(&app, req).await;
        let results = run.results();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|r| r.id).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(results[0].city.as_deref(), Some("Springfield"));
        assert_eq!(results[1].city.as_deref(), Some("New York"));
        assert_eq!(results[1].lat, Some(40.7));
        assert_eq!(results[2].lat, None);
        assert_eq!(results[2].city.as_deref(), Some("Unknown Location"));
        assert_eq!(summary.date, run.date());
    }

    #[actix_web::test]
    async fn raids_serializes_absent_fields_as_null() {
        let data = state(BOARD);
        data.refresh().await;
        let app = actix_test::init_service(App::new().app_data(data).configure(configure)).await;

        let req = actix_test::TestRequest::get().uri("/raids").to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;
        assert!(body[2]["lat"].is_null());
        assert!(body[2]["lon"].is_null());
        assert_eq!(body[2]["id"], 2);
    }

    #[actix_web::test]
    async fn refresh_with_empty_board_clears_dataset() {
        let data = state("");
        data.store.replace(run_of_one());
        let summary = data.refresh().await;
        assert_eq!(summary.count, 0);
        assert_eq!(summary.date, None);
        assert!(!summary.stale);
        assert!(data.store.get().is_empty());
    }

    #[actix_web::test]
    async fn failed_fetch_keeps_previous_dataset() {
        let data = web::Data::new(AppState::new(Pipeline::new(
            Arc::new(UnreachableSource),
            Arc::new(SelectorExtractor::board()),
            Arc::new(StubGeocoder),
            PipelineConfig::default(),
        )));
        data.store.replace(run_of_one());
        let app = actix_test::init_service(
            App::new()
                .app_data(data.clone())
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::post().uri("/api/refresh").to_request();
        let summary: ApiRefresh = actix_test::call_and_read_body_json(&app, req).await;
        assert!(summary.stale);
        assert_eq!(summary.count, 1);
        assert_eq!(summary.located, 1);

        let req = actix_test::TestRequest::get().uri("/raids").to_request();
        let run: PipelineRun = actix_test::call_and_read_body_json(&app, req).await;
        assert_eq!(run, run_of_one());
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let app = actix_test::init_service(
            App::new()
                .app_data(state(""))
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get().uri("/api/health").to_request();
        let health: ApiHealth = actix_test::call_and_read_body_json(&app, req).await;
        assert!(health.healthy);
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn cross_origin_reads_are_allowed() {
        let app = actix_test::init_service(
            App::new()
                .wrap(cors())
                .app_data(state(""))
                .configure(configure),
        )
        .await;

        let req = actix_test::TestRequest::get()
            .uri("/raids")
            .insert_header((header::ORIGIN, "https://map.example.org"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
    }

    #[test]
    fn server_config_defaults() {
        // Safety: test-only; no other test reads these variables.
        unsafe {
            std::env::remove_var("BIND_ADDR");
            std::env::set_var("PORT", "not-a-port");
        }
        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.port, 8080);
        unsafe {
            std::env::remove_var("PORT");
        }
    }
}
