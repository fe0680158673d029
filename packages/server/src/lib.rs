#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web server for the exposure map dashboard.
//!
//! Loads and geocodes the monitoring export once at startup, then serves
//! the filter options and rendered map figures as JSON alongside the static
//! dashboard page in `app/`. Every figure request is a single synchronous
//! [`render`](exposure_map_render::render) call over the shared, read-only
//! [`Dataset`].

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use exposure_map_cli_utils::{IndicatifProgress, MultiProgress};
use exposure_map_geocoder::{GeocodeError, build_geocoder, service_registry};
use exposure_map_loader::{LoadError, load_dataset};
use exposure_map_render::default_selection;
use exposure_map_render_models::FilterSelection;
use exposure_map_sample_models::Dataset;
use thiserror::Error;

/// Export read when `--data` is not given.
pub const DEFAULT_DATA_FILE: &str = "rawDump_1.csv";
/// Address bound when neither `--bind` nor `BIND_ADDR` is set.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
/// Port used when neither `--port` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 8100;
/// Directory holding the dashboard page.
pub const DEFAULT_APP_DIR: &str = "app";

/// Errors that abort server startup.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding or running the HTTP server failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The export could not be loaded.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The geocoder could not be constructed.
    #[error("Geocoder setup failed: {0}")]
    Geocode(#[from] GeocodeError),
}

/// Shared application state.
pub struct AppState {
    /// The enriched samples, frozen at startup.
    pub dataset: Arc<Dataset>,
    /// Selection used for query parameters the client leaves out.
    pub defaults: FilterSelection,
}

impl AppState {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        let defaults = default_selection(&dataset);
        Self {
            dataset: Arc::new(dataset),
            defaults,
        }
    }
}

/// Startup configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the delimited monitoring export.
    pub data: PathBuf,
    /// Field delimiter of the export.
    pub delimiter: u8,
    pub bind: String,
    pub port: u16,
    /// Overrides the geocoding service's endpoint.
    pub geocoder_url: Option<String>,
    /// Directory served at `/`.
    pub app_dir: PathBuf,
}

/// `BIND_ADDR`, or [`DEFAULT_BIND_ADDR`].
#[must_use]
pub fn env_bind_addr() -> String {
    std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

/// `PORT`, or [`DEFAULT_PORT`] when unset or unparseable.
#[must_use]
pub fn env_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/options", web::get().to(handlers::options))
            .route("/figure", web::get().to(handlers::figure))
            .route("/samples", web::get().to(handlers::samples)),
    );
}

/// Loads the dataset described by `config` and serves it until shutdown.
///
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if the geocoder cannot be built, the export
/// cannot be loaded, or the HTTP server fails to bind or run.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig, multi: &MultiProgress) -> Result<(), ServerError> {
    let service = service_registry::default_service();
    let geocoder = build_geocoder(&service, config.geocoder_url.as_deref())?;

    let progress = IndicatifProgress::geocode_bar(multi, "Geocoding addresses");
    let dataset = load_dataset(
        &config.data,
        config.delimiter,
        geocoder.as_ref(),
        &progress,
    )
    .await?;

    let state = web::Data::new(AppState::new(dataset));
    let app_dir = config.app_dir;

    log::info!("Starting server on {}:{}", config.bind, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            .service(Files::new("/", app_dir.clone()).index_file("index.html"))
    })
    .bind((config.bind.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
