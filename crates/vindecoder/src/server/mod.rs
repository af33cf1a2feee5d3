//! HTTP API.
//!
//! A small actix-web application exposing the decoder as JSON endpoints
//! and serving the imported logo and region icon files. All database work runs on the
//! blocking thread pool against one shared [`Storage`].

mod error;
mod handlers;

use std::path::PathBuf;
use std::sync::Mutex;

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;

pub use error::ApiError;
pub use handlers::{DecodeRequest, HealthResponse};

/// State shared by all workers.
#[derive(Debug)]
pub struct AppState {
    /// The WMI database.
    pub storage: Mutex<Storage>,
    /// Directory logo thumbnails are served from.
    pub logo_dir: PathBuf,
    /// Directory region icons are served from.
    pub region_icon_dir: PathBuf,
}

impl AppState {
    /// Wrap a storage for sharing between workers, serving images from
    /// the configured output directories.
    #[must_use]
    pub fn new(storage: Storage, config: &Config) -> Self {
        Self {
            storage: Mutex::new(storage),
            logo_dir: config.logo_output_dir(),
            region_icon_dir: config.region_icon_output_dir(),
        }
    }
}

/// Register every route of the API.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::decode)
        .service(handlers::generate)
        .service(handlers::factory_logos)
        .service(handlers::logo_file)
        .service(handlers::region_icon_file)
        .service(handlers::health);
}

/// Run the HTTP server until it is stopped.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the address
/// cannot be bound.
pub fn serve(config: &Config) -> Result<()> {
    let storage = Storage::open(config.database_path())?;
    if storage.factory_count()? == 0 {
        warn!("Database has no factories; run `vind seed` first");
    }

    let state = web::Data::new(AppState::new(storage, config));
    let bind = (config.server.bind.clone(), config.server.port);
    let workers = config.server.workers;

    info!("Listening on http://{}:{}", bind.0, bind.1);

    actix_web::rt::System::new().block_on(async move {
        let mut server = HttpServer::new(move || {
            App::new()
                .wrap(Logger::default())
                .app_data(state.clone())
                .configure(configure)
        });
        if workers > 0 {
            server = server.workers(workers);
        }
        server.bind(bind)?.run().await
    })?;

    info!("Server stopped");
    Ok(())
}
