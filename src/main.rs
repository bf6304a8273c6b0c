use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use std::time::Duration;

mod api;
mod auth;
mod clock;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

use crate::clock::SystemClock;
use crate::docs::ApiDoc;
use crate::service::attendance::AttendanceService;
use crate::service::leave::LeaveService;
use crate::store::attendance::MySqlAttendanceStore;
use crate::store::directory::{CachedDirectory, MySqlEmployeeDirectory};
use crate::store::leave_request::MySqlLeaveStore;
use config::Config;
use db::{init_db, run_migrations};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let level: tracing::Level = config.log_level.parse().unwrap_or(tracing::Level::DEBUG);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let pool = init_db(&config.database_url, config.db_max_connections).await?;
    if config.run_migrations {
        run_migrations(&pool).await?;
    } else {
        warn!("RUN_MIGRATIONS disabled, assuming schema is in place");
    }

    let directory = CachedDirectory::new(
        MySqlEmployeeDirectory::new(pool.clone()),
        config.directory_cache_capacity,
        Duration::from_secs(config.directory_cache_ttl_secs),
    );
    let attendances = Data::new(AttendanceService::new(
        MySqlAttendanceStore::new(pool.clone()),
        directory.clone(),
        SystemClock,
    ));
    let leaves = Data::new(LeaveService::new(
        MySqlLeaveStore::new(pool.clone()),
        directory,
        SystemClock,
    ));

    let limiter = routes::build_limiter(config.rate_protected_per_min)?;
    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config);

    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let config = config_data.clone();
        let limiter = limiter.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config.clone())
            .app_data(attendances.clone())
            .app_data(leaves.clone())
            .service(health)
            .configure(move |cfg| routes::configure(cfg, &config, limiter))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
