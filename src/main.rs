use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};

mod api;
mod auth;
mod client;
mod config;
mod dashboard;
mod docs;
mod error;
mod model;
mod routes;
mod state;
mod utils;

#[cfg(test)]
mod test_support;

use crate::auth::session::Session;
use crate::client::http::HttpBackend;
use crate::dashboard::Dashboard;
use crate::docs::ApiDoc;
use crate::state::holiday_store::HolidayStore;
use anyhow::Context;
use config::Config;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "HRM dashboard is running"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, &config.log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(backend = %config.backend_url, "Dashboard starting...");

    let session = Arc::new(Session::restore(&config.token_file));
    if !session.is_active() {
        warn!("No session token yet, install one with POST {}/session", config.api_prefix);
    }

    let backend = HttpBackend::new(&config.backend_url, session.clone(), config.request_timeout)
        .context("could not build the backend client")?;

    let dashboard = Data::new(Dashboard::new(
        session,
        Arc::new(backend),
        HolidayStore::new(&config.holiday_store_path),
        config.rollback_on_failure,
        config.employee_cache_ttl,
    ));

    // holidays are usable before the first overview; a dead backend only
    // switches the registry to its local store
    if dashboard.session.is_active() {
        let warmup = dashboard.clone();
        actix_web::rt::spawn(async move {
            if let Err(e) = warmup.holidays.refresh().await {
                warn!(error = %e, "Holiday warmup failed");
            }
        });
    }

    let server_addr = config.server_addr.clone();
    let api_prefix = config.api_prefix.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(dashboard.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &api_prefix))
    })
    .bind(&server_addr)
    .with_context(|| format!("could not bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
