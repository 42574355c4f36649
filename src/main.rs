// Agency portal: marketing site, mail relay and role-gated client portal
use actix_cors::Cors;
use actix_web::{
    error::JsonPayloadError,
    middleware::Logger,
    web::{self, JsonConfig},
    App, HttpResponse, HttpServer,
};
use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

mod cli;
mod commands;
mod config;
mod errors;
mod gateway;
mod handlers;
mod logging;
mod middleware;
mod models;
mod relay;
mod routes;
mod session;
mod state;
mod time;
mod types;
mod validation;
mod views;

use cli::{Cli, Commands};
use gateway::{AuthGateway, HttpAuthGateway};
use relay::Relay;
use state::PortalState;

/// JSON error handler for better error messages
fn json_error_handler(err: JsonPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    let body = HttpResponse::BadRequest().json(types::ErrorResponse::with_message(
        "json_parse_error",
        format!("Invalid JSON: {}", err),
    ));
    actix_web::error::InternalError::from_response(err, body).into()
}

fn build_cors(rules: &[config::CorsRule]) -> Cors {
    let origin_rules = rules.to_vec();
    let mut cors = Cors::default()
        .allowed_origin_fn(move |origin, _req| {
            let origin_str = origin.to_str().unwrap_or("");
            config::is_origin_allowed(&origin_rules, origin_str)
        })
        .supports_credentials()
        .max_age(3600);

    cors = match config::allowed_methods(rules) {
        Some(methods) if !methods.is_empty() => cors.allowed_methods(methods.iter().map(String::as_str)),
        Some(_) => cors.allowed_methods(["GET", "POST"]),
        None => cors.allow_any_method(),
    };
    match config::allowed_headers(rules) {
        Some(headers) if !headers.is_empty() => cors.allowed_headers(headers.iter().map(String::as_str)),
        Some(_) => cors.allowed_headers(["content-type", "accept"]),
        None => cors.allow_any_header(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();

    logging::init_logging(cli.verbose).context("Failed to initialize logging")?;
    logging::print_build_info();

    let mut cfg = config::load_config_from_file(&cli.config);
    if let Some(host) = &cli.host {
        cfg.server.host = host.clone();
    }
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }

    if cli.is_server_mode() {
        return serve(cfg).await;
    }

    if let Some(Commands::Session { action }) = &cli.command {
        let name = commands::command_name(action);
        logging::log_command_start(name, "session against the auth service");
        let started = Instant::now();
        let result = commands::run_session(action, &cfg).await;
        logging::log_command_complete(name, result.is_ok(), started.elapsed());
        return result;
    }

    Ok(())
}

async fn serve(cfg: config::AppConfig) -> anyhow::Result<()> {
    let gateway: Arc<dyn AuthGateway> = Arc::new(
        HttpAuthGateway::new(&cfg.api.base_url, cfg.api.timeout)
            .context("Failed to set up the auth gateway")?,
    );
    let portal = web::Data::new(PortalState::new(gateway, cfg.session.clone()));
    let relay = web::Data::new(Relay::from_config(&cfg.relay).context("Failed to set up the mail relay")?);

    if !cfg.session.cookie_secure {
        tracing::warn!("COOKIE_SECURE=false: session cookies will be sent over plain HTTP");
    }

    let bind_address = format!("{}:{}", cfg.server.host, cfg.server.port);
    tracing::info!("Starting {}", cfg.server.name);
    logging::log_server_startup(&cfg.server.host, cfg.server.port, &cfg.api.base_url);

    let cors_rules = cfg.cors_rules.clone();
    let static_dir = PathBuf::from(&cfg.static_dir);
    let hsts = cfg.hsts_enabled;

    HttpServer::new(move || {
        App::new()
            .app_data(
                JsonConfig::default()
                    .limit(64 * 1024)
                    .error_handler(json_error_handler),
            )
            .app_data(portal.clone())
            .app_data(relay.clone())
            .wrap(middleware::SecurityHeaders::new(hsts))
            .wrap(build_cors(&cors_rules))
            .wrap(Logger::default())
            .service(routes::health::healthz)
            .service(routes::health::health)
            .configure(handlers::pages::configure)
            .configure(handlers::auth::configure)
            .configure(handlers::relay::configure)
            .configure(handlers::portal::configure)
            .configure(routes::static_files::configure(&static_dir))
            .default_service(web::route().to(routes::static_files::not_found))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("Server error")
}
