// Static assets and the not-found fallback
use actix_files::Files;
use actix_web::{http::header, web, HttpRequest, HttpResponse};
use std::path::Path;

use crate::types::ErrorResponse;
use crate::views;

/// Mount `/assets` from `<static_dir>/assets` when the directory exists.
pub fn configure(static_dir: &Path) -> impl FnOnce(&mut web::ServiceConfig) + '_ {
    move |cfg| {
        let assets = static_dir.join("assets");
        if assets.is_dir() {
            cfg.service(Files::new("/assets", assets).prefer_utf8(true));
        } else {
            tracing::warn!("Static assets directory {:?} not found; /assets disabled", assets);
        }
    }
}

/// JSON for API-ish clients, an HTML page for browsers.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
    let wants_json = req
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("application/json") && !v.contains("text/html"))
        .unwrap_or(false);

    if wants_json {
        HttpResponse::NotFound().json(ErrorResponse::new("not_found"))
    } else {
        HttpResponse::NotFound()
            .content_type("text/html; charset=utf-8")
            .body(views::not_found_page())
    }
}
